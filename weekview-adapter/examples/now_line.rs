use std::time::Duration;

use weekview::{EmptySource, Size, SystemClock, WeekView, WeekViewOptions};
use weekview_adapter::NowLineUpdater;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: redraw the now-line only when the ticker publishes a new time.
    let options = WeekViewOptions::today(Size::new(508.0, 500.0))
        .with_hours(0, 24)
        .with_now_line_interval(Duration::from_millis(200));
    let view = WeekView::new(options, EmptySource)?;
    let mut updater = NowLineUpdater::for_view(SystemClock, &view);

    println!("initial={:?}", updater.current(&view));
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(250)).await;
        if let Some(line) = updater.poll(&view) {
            println!("redraw at y={:.2} today={:?}", line.y, line.today);
        }
    }

    updater.set_enabled(false);
    println!("stopped: enabled={}", updater.is_enabled());
    Ok(())
}
