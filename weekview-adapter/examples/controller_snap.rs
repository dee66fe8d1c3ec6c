use weekview::{EmptySource, Size, WeekView, WeekViewOptions};
use weekview_adapter::{Controller, Easing};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: a controller animating the snap after the user lets go between two days.
    //
    // An adapter would:
    // - forward scroll offsets while the user drags
    // - start the snap on drag end / deceleration begin
    // - call tick(now_ms) in a frame loop and apply the returned offset to the scroll container
    let options = WeekViewOptions::today(Size::new(508.0, 500.0));
    let view = WeekView::new(options, EmptySource)?;
    let mut c = Controller::new(view).with_snap_animation(240, Easing::EaseInOutCubic);

    c.on_scroll(969.5);
    let target = c.on_drag_end(0);
    println!("target_offset={target:?} destination={:?}", c.snap_destination());

    let mut now_ms = 0u64;
    while let Some(off) = c.tick(now_ms) {
        if now_ms % 80 == 0 {
            println!("t={now_ms} off={off:.1} state={:?}", c.week_view().pager().state());
        }
        if !c.is_animating() {
            break;
        }
        now_ms += 16;
    }

    println!(
        "done: off={} leading={:?}",
        c.week_view().scroll_offset(),
        c.week_view().leading_date()
    );
    Ok(())
}
