// Example: a week view over a fixed agenda, scrolled forward by one screen.
use chrono::{NaiveDate, NaiveDateTime};
use weekview::{
    Completion, DataSource, Event, NodeKind, Point, Size, SourceError, WeekView, WeekViewOptions,
};

struct Agenda(Vec<Event>);

impl DataSource for Agenda {
    fn generate_events(
        &self,
        date: NaiveDate,
        _completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError> {
        Ok(Some(
            self.0
                .iter()
                .filter(|e| e.touches_day(date))
                .cloned()
                .collect(),
        ))
    }
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").expect("valid timestamp")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let agenda = Agenda(vec![
        Event::new("Standup", at("2024-03-06 09:00"), at("2024-03-06 10:00"))?,
        Event::new("Review", at("2024-03-06 09:30"), at("2024-03-06 10:30"))?,
        Event::new("Lunch", at("2024-03-06 12:00"), at("2024-03-06 13:00"))?,
    ]);
    let start = NaiveDate::from_ymd_opt(2024, 3, 6).ok_or("bad date")?;
    let options = WeekViewOptions::new(Size::new(508.0, 500.0), start);
    let mut view = WeekView::new(options, agenda)?;

    println!("title={:?} offset={}", view.title(), view.scroll_offset());
    view.for_each_render_node(|node| {
        if let NodeKind::Event { position, id } = node.kind {
            println!("  page {position} {id} {:?} at {:?}", node.style.text, node.frame);
        }
    });

    println!("tap={:?}", view.tap(Point::new(30.0, 150.0)));

    // Drag to the trailing edge, then let go.
    if let Some(shift) = view.on_scroll(view.content_size()) {
        println!("shift={shift:?}");
    }
    let snap = view.on_drag_end();
    println!("snap={snap:?} title={:?}", view.title());
    Ok(())
}
