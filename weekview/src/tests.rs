use crate::*;

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_i64(&mut self, start: i64, end_exclusive: i64) -> i64 {
        debug_assert!(start < end_exclusive);
        let span = (end_exclusive - start) as u64;
        start + (self.next_u64() % span) as i64
    }

    fn gen_f64(&mut self, end: f64) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64 * end
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range_i64(0, i as i64 + 1) as usize;
            items.swap(i, j);
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

// Monday.
fn day() -> NaiveDate {
    date(2024, 3, 4)
}

fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
    day.and_hms_opt(h, m, 0).expect("valid time")
}

fn ev(title: &str, (h1, m1): (u32, u32), (h2, m2): (u32, u32)) -> Event {
    Event::new(title, at(day(), h1, m1), at(day(), h2, m2)).expect("valid event")
}

// 9:00..17:00 over 480 points below a 20 point header: one point per minute.
fn scale() -> TimeScale {
    TimeScale::new(9, 17, 500.0, 20.0).expect("valid scale")
}

fn column() -> Rect {
    Rect::new(0.0, 0.0, 100.0, 500.0)
}

fn layout(events: &[Event]) -> EventLayout {
    place_events(events, day(), column(), &scale(), &LayoutOptions::default())
}

#[test]
fn event_rejects_end_before_start() {
    let err = Event::new("x", at(day(), 10, 0), at(day(), 9, 0)).unwrap_err();
    assert_eq!(
        err,
        EventError::EndBeforeStart {
            start: at(day(), 10, 0),
            end: at(day(), 9, 0),
        }
    );
}

#[test]
fn event_order_is_start_then_creation() {
    let a = ev("a", (10, 0), (11, 0));
    let b = ev("b", (9, 0), (12, 0));
    let c = ev("c", (10, 0), (10, 30));
    let mut sorted = vec![c.clone(), a.clone(), b.clone()];
    sorted.sort();
    assert_eq!(sorted, vec![b, a, c]);
}

#[test]
fn event_overlap_is_inclusive_and_not_transitive() {
    let a = ev("a", (9, 0), (10, 0));
    let b = ev("b", (10, 0), (11, 0));
    let c = ev("c", (11, 0), (12, 0));
    assert!(a.overlaps(&b));
    assert!(b.overlaps(&a));
    assert!(b.overlaps(&c));
    assert!(!a.overlaps(&c));
}

#[test]
fn event_equality_is_by_identity() {
    let a = ev("same", (9, 0), (10, 0));
    let b = ev("same", (9, 0), (10, 0));
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
    assert!(a.id() < b.id());
}

#[test]
fn event_ending_at_midnight_stays_on_its_day() {
    let monday = day();
    let tuesday = date(2024, 3, 5);
    let late = Event::new("late", at(monday, 23, 0), at(tuesday, 0, 0)).expect("valid event");
    assert!(late.touches_day(monday));
    assert!(!late.touches_day(tuesday));

    let marker = Event::new("marker", at(tuesday, 0, 0), at(tuesday, 0, 0)).expect("valid event");
    assert!(marker.touches_day(tuesday));
    assert!(!marker.touches_day(monday));

    let overnight =
        Event::new("overnight", at(monday, 23, 0), at(tuesday, 0, 30)).expect("valid event");
    assert!(overnight.touches_day(monday));
    assert!(overnight.touches_day(tuesday));
}

#[cfg(feature = "serde")]
#[test]
fn deserialized_events_get_fresh_ids_and_are_checked() {
    let event = ev("standup", (9, 0), (10, 0)).with_color(Color::RED);
    let json = serde_json::to_string(&event).expect("serialize");
    let copy: Event = serde_json::from_str(&json).expect("deserialize");
    assert_ne!(copy.id(), event.id());
    assert_eq!(copy.title(), "standup");
    assert_eq!((copy.start(), copy.end()), (event.start(), event.end()));
    assert_eq!(copy.color(), Some(Color::RED));

    let minimal = r#"{"title":"x","start":"2024-03-04T09:00:00","end":"2024-03-04T09:30:00"}"#;
    let minimal: Event = serde_json::from_str(minimal).expect("deserialize");
    assert_eq!(minimal.subtitle(), "");
    assert_eq!(minimal.color(), None);

    let backwards = r#"{"title":"x","start":"2024-03-04T10:00:00","end":"2024-03-04T09:00:00"}"#;
    assert!(serde_json::from_str::<Event>(backwards).is_err());
}

#[test]
fn time_scale_maps_both_ways() {
    let s = scale();
    assert_eq!(s.hour_height(), 60.0);
    assert_eq!(s.top(), 20.0);
    assert_eq!(s.bottom(), 500.0);

    let t = NaiveTime::from_hms_opt(10, 30, 0).expect("valid time");
    assert_eq!(s.y_for_time(t), 110.0);
    assert_eq!(s.time_at(110.0), Some(t));
    assert_eq!(
        s.time_at(499.9),
        NaiveTime::from_hms_opt(16, 59, 0)
    );
    assert_eq!(s.time_at(19.9), None);
    assert_eq!(s.time_at(500.0), None);
}

#[test]
fn time_scale_clamps_to_visible_hours() {
    let s = scale();
    assert_eq!(s.y_for(day(), at(day(), 7, 0)), 20.0);
    assert_eq!(s.y_for(day(), at(day(), 18, 0)), 500.0);
    assert_eq!(s.y_for(day(), at(day(), 12, 15)), 215.0);
    // Instants on other days clamp to the nearest edge of this day.
    assert_eq!(s.y_for(day(), at(date(2024, 3, 5), 10, 0)), 500.0);
}

#[test]
fn time_scale_rejects_bad_bounds() {
    assert_eq!(
        TimeScale::new(17, 9, 500.0, 20.0),
        Err(ConfigError::EmptyHourRange { start: 17, end: 9 })
    );
    assert_eq!(
        TimeScale::new(9, 25, 500.0, 20.0),
        Err(ConfigError::HourOutOfRange(25))
    );
    assert_eq!(
        TimeScale::new(9, 17, 500.0, 600.0),
        Err(ConfigError::HeaderTooTall {
            header: 600.0,
            column: 500.0,
        })
    );
    assert_eq!(
        TimeScale::new(9, 17, 500.0, -1.0),
        Err(ConfigError::InvalidHeaderHeight(-1.0))
    );
}

#[test]
fn now_line_only_within_visible_hours() {
    let s = scale();
    let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid time");
    assert_eq!(s.now_line_y(t(8, 59)), None);
    assert_eq!(s.now_line_y(t(9, 0)), Some(20.0));
    assert_eq!(s.now_line_y(t(12, 15)), Some(215.0));
    assert_eq!(s.now_line_y(t(17, 0)), Some(500.0));
    assert_eq!(s.now_line_y(t(17, 1)), None);
}

#[test]
fn hour_marks_cover_every_visible_hour() {
    let marks: Vec<_> = scale().hour_marks().collect();
    assert_eq!(marks.len(), 9);
    assert_eq!(marks[0].label, "9:00");
    assert_eq!(marks[0].y, 20.0);
    assert_eq!(marks[8].label, "17:00");
    assert_eq!(marks[8].y, 500.0);
}

#[test]
fn layout_of_nothing_is_empty() {
    let l = layout(&[]);
    assert!(l.is_empty());
    assert_eq!(l.cluster_count(), 0);
}

#[test]
fn layout_splits_close_starts_and_keeps_distant_events_full_width() {
    let first = ev("first", (9, 0), (10, 0));
    let second = ev("second", (9, 30), (10, 30));
    let third = ev("third", (14, 0), (15, 0));
    let l = layout(&[third.clone(), first.clone(), second.clone()]);

    assert_eq!(l.len(), 3);
    assert_eq!(l.cluster_count(), 2);
    assert_eq!(
        l.frame_of(first.id()),
        Some(Rect::new(0.5, 20.5, 49.0, 59.0))
    );
    assert_eq!(
        l.frame_of(second.id()),
        Some(Rect::new(50.5, 50.5, 49.0, 59.0))
    );
    let third_frame = l.frame_of(third.id()).expect("third placed");
    assert_eq!(third_frame, Rect::new(0.5, 320.5, 99.0, 59.0));
    for p in &l {
        if p.event != third {
            assert!(!p.frame.intersects(&third_frame));
        }
    }
}

#[test]
fn layout_cascades_a_later_cluster_inside_the_event_it_overlaps() {
    let long = ev("long", (9, 0), (12, 0));
    let inner = ev("inner", (10, 0), (11, 0));
    let l = layout(&[long.clone(), inner.clone()]);

    let outer = l.frame_of(long.id()).expect("long placed");
    let nested = l.frame_of(inner.id()).expect("inner placed");
    assert_eq!(outer, Rect::new(0.5, 20.5, 99.0, 179.0));
    assert_eq!(nested, Rect::new(6.0, 80.5, 93.0, 59.0));
    assert!(nested.min_x() > outer.min_x());
    assert!(nested.max_x() <= outer.max_x());

    // The nested event is drawn last, so it wins a tap where both overlap.
    let hit = l.hit_test(Point::new(50.0, 100.0)).expect("hit");
    assert_eq!(hit.event, inner);
    let hit = l.hit_test(Point::new(3.0, 100.0)).expect("hit");
    assert_eq!(hit.event, long);
    assert!(l.hit_test(Point::new(50.0, 400.0)).is_none());
}

#[test]
fn layout_handles_zero_duration_events() {
    let point = ev("point", (10, 0), (10, 0));
    let l = layout(std::slice::from_ref(&point));
    let frame = l.frame_of(point.id()).expect("placed");
    assert!(frame.height >= 0.0);
    assert_eq!(frame.height, 0.0);

    let opts = LayoutOptions::default().with_min_event_height(12.0);
    let l = place_events(std::slice::from_ref(&point), day(), column(), &scale(), &opts);
    assert_eq!(l.frame_of(point.id()).map(|f| f.height), Some(12.0));
}

#[test]
fn layout_cluster_threshold_is_configurable() {
    let a = ev("a", (9, 0), (10, 0));
    let b = ev("b", (9, 20), (10, 20));
    let opts = LayoutOptions::default().with_cluster_threshold(TimeDelta::minutes(10));
    let l = place_events(&[a.clone(), b.clone()], day(), column(), &scale(), &opts);
    assert_eq!(l.cluster_count(), 2);
    // b overlaps a, so it cascades instead of splitting.
    assert_eq!(l.frame_of(a.id()), Some(Rect::new(0.5, 20.5, 99.0, 59.0)));
    assert_eq!(l.frame_of(b.id()), Some(Rect::new(6.0, 40.5, 93.0, 59.0)));
}

fn random_events(rng: &mut Lcg, n: usize) -> Vec<Event> {
    (0..n)
        .map(|i| {
            let start = rng.gen_range_i64(7 * 60, 18 * 60);
            let len = rng.gen_range_i64(0, 180);
            let start = at(day(), 0, 0) + TimeDelta::minutes(start);
            Event::new(format!("e{i}"), start, start + TimeDelta::minutes(len))
                .expect("valid event")
        })
        .collect()
}

#[test]
fn layout_places_every_event_exactly_once() {
    let mut rng = Lcg::new(7);
    for round in 0..200 {
        let n = (round % 12) as usize;
        let events = random_events(&mut rng, n);
        let l = layout(&events);
        assert_eq!(l.len(), events.len());

        let placed: HashSet<EventId> = l.iter().map(|p| p.event.id()).collect();
        let input: HashSet<EventId> = events.iter().map(Event::id).collect();
        assert_eq!(placed, input);
        for p in &l {
            assert!(p.frame.width >= 0.0);
            assert!(p.frame.height >= 0.0);
        }
    }
}

#[test]
fn layout_is_independent_of_input_order() {
    let mut rng = Lcg::new(99);
    for _ in 0..100 {
        let events = random_events(&mut rng, 8);
        let expected = layout(&events);
        let mut shuffled = events.clone();
        rng.shuffle(&mut shuffled);
        let actual = layout(&shuffled);
        for p in &expected {
            assert_eq!(actual.frame_of(p.event.id()), Some(p.frame));
        }
    }
}

#[test]
fn non_overlapping_events_never_collide() {
    let mut rng = Lcg::new(2024);
    for _ in 0..200 {
        let mut events = Vec::new();
        let mut cursor = at(day(), 8, 0) + TimeDelta::minutes(rng.gen_range_i64(0, 60));
        while cursor < at(day(), 18, 0) {
            let len = TimeDelta::minutes(rng.gen_range_i64(0, 90));
            let event = Event::new("e", cursor, cursor + len).expect("valid event");
            cursor = event.end() + TimeDelta::minutes(rng.gen_range_i64(1, 45));
            events.push(event);
        }
        let l = layout(&events);
        let placed: Vec<_> = l.iter().collect();
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!a.event.overlaps(&b.event));
                assert!(
                    !a.frame.intersects(&b.frame),
                    "{:?} and {:?} collide",
                    a.frame,
                    b.frame
                );
            }
        }
    }
}

#[test]
fn layout_keeps_deep_cascades_and_crowded_clusters_visible() {
    let whole_day = TimeScale::new(0, 24, 500.0, 20.0).expect("valid scale");
    let options = LayoutOptions::default();
    // Every event overlaps the previous one but starts too late to share its cluster.
    let chain: Vec<Event> = (0..25i64)
        .map(|i| {
            let start = at(day(), 0, 0) + TimeDelta::minutes(40 * i);
            Event::new(format!("e{i}"), start, start + TimeDelta::minutes(45))
                .expect("valid event")
        })
        .collect();
    let l = place_events(&chain, day(), column(), &whole_day, &options);
    assert_eq!(l.cluster_count(), 25);
    for p in &l {
        assert!(p.frame.width >= options.min_event_width, "{:?}", p.frame);
        assert!(p.frame.min_x() >= column().min_x(), "{:?}", p.frame);
        assert!(p.frame.max_x() <= column().max_x(), "{:?}", p.frame);
    }
    let last = chain.last().expect("events");
    let frame = l.frame_of(last.id()).expect("placed");
    let hit = l
        .hit_test(Point::new(frame.x + 1.0, frame.y + 1.0))
        .expect("last event is reachable");
    assert_eq!(hit.event.id(), last.id());

    let crowd: Vec<Event> = (0..40).map(|_| ev("c", (10, 0), (11, 0))).collect();
    let l = layout(&crowd);
    assert_eq!(l.cluster_count(), 1);
    for p in &l {
        assert!(p.frame.width >= options.min_event_width, "{:?}", p.frame);
        assert!(p.frame.min_x() >= column().min_x(), "{:?}", p.frame);
        assert!(p.frame.max_x() <= column().max_x(), "{:?}", p.frame);
    }
}

fn echo(request: PageRequest, _: Completion<i64>) -> Result<Option<i64>, SourceError> {
    Ok(Some(request.position))
}

// 5 pages of 100 points with 2 point spacers fill 508 points exactly.
fn pager_options() -> PagerOptions {
    PagerOptions::new(Size::new(508.0, 300.0), 5)
}

fn pager() -> Pager<i64> {
    let mut source = echo;
    Pager::new(pager_options(), &mut source).expect("valid options")
}

#[derive(Default)]
struct Deferred {
    requested: Vec<Position>,
    pending: Vec<Completion<i64>>,
}

impl PageSource<i64> for Deferred {
    fn fill_page(
        &mut self,
        request: PageRequest,
        completion: Completion<i64>,
    ) -> Result<Option<i64>, SourceError> {
        self.requested.push(request.position);
        self.pending.push(completion);
        Ok(None)
    }
}

impl Deferred {
    fn completion_for(&self, position: Position) -> Completion<i64> {
        self.pending
            .iter()
            .rev()
            .find(|c| c.position() == position)
            .cloned()
            .expect("page was requested")
    }
}

fn window_contents(p: &Pager<i64>) -> Vec<(Position, Option<i64>)> {
    let mut out = Vec::new();
    p.for_each_placeholder(|ph| out.push((ph.position, ph.content().copied())));
    out
}

#[test]
fn pager_options_reject_invalid_configuration() {
    let mut source = echo;
    let zero = PagerOptions::new(Size::new(508.0, 300.0), 0);
    assert_eq!(
        Pager::new(zero, &mut source).unwrap_err(),
        ConfigError::ZeroPageCount
    );
    let negative = pager_options().with_spacer(-1.0);
    assert_eq!(
        Pager::new(negative, &mut source).unwrap_err(),
        ConfigError::InvalidSpacer(-1.0)
    );
    let cramped = PagerOptions::new(Size::new(5.0, 300.0), 5);
    assert!(matches!(
        Pager::new(cramped, &mut source).unwrap_err(),
        ConfigError::ViewportTooSmall { pages: 5, .. }
    ));
}

#[test]
fn pager_starts_on_the_middle_screen() {
    let p = pager();
    assert_eq!(p.views_in_page_count(), 5);
    assert_eq!(p.load_page_count(), 15);
    assert_eq!(p.view_range_start(), 0);
    assert_eq!(p.store().positions(), Some(0..=14));
    assert_eq!(p.geometry().stride(), 102.0);
    assert_eq!(p.content_size(), 1528.0);
    assert_eq!(p.max_scroll_offset(), 1020.0);
    assert_eq!(p.scroll_offset(), 510.0);
    assert_eq!(p.load_threshold(), 50.0);
    assert_eq!(p.leading_position(), 5);
}

#[test]
fn scrolling_to_the_trailing_edge_creates_the_next_screen() {
    let mut source = Deferred::default();
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    assert_eq!(source.requested, (0..=14).collect::<Vec<_>>());

    assert_eq!(p.on_scroll(969.0, &mut source), None);
    let shift = p.on_scroll(970.0, &mut source).expect("threshold crossed");
    assert_eq!(shift.direction, ScrollDirection::Forward);
    assert_eq!(shift.pages, 5);
    assert_eq!(shift.offset_delta, -510.0);
    assert_eq!(shift.created, Some(15..=19));
    assert_eq!(p.view_range_start(), 5);
    assert_eq!(p.window_positions(), 5..=19);
    assert_eq!(p.scroll_offset(), 460.0);
    assert_eq!(&source.requested[15..], &[15, 16, 17, 18, 19]);
}

#[test]
fn forward_shifts_advance_by_whole_screens() {
    let mut source = echo;
    let mut p = pager();
    let mut materialized = p.store().len();
    for n in 1..=6 {
        let shift = p.on_scroll(p.max_scroll_offset(), &mut source);
        assert!(shift.is_some());
        assert_eq!(p.view_range_start(), n * 5);
        assert!(p.store().len() >= materialized);
        materialized = p.store().len();
        assert_eq!(p.store().len(), 15 + n * 5);
    }
    assert_eq!(p.window_positions(), 30..=44);
}

#[test]
fn scrolling_back_reuses_pages_before_creating_new_ones() {
    let mut source = Deferred::default();
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    p.on_scroll(1020.0, &mut source).expect("forward");
    let requested = source.requested.len();

    assert_eq!(p.on_scroll(50.0, &mut source), None);
    let shift = p.on_scroll(49.0, &mut source).expect("backward");
    assert_eq!(shift.direction, ScrollDirection::Backward);
    assert_eq!(shift.created, None);
    assert_eq!(shift.offset_delta, 510.0);
    assert_eq!(p.view_range_start(), 0);
    assert_eq!(p.window_positions(), 0..=14);
    assert_eq!(p.scroll_offset(), 559.0);
    assert_eq!(source.requested.len(), requested);

    let shift = p.on_scroll(0.0, &mut source).expect("backward again");
    assert_eq!(shift.created, Some(-5..=-1));
    assert_eq!(p.view_range_start(), 0);
    assert_eq!(p.window_positions(), -5..=9);
    assert_eq!(p.store().positions(), Some(-5..=19));
    assert_eq!(p.scroll_offset(), 510.0);
}

#[test]
fn reporting_the_compensated_offset_back_does_not_shift_again() {
    let mut source = echo;
    // One page per screen without spacers: a forward shift lands exactly on the threshold.
    let options = PagerOptions::new(Size::new(100.0, 300.0), 1).with_spacer(0.0);
    let mut p = Pager::new(options, &mut source).expect("valid options");
    assert_eq!(p.load_threshold(), 50.0);
    let shift = p.on_scroll(150.0, &mut source).expect("forward");
    assert_eq!(shift.direction, ScrollDirection::Forward);
    assert_eq!(p.scroll_offset(), 50.0);
    assert_eq!(p.on_scroll(p.scroll_offset(), &mut source), None);
    assert_eq!(p.window_positions(), 1..=3);

    let mut p = pager();
    p.on_scroll(1020.0, &mut source).expect("forward");
    assert_eq!(p.on_scroll(p.scroll_offset(), &mut source), None);
    p.on_scroll(0.0, &mut source).expect("backward");
    assert_eq!(p.on_scroll(p.scroll_offset(), &mut source), None);
}

#[test]
fn random_scrolling_keeps_window_arithmetic_consistent() {
    let mut source = echo;
    let mut p = pager();
    let mut rng = Lcg::new(11);
    let mut materialized = p.store().len();
    for _ in 0..2_000 {
        let offset = rng.gen_f64(p.max_scroll_offset() + 200.0) - 100.0;
        p.on_scroll(offset, &mut source);

        assert_eq!(p.view_range_start() % p.views_in_page_count(), 0);
        assert!(p.store().len() >= materialized);
        materialized = p.store().len();
        assert!(p.store().len() >= p.view_range_start() + p.load_page_count());
        assert!(p.scroll_offset() >= 0.0 && p.scroll_offset() <= p.max_scroll_offset());

        let contents = window_contents(&p);
        assert_eq!(contents.len(), 15);
        let first = p.window_start();
        for (slot, (position, content)) in contents.into_iter().enumerate() {
            assert_eq!(position, first + slot as i64);
            assert_eq!(content, Some(position));
        }
    }
}

#[test]
fn placeholders_are_laid_out_by_slot() {
    let p = pager();
    let mut out = Vec::new();
    p.collect_placeholders(&mut out);
    assert_eq!(out.len(), 15);
    assert_eq!(out[3].frame, Rect::new(306.0, 0.0, 100.0, 300.0));

    assert_eq!(p.placeholder_at_offset(99.0).map(|ph| ph.slot), Some(0));
    assert!(p.placeholder_at_offset(101.0).is_none());
    assert_eq!(p.placeholder_at_offset(102.0).map(|ph| ph.slot), Some(1));
    assert!(p.placeholder_at_offset(-1.0).is_none());
    assert!(p.placeholder_at_offset(2_000.0).is_none());
}

#[test]
fn vertical_pager_lays_pages_top_to_bottom() {
    let mut source = echo;
    let options = PagerOptions::new(Size::new(300.0, 508.0), 5).with_axis(Axis::Vertical);
    let p = Pager::new(options, &mut source).expect("valid options");
    let frame = p.placeholder_at_slot(1).map(|ph| ph.frame);
    assert_eq!(frame, Some(Rect::new(0.0, 102.0, 300.0, 100.0)));
    assert_eq!(p.content_size(), 1528.0);
}

#[test]
fn snap_lands_exactly_on_the_nearest_edge() {
    let mut source = echo;
    let mut p = pager();

    assert_eq!(p.on_scroll(560.0, &mut source), None);
    let outcome = p.snap(&mut source).expect("snapped");
    assert_eq!(outcome.position, 5);
    assert_eq!(outcome.offset, 510.0);
    assert_eq!(outcome.shift, None);
    assert_eq!(p.scroll_offset(), 510.0);

    // Equidistant from 510 and 612: the earlier page wins.
    p.on_scroll(561.0, &mut source);
    let target = p.snap_target().expect("target");
    assert_eq!((target.slot, target.offset), (5, 510.0));
}

#[test]
fn snap_into_the_threshold_shifts_and_stays_exact() {
    let mut source = echo;
    let mut p = pager();
    assert_eq!(p.on_scroll(969.5, &mut source), None);

    let outcome = p.snap(&mut source).expect("snapped");
    assert_eq!(outcome.position, 10);
    assert!(outcome.shift.is_some());
    assert_eq!(outcome.offset, 510.0);
    assert_eq!(p.scroll_offset(), 510.0);
    assert_eq!(p.slot_of(10), Some(5));
    assert_eq!(p.anchor_offset(10), Some(p.scroll_offset()));
}

#[test]
fn snap_to_outside_the_window_does_nothing() {
    let mut source = echo;
    let mut p = pager();
    assert_eq!(p.snap_to(99, &mut source), None);
    assert_eq!(p.scroll_offset(), 510.0);
}

#[test]
fn late_completion_for_an_evicted_page_leaves_placeholders_alone() {
    let mut source = Deferred::default();
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    p.on_scroll(1020.0, &mut source);
    p.on_scroll(1020.0, &mut source);
    assert!(!p.is_visible(0));

    let before = window_contents(&p);
    assert!(source.completion_for(0).complete(42));
    let summary = p.apply_completions();
    assert_eq!(
        summary,
        DrainSummary {
            applied: 1,
            visible: 0,
            stale: 0,
        }
    );
    assert_eq!(window_contents(&p), before);
    // The canonical record still picks it up for when the page comes back.
    assert_eq!(p.record_at(0).and_then(|r| r.content()), Some(&42));
}

#[test]
fn completions_replace_earlier_content() {
    let mut pending: Vec<Completion<i64>> = Vec::new();
    let mut source = |request: PageRequest, completion: Completion<i64>| {
        pending.push(completion);
        Ok::<_, SourceError>(Some(request.position * 100))
    };
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    let record = p.record_at(7).expect("record");
    assert_eq!(record.content(), Some(&700));
    assert_eq!(record.revision(), 1);

    let completion = pending
        .iter()
        .find(|c| c.position() == 7)
        .cloned()
        .expect("completion");
    completion.complete(1);
    completion.complete(2);
    let mut outcomes = Vec::new();
    let summary = p.apply_completions_with(|o| outcomes.push(o));
    assert_eq!(summary.applied, 2);
    assert_eq!(
        outcomes,
        vec![
            DeliveryOutcome::Applied {
                position: 7,
                visible: true,
            };
            2
        ]
    );
    let record = p.record_at(7).expect("record");
    assert_eq!(record.content(), Some(&2));
    assert_eq!(record.revision(), 3);
}

#[test]
fn completions_may_fire_from_other_threads() {
    let mut source = Deferred::default();
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    let completion = source.completion_for(3);
    let handle = std::thread::spawn(move || completion.complete(9));
    assert!(handle.join().expect("thread"));
    assert_eq!(p.apply_completions().visible, 1);
    assert_eq!(p.record_at(3).and_then(|r| r.content()), Some(&9));
}

#[test]
fn completions_from_before_a_reset_are_stale() {
    let mut source = Deferred::default();
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    let old = source.completion_for(3);
    p.reset(&mut source);
    assert_eq!(p.state().store.materialized, 15);

    old.complete(5);
    let summary = p.apply_completions();
    assert_eq!(summary.stale, 1);
    assert_eq!(summary.applied, 0);
    assert!(!p.record_at(3).expect("record").is_done());

    source.completion_for(3).complete(6);
    assert_eq!(p.apply_completions().applied, 1);
    assert_eq!(p.record_at(3).and_then(|r| r.content()), Some(&6));
}

#[test]
fn new_options_reseed_the_window_and_drop_old_completions() {
    let mut source = Deferred::default();
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    p.on_scroll(1020.0, &mut source).expect("forward");
    let old = source.completion_for(3);

    // Three 100 point pages with 2 point spacers.
    let narrower = PagerOptions::new(Size::new(304.0, 300.0), 3);
    p.set_options(narrower, &mut source).expect("valid options");
    assert_eq!(p.load_page_count(), 9);
    assert_eq!(p.store().positions(), Some(0..=8));
    assert_eq!(p.view_range_start(), 0);
    assert_eq!(p.scroll_offset(), 306.0);
    assert_eq!(p.content_size(), 916.0);

    old.complete(1);
    let summary = p.apply_completions();
    assert_eq!((summary.stale, summary.applied), (1, 0));
    assert!(!p.record_at(3).expect("record").is_done());

    let zero = PagerOptions::new(Size::new(304.0, 300.0), 0);
    assert_eq!(
        p.set_options(zero, &mut source).unwrap_err(),
        ConfigError::ZeroPageCount
    );
    assert_eq!(p.load_page_count(), 9);
}

#[test]
fn failing_source_renders_empty_pages_and_keeps_paging() {
    let mut source = |request: PageRequest, _: Completion<i64>| {
        if request.position % 2 == 0 {
            Err(SourceError::Unavailable("offline".into()))
        } else {
            Ok(Some(request.position))
        }
    };
    let mut p = Pager::new(pager_options(), &mut source).expect("valid options");
    let record = p.record_at(4).expect("record");
    assert!(record.is_done());
    assert_eq!(record.content(), Some(&0));
    assert!(p.on_scroll(1020.0, &mut source).is_some());
    assert_eq!(p.store().len(), 20);
}

#[test]
fn store_fills_gaps_and_never_refetches() {
    let inbox = ContentInbox::new();
    let mut requested = Vec::new();
    let mut source = |request: PageRequest, _: Completion<i64>| {
        requested.push(request.position);
        Ok::<_, SourceError>(Some(request.position))
    };
    let geometry = pager_options().validate().expect("valid options");
    let mut store = PageStore::new(geometry);
    assert_eq!(store.create_pages(0, 2, &mut source, &inbox), Some(0..=2));
    assert_eq!(store.create_pages(1, 2, &mut source, &inbox), None);
    assert_eq!(store.create_pages(6, 7, &mut source, &inbox), Some(3..=7));
    assert_eq!(store.create_pages(-2, -2, &mut source, &inbox), Some(-2..=-1));
    assert_eq!(store.create_pages(3, 1, &mut source, &inbox), None);
    assert_eq!(requested, vec![0, 1, 2, 3, 4, 5, 6, 7, -1, -2]);

    let positions: Vec<_> = store.iter().map(PageRecord::position).collect();
    assert_eq!(positions, (-2..=7).collect::<Vec<_>>());
    assert_eq!(store.record_at(-2).map(PageRecord::bounds), Some(geometry.bounds_at(-2)));
    assert!(!store.deliver(8, 0));
}

#[test]
fn pager_state_snapshot() {
    let mut source = echo;
    let mut p = pager();
    p.on_scroll(0.0, &mut source);
    assert_eq!(
        p.state(),
        PagerState {
            window: WindowState {
                view_range_start: 0,
                views_in_page_count: 5,
                load_page_count: 15,
            },
            store: StoreState {
                first_position: -5,
                last_position: 14,
                materialized: 20,
            },
            scroll_offset: 510.0,
        }
    );
}

// Wednesday. With five visible days the window starts on Friday 2024-03-01.
fn week_options() -> WeekViewOptions {
    WeekViewOptions::new(Size::new(508.0, 500.0), date(2024, 3, 6))
}

struct Fixed(Vec<Event>);

impl DataSource for Fixed {
    fn generate_events(
        &self,
        date: NaiveDate,
        _: Completion<Vec<Event>>,
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

#[derive(Default)]
struct Deferring {
    pending: Mutex<Vec<(NaiveDate, Completion<Vec<Event>>)>>,
}

impl DataSource for Deferring {
    fn generate_events(
        &self,
        date: NaiveDate,
        completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError> {
        self.pending
            .lock()
            .expect("lock")
            .push((date, completion));
        Ok(Some(Vec::new()))
    }
}

#[derive(Default)]
struct Taps {
    events: Vec<(EventId, Rect)>,
    free: Vec<NaiveDateTime>,
}

impl Delegate for Taps {
    fn event_tapped(&mut self, event: &Event, frame: Rect) {
        self.events.push((event.id(), frame));
    }

    fn free_time_tapped(&mut self, at: NaiveDateTime) {
        self.free.push(at);
    }
}

fn standup() -> Event {
    let wednesday = date(2024, 3, 6);
    Event::new("standup", at(wednesday, 9, 0), at(wednesday, 10, 0)).expect("valid event")
}

#[test]
fn week_view_maps_pages_to_days() {
    let view = WeekView::new(week_options(), EmptySource).expect("valid options");
    assert_eq!(view.date_for(0), Some(date(2024, 3, 1)));
    assert_eq!(view.date_for(5), Some(date(2024, 3, 6)));
    assert_eq!(view.date_for(-1), Some(date(2024, 2, 29)));
    assert_eq!(view.position_for(date(2024, 3, 6)), 5);
    assert_eq!(view.leading_date(), Some(date(2024, 3, 6)));
    assert_eq!(view.title().as_deref(), Some("March 2024"));
    assert_eq!(view.scale().hour_height(), 60.0);
}

#[test]
fn week_view_rejects_invalid_configuration() {
    let bad_hours = week_options().with_hours(10, 10);
    assert_eq!(
        WeekView::new(bad_hours, EmptySource).unwrap_err(),
        ConfigError::EmptyHourRange { start: 10, end: 10 }
    );
    let bad_interval = week_options().with_now_line_interval(std::time::Duration::ZERO);
    assert_eq!(
        WeekView::new(bad_interval, EmptySource).unwrap_err(),
        ConfigError::ZeroNowLineInterval
    );
    let bad_threshold = week_options()
        .with_layout(LayoutOptions::default().with_cluster_threshold(TimeDelta::minutes(-1)));
    assert_eq!(
        WeekView::new(bad_threshold, EmptySource).unwrap_err(),
        ConfigError::NegativeClusterThreshold
    );
    let mut flat = week_options();
    flat.viewport = Size::new(508.0, 10.0);
    assert_eq!(
        WeekView::new(flat, EmptySource).unwrap_err(),
        ConfigError::HeaderTooTall {
            header: 20.0,
            column: 10.0,
        }
    );
    let zero_days = week_options().with_visible_days(0);
    assert_eq!(
        WeekView::new(zero_days, EmptySource).unwrap_err(),
        ConfigError::ZeroPageCount
    );
}

#[test]
fn week_view_renders_backgrounds_headers_and_events() {
    let event = standup();
    let view = WeekView::new(week_options(), Fixed(vec![event.clone()])).expect("valid options");
    let mut nodes = Vec::new();
    view.render(&mut nodes);
    assert_eq!(nodes.len(), 15 * 2 + 1);

    let event_node = nodes
        .iter()
        .find(|n| matches!(n.kind, NodeKind::Event { .. }))
        .expect("event node");
    assert_eq!(
        event_node.kind,
        NodeKind::Event {
            position: 5,
            id: event.id(),
        }
    );
    assert_eq!(event_node.frame, Rect::new(510.5, 20.5, 99.0, 59.0));
    assert_eq!(event_node.style.text.as_deref(), Some("standup"));

    let saturday = nodes
        .iter()
        .find(|n| matches!(n.kind, NodeKind::DayBackground { position: 1, .. }))
        .expect("saturday");
    assert_eq!(saturday.style.fill, Some(Theme::Light.weekend_color()));
    let header = nodes
        .iter()
        .find(|n| matches!(n.kind, NodeKind::Header { position: 5, .. }))
        .expect("header");
    assert_eq!(header.style.text.as_deref(), Some("Wed 6"));
    assert_eq!(header.frame, Rect::new(510.0, 0.0, 100.0, 20.0));
}

#[test]
fn week_view_displays_late_content_without_mixing_results() {
    let mut view = WeekView::new(week_options(), Deferring::default()).expect("valid options");
    assert_eq!(view.layout_for(5).map(EventLayout::len), Some(0));

    let wednesday = date(2024, 3, 6);
    let completion = view
        .source()
        .pending
        .lock()
        .expect("lock")
        .iter()
        .find(|(d, _)| *d == wednesday)
        .map(|(_, c)| c.clone())
        .expect("requested");
    let events = vec![
        Event::new("a", at(wednesday, 9, 0), at(wednesday, 10, 0)).expect("valid event"),
        Event::new("b", at(wednesday, 13, 0), at(wednesday, 14, 0)).expect("valid event"),
    ];
    completion.complete(events.clone());

    let summary = view.apply_completions();
    assert_eq!(summary.visible, 1);
    let layout = view.layout_for(5).expect("laid out");
    assert_eq!(layout.len(), 2);

    let mut shown = Vec::new();
    view.for_each_render_node(|node| {
        if let NodeKind::Event { position: 5, id } = node.kind {
            shown.push(id);
        }
    });
    let expected: Vec<_> = events.iter().map(Event::id).collect();
    assert_eq!(shown, expected);
}

#[test]
fn week_view_resolves_taps() {
    let event = standup();
    let mut view = WeekView::with_parts(
        week_options(),
        Fixed(vec![event.clone()]),
        DefaultStyler,
        Taps::default(),
    )
    .expect("valid options");

    let tap = view.tap(Point::new(25.0, 50.0));
    let frame = Rect::new(0.5, 20.5, 99.0, 59.0);
    assert_eq!(
        tap,
        Some(Tap::Event {
            position: 5,
            id: event.id(),
            frame,
        })
    );
    assert_eq!(view.delegate().events, vec![(event.id(), frame)]);

    let tap = view.tap(Point::new(25.0, 110.0));
    let expected = at(date(2024, 3, 6), 10, 30);
    assert_eq!(
        tap,
        Some(Tap::FreeTime {
            position: 5,
            at: expected,
        })
    );
    assert_eq!(view.delegate().free, vec![expected]);

    // Header, spacer and below the last hour.
    assert_eq!(view.tap(Point::new(25.0, 10.0)), None);
    assert_eq!(view.tap(Point::new(101.0, 200.0)), None);
    assert_eq!(view.tap(Point::new(25.0, 500.0)), None);
}

#[test]
fn week_view_now_line_follows_the_clock() {
    let mut view = WeekView::new(week_options(), EmptySource).expect("valid options");
    let clock = FixedClock(at(date(2024, 3, 6), 12, 15));
    let line = view.now_line_at(&clock).expect("visible");
    assert_eq!(line.y, 215.0);
    assert_eq!(line.span, Rect::new(0.0, 215.0, 1528.0, 0.0));
    assert_eq!(line.today, Some((5, Rect::new(510.0, 0.0, 100.0, 500.0))));
    assert_eq!(line.color, Color::RED);

    assert!(view.now_line(at(date(2024, 3, 6), 20, 0)).is_none());
    let far = view.now_line(at(date(2025, 1, 1), 10, 0)).expect("visible");
    assert_eq!(far.today, None);

    view.set_now_line_enabled(false);
    assert!(view.now_line_at(&clock).is_none());
}

#[test]
fn week_view_drops_layouts_that_leave_the_window() {
    let mut view = WeekView::new(week_options(), EmptySource).expect("valid options");
    assert!(view.layout_for(0).is_some());
    assert!(view.on_scroll(1020.0).is_some());
    assert!(view.layout_for(0).is_none());
    assert!(view.layout_for(19).is_some());
    assert_eq!(view.leading_date(), Some(date(2024, 3, 11)));
}

#[test]
fn event_ending_at_midnight_is_not_drawn_on_the_next_day() {
    let wednesday = date(2024, 3, 6);
    let thursday = date(2024, 3, 7);
    let late = Event::new("late", at(wednesday, 16, 0), at(thursday, 0, 0)).expect("valid event");
    let view = WeekView::new(week_options(), Fixed(vec![late])).expect("valid options");
    assert_eq!(view.layout_for(5).map(EventLayout::len), Some(1));
    assert_eq!(view.layout_for(6).map(EventLayout::len), Some(0));

    let mut positions = Vec::new();
    view.for_each_render_node(|node| {
        if let NodeKind::Event { position, .. } = node.kind {
            positions.push(position);
        }
    });
    assert_eq!(positions, vec![5]);
}

#[test]
fn week_view_snaps_only_when_enabled() {
    let mut view = WeekView::new(week_options(), EmptySource).expect("valid options");
    view.on_scroll(560.0);
    let outcome = view.on_drag_end().expect("snapped");
    assert_eq!(outcome.offset, 510.0);

    let mut view = WeekView::new(week_options().with_snap_enabled(false), EmptySource)
        .expect("valid options");
    view.on_scroll(560.0);
    assert_eq!(view.on_deceleration_begin(), None);
    assert_eq!(view.scroll_offset(), 560.0);
    assert!(view.snap_now().is_some());
    assert_eq!(view.scroll_offset(), 510.0);
}

#[test]
fn week_view_jumps_to_a_date_and_swaps_sources() {
    let mut view = WeekView::new(week_options(), Deferring::default()).expect("valid options");
    let stale = view.source().pending.lock().expect("lock")[0].1.clone();

    view.jump_to_date(date(2024, 6, 10));
    assert_eq!(view.leading_date(), Some(date(2024, 6, 10)));
    assert_eq!(view.title().as_deref(), Some("June 2024"));
    assert_eq!(view.pager().state().scroll_offset, 510.0);

    stale.complete(vec![standup()]);
    assert_eq!(view.apply_completions().stale, 1);

    let previous = view.set_source(Deferring::default());
    assert_eq!(previous.pending.lock().expect("lock").len(), 30);
    assert_eq!(view.source().pending.lock().expect("lock").len(), 15);
}

#[test]
fn failing_data_source_shows_empty_days() {
    struct Offline;
    impl DataSource for Offline {
        fn generate_events(
            &self,
            _: NaiveDate,
            _: Completion<Vec<Event>>,
        ) -> Result<Option<Vec<Event>>, SourceError> {
            Err(SourceError::Unavailable("calendar store locked".into()))
        }
    }

    let mut view = WeekView::new(week_options(), Offline).expect("valid options");
    assert_eq!(view.layout_for(5).map(EventLayout::len), Some(0));
    assert!(view.on_scroll(1020.0).is_some());
    assert_eq!(view.pager().store().len(), 20);
}

#[test]
fn dark_theme_changes_the_palette() {
    let mut view = WeekView::new(week_options(), EmptySource).expect("valid options");
    view.set_theme(Theme::Dark);
    let mut nodes = Vec::new();
    view.render(&mut nodes);
    let monday = nodes
        .iter()
        .find(|n| matches!(n.kind, NodeKind::DayBackground { position: 3, .. }))
        .expect("monday");
    assert_eq!(monday.style.fill, Some(Theme::Dark.base_color()));
    assert!(is_weekend(date(2024, 3, 2)));
    assert!(!is_weekend(date(2024, 3, 4)));
}
