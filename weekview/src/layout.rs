//! Overlap-aware placement of a day's events inside a column.
//!
//! Events are grouped into *clusters* by start-time proximity rather than by exact interval
//! graph coloring: every event starting within `cluster_threshold` of the earliest unplaced
//! event joins its cluster. Two events that overlap but start further apart than the
//! threshold end up in different clusters; the later cluster is then cascaded (indented)
//! inside the earliest placed event it overlaps. Two events that start close together but do
//! not overlap still share a split column.

use chrono::{NaiveDate, TimeDelta};

use crate::{Event, EventId, Point, Rect, TimeScale};

/// Tuning knobs for [`place_events`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutOptions {
    /// Maximum start-time distance from a cluster's first event.
    pub cluster_threshold: TimeDelta,
    /// Horizontal indent applied when a cluster cascades inside an earlier event.
    pub overlap_indent: f64,
    /// Uniform inset applied to every rectangle so neighbours stay visually apart.
    pub rect_inset: f64,
    /// Lower bound for rectangle heights (after the inset).
    pub min_event_height: f64,
    /// Lower bound for rectangle widths (after the inset). Deep cascades and crowded clusters
    /// are clamped to it and pulled back inside the column.
    pub min_event_width: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            cluster_threshold: TimeDelta::minutes(30),
            overlap_indent: 5.0,
            rect_inset: 0.5,
            min_event_height: 0.0,
            min_event_width: 4.0,
        }
    }
}

impl LayoutOptions {
    pub fn with_cluster_threshold(mut self, threshold: TimeDelta) -> Self {
        self.cluster_threshold = threshold;
        self
    }

    pub fn with_overlap_indent(mut self, indent: f64) -> Self {
        self.overlap_indent = indent;
        self
    }

    pub fn with_rect_inset(mut self, inset: f64) -> Self {
        self.rect_inset = inset;
        self
    }

    pub fn with_min_event_height(mut self, height: f64) -> Self {
        self.min_event_height = height;
        self
    }

    pub fn with_min_event_width(mut self, width: f64) -> Self {
        self.min_event_width = width;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedEvent {
    pub event: Event,
    pub frame: Rect,
    /// Zero-based index of the cluster the event was placed with.
    pub cluster: usize,
}

/// The result of [`place_events`]: exactly one frame per input event, in placement order
/// (ascending start, ties by id).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventLayout {
    placed: Vec<PlacedEvent>,
}

impl EventLayout {
    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedEvent> {
        self.placed.iter()
    }

    pub fn frame_of(&self, id: EventId) -> Option<Rect> {
        self.placed
            .iter()
            .find(|p| p.event.id() == id)
            .map(|p| p.frame)
    }

    /// The topmost event under `point`. Later placements are drawn over earlier ones.
    pub fn hit_test(&self, point: Point) -> Option<&PlacedEvent> {
        self.placed.iter().rev().find(|p| p.frame.contains(point))
    }

    pub fn cluster_count(&self) -> usize {
        self.placed.last().map_or(0, |p| p.cluster + 1)
    }
}

impl<'a> IntoIterator for &'a EventLayout {
    type Item = &'a PlacedEvent;
    type IntoIter = core::slice::Iter<'a, PlacedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.placed.iter()
    }
}

/// Computes a frame for every event of `day` inside `column`.
///
/// `scale` supplies the header height and the hour-to-offset mapping; vertical positions are
/// clamped to the visible hours. Deterministic for a given input set regardless of input
/// order. Zero-duration events get zero-height frames unless `min_event_height` says
/// otherwise.
pub fn place_events(
    events: &[Event],
    day: NaiveDate,
    column: Rect,
    scale: &TimeScale,
    options: &LayoutOptions,
) -> EventLayout {
    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort();

    let body = Rect::new(
        column.x,
        column.y + scale.top(),
        column.width,
        (column.height - scale.top()).max(0.0),
    );

    // Narrowest rectangle before the inset; never wider than the column itself.
    let min_raw = (options.min_event_width.max(0.0) + 2.0 * options.rect_inset.max(0.0))
        .min(body.width);

    let mut placed: Vec<PlacedEvent> = Vec::with_capacity(sorted.len());
    let mut rest = sorted.as_slice();
    let mut cluster = 0usize;

    while let Some(lead) = rest.first() {
        let limit = lead.start() + options.cluster_threshold;
        let len = rest.iter().take_while(|e| e.start() <= limit).count();
        let (members, tail) = rest.split_at(len);

        let group = placed
            .iter()
            .find(|p| lead.overlaps(&p.event))
            .map_or(body, |p| {
                let indent = options.overlap_indent.min(p.frame.width);
                let width = (p.frame.width - indent).max(min_raw);
                let x = (p.frame.x + indent)
                    .min(column.max_x() - width)
                    .max(column.x);
                Rect::new(x, p.frame.y, width, (column.max_y() - p.frame.y).max(0.0))
            });

        let slice = (group.width / len as f64).max(min_raw);
        for (i, event) in members.iter().enumerate() {
            let top = column.y + scale.y_for(day, event.start());
            let bottom = column.y + scale.y_for(day, event.end());
            let x = (group.x + slice * i as f64)
                .min(column.max_x() - slice)
                .max(column.x);
            let raw = Rect::new(x, top, slice, bottom - top);
            let mut frame = raw.inset(options.rect_inset);
            frame.height = frame.height.max(options.min_event_height);
            placed.push(PlacedEvent {
                event: (*event).clone(),
                frame,
                cluster,
            });
        }

        rest = tail;
        cluster += 1;
    }

    EventLayout { placed }
}
