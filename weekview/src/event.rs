use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::{Color, EventError};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity assigned to an [`Event`] when it is created.
///
/// Ids are allocated from a process-wide counter, so a later event always has a larger id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventId(u64);

impl EventId {
    fn next() -> Self {
        Self(NEXT_EVENT_ID.fetch_add(1, AtomicOrdering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ev-{}", self.0)
    }
}

/// An immutable, time-ranged calendar entry.
///
/// Equality and hashing use the id only. Ordering is by `start`, then by id (creation order),
/// which makes it total and stable across repeated sorts.
///
/// With the `serde` feature, a deserialized event gets a fresh id; any serialized `id` is
/// ignored, and an end before the start is rejected.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "EventRecord"))]
pub struct Event {
    id: EventId,
    title: String,
    subtitle: String,
    color: Option<Color>,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Event {
    pub fn new(
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, EventError> {
        if end < start {
            return Err(EventError::EndBeforeStart { start, end });
        }
        Ok(Self {
            id: EventId::next(),
            title: title.into(),
            subtitle: String::new(),
            color: None,
            start,
            end,
        })
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    /// Calendar color, if the source assigned one.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> chrono::TimeDelta {
        self.end - self.start
    }

    /// Inclusive interval intersection: events that merely touch at a boundary overlap.
    ///
    /// The relation is symmetric but not transitive.
    pub fn overlaps(&self, other: &Event) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Whether any part of the event falls on `date`.
    ///
    /// An event ending exactly at midnight does not reach into the next day.
    pub fn touches_day(&self, date: NaiveDate) -> bool {
        self.start.date() <= date && date <= self.last_day()
    }

    fn last_day(&self) -> NaiveDate {
        let end = self.end.date();
        if self.end > self.start && self.end.time() == NaiveTime::MIN {
            end.pred_opt().unwrap_or(end)
        } else {
            end
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct EventRecord {
    title: String,
    #[serde(default)]
    subtitle: String,
    #[serde(default)]
    color: Option<Color>,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

#[cfg(feature = "serde")]
impl TryFrom<EventRecord> for Event {
    type Error = EventError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let mut event = Event::new(record.title, record.start, record.end)?
            .with_subtitle(record.subtitle);
        event.color = record.color;
        Ok(event)
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.id.cmp(&other.id))
    }
}
