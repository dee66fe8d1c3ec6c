//! Seams to the host: where events come from, how nodes look, and who hears about taps.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Weekday};

use crate::bridge::Completion;
use crate::{Color, Event, EventId, Position, Rect, SourceError, Theme};

/// Supplies the events of one day.
///
/// Called once per page materialization, possibly for several days in a row. Return
/// `Ok(Some(events))` to render right away and/or fire `completion` later (from any thread)
/// with the final list; the most recent result wins. `Ok(None)` leaves the day pending. An
/// `Err` renders an empty day.
pub trait DataSource {
    fn generate_events(
        &self,
        date: NaiveDate,
        completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError>;
}

impl<F> DataSource for F
where
    F: Fn(NaiveDate, Completion<Vec<Event>>) -> Result<Option<Vec<Event>>, SourceError>,
{
    fn generate_events(
        &self,
        date: NaiveDate,
        completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError> {
        self(date, completion)
    }
}

/// A source with no events at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptySource;

impl DataSource for EmptySource {
    fn generate_events(
        &self,
        _date: NaiveDate,
        _completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError> {
        Ok(Some(Vec::new()))
    }
}

/// Appearance of a node. `None` fields are left to the host's defaults.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NodeStyle {
    pub text: Option<String>,
    pub fill: Option<Color>,
    pub text_color: Option<Color>,
}

/// What a [`RenderNode`] stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeKind {
    DayBackground { position: Position, date: NaiveDate },
    Header { position: Position, date: NaiveDate },
    Event { position: Position, id: EventId },
}

/// A positioned, styled element for the host to draw.
///
/// Frames are in window content coordinates (the scroll container's content).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RenderNode {
    pub kind: NodeKind,
    pub frame: Rect,
    pub style: NodeStyle,
}

/// Rendering hooks. Every method has a default, so a styler only overrides what it changes.
pub trait Styler {
    fn shows_date_header(&self) -> bool {
        true
    }

    /// Height reserved above the hour grid for the date header.
    fn date_header_height(&self) -> f64 {
        20.0
    }

    fn header_style(&self, date: NaiveDate, theme: Theme) -> NodeStyle {
        NodeStyle {
            text: Some(date.format("%a %-d").to_string()),
            fill: None,
            text_color: Some(theme.hour_text_color()),
        }
    }

    fn day_style(&self, date: NaiveDate, theme: Theme) -> NodeStyle {
        let fill = if is_weekend(date) {
            theme.weekend_color()
        } else {
            theme.base_color()
        };
        NodeStyle {
            text: None,
            fill: Some(fill),
            text_color: None,
        }
    }

    fn event_style(&self, event: &Event, frame: Rect, theme: Theme) -> NodeStyle {
        let _ = frame;
        NodeStyle {
            text: Some(event.title().to_owned()),
            fill: Some(event.color().unwrap_or(Color::BLUE)),
            text_color: Some(theme.event_text_color()),
        }
    }
}

/// The built-in look: date headers, tinted weekends, titled event boxes.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultStyler;

impl Styler for DefaultStyler {}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Receives user interactions resolved by [`crate::WeekView::tap`].
pub trait Delegate {
    /// `frame` is in viewport coordinates.
    fn event_tapped(&mut self, event: &Event, frame: Rect) {
        let _ = (event, frame);
    }

    fn free_time_tapped(&mut self, at: NaiveDateTime) {
        let _ = at;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDelegate;

impl Delegate for NoopDelegate {}

/// Source of the current wall-clock time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// The host's local time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
