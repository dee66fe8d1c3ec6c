//! A headless, endlessly paged week calendar engine.
//!
//! For adapter-level utilities (snap tweens, the now-line ticker, async fetching), see the
//! `weekview-adapter` crate.
//!
//! This crate focuses on the two parts of a week view that have real invariants:
//! - a virtualized pager that keeps a constant-size window of day pages loaded, shifts it by
//!   one screen when the scroll offset nears either end, and snaps to page edges;
//! - an overlap layout engine that turns one day's events into non-colliding rectangles.
//!
//! It is UI-agnostic. A TUI/GUI layer is expected to provide:
//! - the viewport size and scroll offsets
//! - gesture phases (drag end, deceleration begin) and taps
//! - a [`DataSource`] for each day's events
//!
//! and to draw the [`RenderNode`]s the engine hands back.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod bridge;
mod error;
mod event;
mod geometry;
mod layout;
mod options;
mod page_store;
mod pager;
mod source;
mod state;
mod types;
mod week_view;

#[cfg(test)]
mod tests;

pub use bridge::{Completion, ContentInbox, DeliveryOutcome, DrainSummary};
pub use error::{ConfigError, EventError, SourceError};
pub use event::{Event, EventId};
pub use geometry::{HourMark, TimeScale};
pub use layout::{EventLayout, LayoutOptions, PlacedEvent, place_events};
pub use options::{PagerOptions, WeekViewOptions};
pub use page_store::{PageGeometry, PageRecord, PageRequest, PageSource, PageStore};
pub use pager::{Pager, Placeholder, SnapOutcome, SnapTarget, WindowShift};
pub use source::{
    Clock, DataSource, DefaultStyler, Delegate, EmptySource, FixedClock, NodeKind, NodeStyle,
    NoopDelegate, RenderNode, Styler, SystemClock, is_weekend,
};
pub use state::{PagerState, StoreState, WindowState};
pub use types::{Axis, Color, Point, Position, Rect, ScrollDirection, Size, Theme};
pub use week_view::{NowLine, Tap, WeekView};
