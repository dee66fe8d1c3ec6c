//! Adapter utilities for the `weekview` crate.
//!
//! The `weekview` crate is UI-agnostic and synchronous. This crate provides small,
//! framework-neutral helpers commonly needed by adapters:
//!
//! - Tween-based snap animations that survive window recentering
//! - A cancellable now-line ticker on `tokio`
//! - An async data source that fetches days on a `tokio` runtime
//!
//! This crate is intentionally framework-agnostic (no ratatui/egui bindings).
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod fetch;
mod now_line;
mod tween;


pub use controller::Controller;
pub use fetch::AsyncSource;
pub use now_line::{NowLineTicker, NowLineUpdater};
pub use tween::{Easing, Tween};
