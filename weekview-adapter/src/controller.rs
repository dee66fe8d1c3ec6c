use chrono::NaiveDate;
use weekview::{
    DataSource, Delegate, DrainSummary, Position, Styler, WeekView, WindowShift,
};

use crate::{Easing, Tween};

#[derive(Clone, Copy, Debug, PartialEq)]
struct SnapAnimation {
    tween: Tween,
    position: Position,
}

/// A framework-neutral controller that wraps a `weekview::WeekView` and animates snapping.
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_scroll` when the user drags or flings
/// - `on_drag_end` / `on_deceleration_begin` at the matching gesture phases
/// - `tick(now_ms)` each frame/timer tick while [`Self::is_animating`]
///
/// Use the offset returned from `tick()` (or [`WeekView::scroll_offset`] after a window shift)
/// to set the real scroll position.
pub struct Controller<D, S = weekview::DefaultStyler, G = weekview::NoopDelegate> {
    view: WeekView<D, S, G>,
    animation: Option<SnapAnimation>,
    snap_duration_ms: u64,
    easing: Easing,
}

impl<D: DataSource, S: Styler, G: Delegate> Controller<D, S, G> {
    pub fn new(view: WeekView<D, S, G>) -> Self {
        Self {
            view,
            animation: None,
            snap_duration_ms: 240,
            easing: Easing::SmoothStep,
        }
    }

    pub fn with_snap_animation(mut self, duration_ms: u64, easing: Easing) -> Self {
        self.snap_duration_ms = duration_ms;
        self.easing = easing;
        self
    }

    pub fn week_view(&self) -> &WeekView<D, S, G> {
        &self.view
    }

    pub fn week_view_mut(&mut self) -> &mut WeekView<D, S, G> {
        &mut self.view
    }

    pub fn into_week_view(self) -> WeekView<D, S, G> {
        self.view
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// The page the running snap animation is heading to.
    pub fn snap_destination(&self) -> Option<Position> {
        self.animation.map(|a| a.position)
    }

    pub fn cancel_animation(&mut self) {
        self.animation = None;
    }

    /// Call this when the UI reports a scroll offset change (e.g. user drag).
    ///
    /// This cancels any active snap animation.
    pub fn on_scroll(&mut self, offset: f64) -> Option<WindowShift> {
        self.cancel_animation();
        self.view.on_scroll(offset)
    }

    /// Starts a snap animation to the nearest day, if snapping is enabled.
    ///
    /// Returns the target offset.
    pub fn on_drag_end(&mut self, now_ms: u64) -> Option<f64> {
        if !self.view.options().snap_enabled {
            return None;
        }
        let target = self.view.pager().snap_target()?;
        self.start_tween_to_position(target.position, now_ms)
    }

    pub fn on_deceleration_begin(&mut self, now_ms: u64) -> Option<f64> {
        self.on_drag_end(now_ms)
    }

    /// Starts a tween to the leading edge of `position` (adapter-driven).
    ///
    /// Returns the target offset, or `None` when the page is not in the loaded window.
    pub fn start_tween_to_position(&mut self, position: Position, now_ms: u64) -> Option<f64> {
        let to = self.view.pager().anchor_offset(position)?;
        let from = self.view.scroll_offset();
        self.animation = Some(SnapAnimation {
            tween: Tween::new(from, to, now_ms, self.snap_duration_ms, self.easing),
            position,
        });
        Some(to)
    }

    /// Advances the controller.
    ///
    /// If a snap animation is active, applies the next offset and returns the resulting scroll
    /// offset; the last tick lands exactly on the page edge. Returns `None` when idle.
    pub fn tick(&mut self, now_ms: u64) -> Option<f64> {
        let mut animation = self.animation?;

        let offset = animation.tween.sample(now_ms);
        if let Some(shift) = self.view.on_scroll(offset) {
            animation.tween.translate(shift.offset_delta);
        }

        if animation.tween.is_done(now_ms) {
            self.animation = None;
            if self.view.snap_to(animation.position).is_none() {
                self.view.snap_now();
            }
        } else {
            self.animation = Some(animation);
        }

        Some(self.view.scroll_offset())
    }

    /// Re-seeds the view around `date` (no animation). Cancels any active snap animation.
    pub fn jump_to_date(&mut self, date: NaiveDate) {
        self.cancel_animation();
        self.view.jump_to_date(date);
    }

    pub fn apply_completions(&mut self) -> DrainSummary {
        self.view.apply_completions()
    }
}

impl<D, S, G> std::fmt::Debug for Controller<D, S, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("view", &self.view)
            .field("animation", &self.animation)
            .field("snap_duration_ms", &self.snap_duration_ms)
            .field("easing", &self.easing)
            .finish()
    }
}
