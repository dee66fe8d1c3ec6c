use std::ops::RangeInclusive;

use crate::bridge::{ContentInbox, DeliveryOutcome, DrainSummary};
use crate::page_store::{PageGeometry, PageRecord, PageSource, PageStore};
use crate::state::{PagerState, StoreState, WindowState};
use crate::{ConfigError, PagerOptions, Position, Rect, ScrollDirection};

/// A recentering window shift performed by [`Pager::on_scroll`].
#[derive(Clone, Debug, PartialEq)]
pub struct WindowShift {
    pub direction: ScrollDirection,
    /// How many pages the window moved by (always `pages_per_screen`).
    pub pages: usize,
    /// Amount added to the scroll offset to keep the content visually in place.
    pub offset_delta: f64,
    /// Positions materialized by this shift, if any.
    pub created: Option<RangeInclusive<Position>>,
}

/// The page a snap settled on.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapOutcome {
    pub position: Position,
    /// The scroll offset after the snap, exactly on the page's leading edge.
    pub offset: f64,
    pub shift: Option<WindowShift>,
}

/// A snap candidate: a page of the window and the offset of its leading edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapTarget {
    pub slot: usize,
    pub position: Position,
    pub offset: f64,
}

/// One placeholder of the loaded window, derived on demand from the canonical page record.
#[derive(Debug)]
pub struct Placeholder<'a, C> {
    /// Index inside the window, `0..load_page_count`.
    pub slot: usize,
    pub position: Position,
    /// Frame in window content coordinates.
    pub frame: Rect,
    pub record: &'a PageRecord<C>,
}

impl<C> Clone for Placeholder<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Placeholder<'_, C> {}

impl<'a, C> Placeholder<'a, C> {
    pub fn content(&self) -> Option<&'a C> {
        self.record.content()
    }

    pub fn is_done(&self) -> bool {
        self.record.is_done()
    }
}

/// A virtualized, endlessly scrolling pager.
///
/// The pager keeps three screens' worth of pages loaded and reports a finite content size to
/// the host's scroll container. When the scroll offset gets within half a page of either end
/// of that content, the window moves by one screen and the offset is compensated so the
/// content does not visibly jump. Pages are never destroyed; moving back over a page shows the
/// content it already has.
///
/// The pager does not hold any UI objects and never calls back into the host except through
/// the [`PageSource`] passed to the methods that can materialize pages.
#[derive(Debug)]
pub struct Pager<C> {
    options: PagerOptions,
    geometry: PageGeometry,
    store: PageStore<C>,
    inbox: ContentInbox<C>,
    view_range_start: usize,
    scroll_offset: f64,
}

impl<C: Default> Pager<C> {
    /// Validates `options` and materializes the initial window, positions
    /// `0..3 * pages_per_screen`, with the middle screen in view.
    pub fn new(options: PagerOptions, source: &mut impl PageSource<C>) -> Result<Self, ConfigError> {
        let geometry = options.validate()?;
        wdebug!(
            pages_per_screen = options.pages_per_screen,
            spacer = options.spacer,
            axis = ?options.axis,
            "Pager::new"
        );
        let mut pager = Self {
            options,
            geometry,
            store: PageStore::new(geometry),
            inbox: ContentInbox::new(),
            view_range_start: 0,
            scroll_offset: 0.0,
        };
        pager.seed(source);
        Ok(pager)
    }

    pub fn options(&self) -> &PagerOptions {
        &self.options
    }

    /// Replaces the options and reseeds the window.
    ///
    /// Every page is requested again; completions issued before the call are dropped.
    pub fn set_options(
        &mut self,
        options: PagerOptions,
        source: &mut impl PageSource<C>,
    ) -> Result<(), ConfigError> {
        let geometry = options.validate()?;
        self.options = options;
        self.geometry = geometry;
        self.store = PageStore::new(geometry);
        self.reset(source);
        Ok(())
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn store(&self) -> &PageStore<C> {
        &self.store
    }

    pub fn record_at(&self, position: Position) -> Option<&PageRecord<C>> {
        self.store.record_at(position)
    }

    pub fn views_in_page_count(&self) -> usize {
        self.options.pages_per_screen
    }

    /// Number of placeholders in the window: one screen on each side of the visible one.
    pub fn load_page_count(&self) -> usize {
        self.options.pages_per_screen * 3
    }

    /// Ordinal of the window's first page inside the store.
    pub fn view_range_start(&self) -> usize {
        self.view_range_start
    }

    /// Position shown in the window's first slot.
    pub fn window_start(&self) -> Position {
        self.store.first_position().unwrap_or(0) + self.view_range_start as i64
    }

    /// Positions covered by the loaded window.
    pub fn window_positions(&self) -> RangeInclusive<Position> {
        let start = self.window_start();
        start..=start + self.load_page_count() as i64 - 1
    }

    pub fn viewport_main(&self) -> f64 {
        self.options.viewport.main(self.options.axis)
    }

    /// Size of the window along the paging axis, as reported to the scroll container.
    pub fn content_size(&self) -> f64 {
        self.geometry.stride() * self.load_page_count() as f64 - self.geometry.spacer
    }

    pub fn max_scroll_offset(&self) -> f64 {
        (self.content_size() - self.viewport_main()).max(0.0)
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    /// Distance from either end of the content at which the window shifts.
    pub fn load_threshold(&self) -> f64 {
        self.geometry.page_size.main(self.geometry.axis) / 2.0
    }

    /// Applies a scroll offset reported by the host.
    ///
    /// The offset is clamped to the content. Returns the shift when an edge threshold was
    /// crossed; the host must then move its scroll container to [`Self::scroll_offset`].
    pub fn on_scroll(
        &mut self,
        offset: f64,
        source: &mut impl PageSource<C>,
    ) -> Option<WindowShift> {
        let offset = if offset.is_finite() {
            offset.clamp(0.0, self.max_scroll_offset())
        } else {
            self.scroll_offset
        };
        self.scroll_offset = offset;

        let threshold = self.load_threshold();
        if offset + self.viewport_main() >= self.content_size() - threshold {
            Some(self.shift_forward(source))
        } else if offset < threshold {
            Some(self.shift_backward(source))
        } else {
            None
        }
    }

    fn shift_forward(&mut self, source: &mut impl PageSource<C>) -> WindowShift {
        let n = self.views_in_page_count();
        let mut created = None;
        if self.view_range_start + n + self.load_page_count() > self.store.len() {
            if let Some(last) = self.store.last_position() {
                created = self.materialize(last + 1, last + n as i64, source);
            }
        }
        self.view_range_start += n;
        let offset_delta = -self.geometry.main_offset(n as i64);
        self.scroll_offset += offset_delta;
        wtrace!(
            view_range_start = self.view_range_start,
            scroll_offset = self.scroll_offset,
            "window shifted forward"
        );
        WindowShift {
            direction: ScrollDirection::Forward,
            pages: n,
            offset_delta,
            created,
        }
    }

    fn shift_backward(&mut self, source: &mut impl PageSource<C>) -> WindowShift {
        let n = self.views_in_page_count();
        let mut created = None;
        if self.view_range_start >= n {
            self.view_range_start -= n;
        } else if let Some(first) = self.store.first_position() {
            created = self.materialize(first - n as i64, first - 1, source);
        }
        let offset_delta = self.geometry.main_offset(n as i64);
        self.scroll_offset += offset_delta;
        wtrace!(
            view_range_start = self.view_range_start,
            scroll_offset = self.scroll_offset,
            "window shifted backward"
        );
        WindowShift {
            direction: ScrollDirection::Backward,
            pages: n,
            offset_delta,
            created,
        }
    }

    fn materialize(
        &mut self,
        from: Position,
        to: Position,
        source: &mut impl PageSource<C>,
    ) -> Option<RangeInclusive<Position>> {
        let created = self.store.create_pages(from, to, source, &self.inbox);
        wdebug!(from, to, materialized = self.store.len(), "pages created");
        created
    }

    /// Window slot of `position`, if it is in the loaded window.
    pub fn slot_of(&self, position: Position) -> Option<usize> {
        let slot = self
            .store
            .ordinal_of(position)?
            .checked_sub(self.view_range_start)?;
        (slot < self.load_page_count()).then_some(slot)
    }

    /// Whether `position` currently has a placeholder.
    pub fn is_visible(&self, position: Position) -> bool {
        self.slot_of(position).is_some()
    }

    /// Leading-edge offset of `position` in window content coordinates.
    pub fn anchor_offset(&self, position: Position) -> Option<f64> {
        self.slot_of(position)
            .map(|slot| self.geometry.main_offset(slot as i64))
    }

    /// The page edge nearest to the current offset.
    ///
    /// Candidates are the window pages whose leading edge the scroll container can reach.
    /// Distances are compared with a strict `<`, so the earlier page wins a tie.
    pub fn snap_target(&self) -> Option<SnapTarget> {
        let max = self.max_scroll_offset();
        let mut best: Option<(SnapTarget, f64)> = None;
        for slot in 0..self.load_page_count() {
            let offset = self.geometry.main_offset(slot as i64);
            if offset > max {
                break;
            }
            let distance = (offset - self.scroll_offset).abs();
            if best.as_ref().is_none_or(|(_, d)| distance < *d) {
                let position = self.window_start() + slot as i64;
                best = Some((
                    SnapTarget {
                        slot,
                        position,
                        offset,
                    },
                    distance,
                ));
            }
        }
        best.map(|(target, _)| target)
    }

    /// Rests the offset exactly on the nearest page edge.
    ///
    /// The snap may land inside a threshold and shift the window; the returned offset already
    /// accounts for that.
    pub fn snap(&mut self, source: &mut impl PageSource<C>) -> Option<SnapOutcome> {
        let target = self.snap_target()?;
        wtrace!(position = target.position, offset = target.offset, "snap");
        self.snap_to(target.position, source)
    }

    /// Rests the offset exactly on the leading edge of `position`.
    ///
    /// Returns `None` when the page is not in the loaded window.
    pub fn snap_to(
        &mut self,
        position: Position,
        source: &mut impl PageSource<C>,
    ) -> Option<SnapOutcome> {
        let offset = self.anchor_offset(position)?;
        let shift = self.on_scroll(offset, source);
        let offset = self.anchor_offset(position)?;
        self.scroll_offset = offset;
        Some(SnapOutcome {
            position,
            offset,
            shift,
        })
    }

    /// Calls `f` for every placeholder of the loaded window, in slot order.
    pub fn for_each_placeholder<'a>(&'a self, mut f: impl FnMut(Placeholder<'a, C>)) {
        for slot in 0..self.load_page_count() {
            if let Some(placeholder) = self.placeholder_at_slot(slot) {
                f(placeholder);
            }
        }
    }

    /// Collects placeholders into `out` (clears `out` first).
    pub fn collect_placeholders<'a>(&'a self, out: &mut Vec<Placeholder<'a, C>>) {
        out.clear();
        self.for_each_placeholder(|p| out.push(p));
    }

    pub fn placeholder_at_slot(&self, slot: usize) -> Option<Placeholder<'_, C>> {
        if slot >= self.load_page_count() {
            return None;
        }
        let record = self.store.at_ordinal(self.view_range_start + slot)?;
        Some(Placeholder {
            slot,
            position: record.position(),
            frame: self.geometry.bounds_at(slot as i64),
            record,
        })
    }

    /// The placeholder under a window content coordinate along the paging axis.
    ///
    /// Returns `None` in the spacer between two pages and outside the window.
    pub fn placeholder_at_offset(&self, main: f64) -> Option<Placeholder<'_, C>> {
        if !main.is_finite() || main < 0.0 {
            return None;
        }
        let stride = self.geometry.stride();
        let slot = (main / stride).floor();
        let within = main - slot * stride;
        if within >= self.geometry.page_size.main(self.geometry.axis) {
            return None;
        }
        self.placeholder_at_slot(slot as usize)
    }

    /// The first page whose content is (at least partly) on screen.
    pub fn leading_position(&self) -> Position {
        let stride = self.geometry.stride();
        let page = self.geometry.page_size.main(self.geometry.axis);
        let slot = (self.scroll_offset / stride).floor();
        // A page scrolled entirely off except for its trailing spacer does not count.
        let slot = if self.scroll_offset - slot * stride >= page {
            slot + 1.0
        } else {
            slot
        };
        self.window_start() + slot as i64
    }

    /// Drains queued completions into the store.
    pub fn apply_completions(&mut self) -> DrainSummary {
        self.apply_completions_with(|_| {})
    }

    /// Like [`Self::apply_completions`], reporting each outcome to `f`.
    pub fn apply_completions_with(&mut self, mut f: impl FnMut(DeliveryOutcome)) -> DrainSummary {
        let mut summary = DrainSummary::default();
        while let Some(delivery) = self.inbox.try_next() {
            let position = delivery.position;
            let outcome = if delivery.epoch != self.inbox.epoch() {
                DeliveryOutcome::Stale { position }
            } else if self.store.deliver(position, delivery.content) {
                DeliveryOutcome::Applied {
                    position,
                    visible: self.is_visible(position),
                }
            } else {
                DeliveryOutcome::Stale { position }
            };
            if matches!(outcome, DeliveryOutcome::Stale { .. }) {
                wtrace!(position, "dropping stale completion");
            }
            summary.record(outcome);
            f(outcome);
        }
        summary
    }

    /// Discards every page and reseeds the window around position 0.
    pub fn reset(&mut self, source: &mut impl PageSource<C>) {
        self.inbox.advance_epoch();
        self.store.clear();
        wdebug!(epoch = self.inbox.epoch(), "Pager::reset");
        self.seed(source);
    }

    fn seed(&mut self, source: &mut impl PageSource<C>) {
        let n = self.views_in_page_count();
        self.materialize(0, self.load_page_count() as i64 - 1, source);
        self.view_range_start = 0;
        self.scroll_offset = self.geometry.main_offset(n as i64);
    }

    pub fn state(&self) -> PagerState {
        PagerState {
            window: WindowState {
                view_range_start: self.view_range_start,
                views_in_page_count: self.views_in_page_count(),
                load_page_count: self.load_page_count(),
            },
            store: StoreState {
                first_position: self.store.first_position().unwrap_or(0),
                last_position: self.store.last_position().unwrap_or(0),
                materialized: self.store.len(),
            },
            scroll_offset: self.scroll_offset,
        }
    }
}
