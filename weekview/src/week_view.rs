use std::collections::HashMap;
use std::mem;

use chrono::{Days, NaiveDate, NaiveDateTime};

use crate::bridge::{Completion, DrainSummary};
use crate::geometry::HourMark;
use crate::page_store::{PageRequest, PageSource};
use crate::pager::{Pager, SnapOutcome, WindowShift};
use crate::source::{
    Clock, DataSource, DefaultStyler, Delegate, NodeKind, NoopDelegate, RenderNode, Styler,
};
use crate::{
    ConfigError, Event, EventId, EventLayout, Point, Position, Rect, SourceError, Theme,
    TimeScale, WeekViewOptions, place_events,
};

/// Adapts a [`DataSource`] to the pager's position-keyed requests.
struct DaySource<'a, D> {
    source: &'a D,
    origin: NaiveDate,
}

impl<D: DataSource> PageSource<Vec<Event>> for DaySource<'_, D> {
    fn fill_page(
        &mut self,
        request: PageRequest,
        completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError> {
        let date = offset_date(self.origin, request.position).ok_or_else(|| {
            SourceError::Unavailable(format!("no date for page {}", request.position))
        })?;
        self.source.generate_events(date, completion)
    }
}

fn offset_date(origin: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        origin.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        origin.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// A resolved tap.
#[derive(Clone, Debug, PartialEq)]
pub enum Tap {
    /// `frame` is in viewport coordinates.
    Event {
        position: Position,
        id: EventId,
        frame: Rect,
    },
    FreeTime {
        position: Position,
        at: NaiveDateTime,
    },
}

/// The guide line for the current time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NowLine {
    /// Vertical offset inside every column.
    pub y: f64,
    /// Zero-height span across the whole window, in window content coordinates.
    pub span: Rect,
    /// Today's page and column frame, when today is in the loaded window.
    pub today: Option<(Position, Rect)>,
    pub color: crate::Color,
}

/// An endlessly scrolling week calendar.
///
/// Wires a [`Pager`] of day columns to a [`DataSource`], lays out each day's events when its
/// content arrives and turns the result into [`RenderNode`]s. Like the pager, it is driven
/// entirely by the host: report scroll offsets, gesture phases and taps, drain completions,
/// then render.
pub struct WeekView<D, S = DefaultStyler, G = NoopDelegate> {
    options: WeekViewOptions,
    source: D,
    styler: S,
    delegate: G,
    pager: Pager<Vec<Event>>,
    scale: TimeScale,
    origin: NaiveDate,
    layouts: HashMap<Position, (u64, EventLayout)>,
}

impl<D: DataSource> WeekView<D> {
    pub fn new(options: WeekViewOptions, source: D) -> Result<Self, ConfigError> {
        Self::with_parts(options, source, DefaultStyler, NoopDelegate)
    }
}

impl<D: DataSource, S: Styler, G: Delegate> WeekView<D, S, G> {
    pub fn with_parts(
        options: WeekViewOptions,
        source: D,
        styler: S,
        delegate: G,
    ) -> Result<Self, ConfigError> {
        let geometry = options.validate()?;
        let header = if styler.shows_date_header() {
            options
                .header_height
                .unwrap_or_else(|| styler.date_header_height())
        } else {
            0.0
        };
        let scale = TimeScale::new(
            options.start_hour,
            options.end_hour,
            geometry.page_size.height,
            header,
        )?;
        let origin = origin_for(&options);
        let pager = Pager::new(
            options.pager_options(),
            &mut DaySource {
                source: &source,
                origin,
            },
        )?;
        wdebug!(
            initial_date = %options.initial_date,
            visible_days = options.visible_days,
            "WeekView::new"
        );

        let mut view = Self {
            options,
            source,
            styler,
            delegate,
            pager,
            scale,
            origin,
            layouts: HashMap::new(),
        };
        view.sync_layouts();
        Ok(view)
    }

    pub fn options(&self) -> &WeekViewOptions {
        &self.options
    }

    pub fn pager(&self) -> &Pager<Vec<Event>> {
        &self.pager
    }

    pub fn scale(&self) -> &TimeScale {
        &self.scale
    }

    pub fn source(&self) -> &D {
        &self.source
    }

    pub fn styler(&self) -> &S {
        &self.styler
    }

    pub fn delegate(&self) -> &G {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut G {
        &mut self.delegate
    }

    pub fn scroll_offset(&self) -> f64 {
        self.pager.scroll_offset()
    }

    pub fn content_size(&self) -> f64 {
        self.pager.content_size()
    }

    /// The day shown by page `position`.
    pub fn date_for(&self, position: Position) -> Option<NaiveDate> {
        offset_date(self.origin, position)
    }

    pub fn position_for(&self, date: NaiveDate) -> Position {
        (date - self.origin).num_days()
    }

    /// Applies a scroll offset reported by the host. See [`Pager::on_scroll`].
    pub fn on_scroll(&mut self, offset: f64) -> Option<WindowShift> {
        let shift = self.pager.on_scroll(
            offset,
            &mut DaySource {
                source: &self.source,
                origin: self.origin,
            },
        );
        if shift.is_some() {
            self.sync_layouts();
        }
        shift
    }

    /// Snaps to the nearest day when snapping is enabled.
    pub fn on_drag_end(&mut self) -> Option<SnapOutcome> {
        if !self.options.snap_enabled {
            return None;
        }
        self.snap_now()
    }

    pub fn on_deceleration_begin(&mut self) -> Option<SnapOutcome> {
        self.on_drag_end()
    }

    /// Snaps to the nearest day regardless of the snap setting.
    pub fn snap_now(&mut self) -> Option<SnapOutcome> {
        let outcome = self.pager.snap(&mut DaySource {
            source: &self.source,
            origin: self.origin,
        });
        self.sync_layouts();
        outcome
    }

    /// Rests the offset on the leading edge of `position`, if it is in the loaded window.
    pub fn snap_to(&mut self, position: Position) -> Option<SnapOutcome> {
        let outcome = self.pager.snap_to(
            position,
            &mut DaySource {
                source: &self.source,
                origin: self.origin,
            },
        );
        self.sync_layouts();
        outcome
    }

    /// Merges content delivered through completions and relays out the affected days.
    pub fn apply_completions(&mut self) -> DrainSummary {
        let summary = self.pager.apply_completions();
        if summary.applied > 0 {
            self.sync_layouts();
        }
        summary
    }

    /// Page-local layout of a day in the loaded window.
    pub fn layout_for(&self, position: Position) -> Option<&EventLayout> {
        self.layouts.get(&position).map(|(_, layout)| layout)
    }

    fn sync_layouts(&mut self) {
        let window = self.pager.window_positions();
        self.layouts.retain(|position, _| window.contains(position));

        let column = self.pager.geometry().local_bounds();
        for slot in 0..self.pager.load_page_count() {
            let Some(placeholder) = self.pager.placeholder_at_slot(slot) else {
                continue;
            };
            let Some(events) = placeholder.content() else {
                continue;
            };
            let revision = placeholder.record.revision();
            let position = placeholder.position;
            if self
                .layouts
                .get(&position)
                .is_some_and(|(cached, _)| *cached == revision)
            {
                continue;
            }
            let Some(day) = offset_date(self.origin, position) else {
                continue;
            };
            let day_events: Vec<Event> = events
                .iter()
                .filter(|event| event.touches_day(day))
                .cloned()
                .collect();
            let layout = place_events(&day_events, day, column, &self.scale, &self.options.layout);
            wtrace!(position, events = layout.len(), revision, "day laid out");
            self.layouts.insert(position, (revision, layout));
        }
    }

    /// Calls `f` for every node of the loaded window: each day's background, its header and
    /// its events, in that order.
    pub fn for_each_render_node(&self, mut f: impl FnMut(RenderNode)) {
        let theme = self.options.theme;
        let shows_header = self.styler.shows_date_header();
        self.pager.for_each_placeholder(|placeholder| {
            let position = placeholder.position;
            let Some(date) = self.date_for(position) else {
                return;
            };
            let column = placeholder.frame;
            f(RenderNode {
                kind: NodeKind::DayBackground { position, date },
                frame: column,
                style: self.styler.day_style(date, theme),
            });
            if shows_header {
                f(RenderNode {
                    kind: NodeKind::Header { position, date },
                    frame: Rect::new(column.x, column.y, column.width, self.scale.top()),
                    style: self.styler.header_style(date, theme),
                });
            }
            if let Some(layout) = self.layout_for(position) {
                for placed in layout {
                    let frame = placed.frame.translated(column.x, column.y);
                    f(RenderNode {
                        kind: NodeKind::Event {
                            position,
                            id: placed.event.id(),
                        },
                        frame,
                        style: self.styler.event_style(&placed.event, frame, theme),
                    });
                }
            }
        });
    }

    /// Collects render nodes into `out` (clears `out` first).
    pub fn render(&self, out: &mut Vec<RenderNode>) {
        out.clear();
        self.for_each_render_node(|node| out.push(node));
    }

    /// Resolves a tap at `point` (viewport coordinates) and notifies the delegate.
    ///
    /// Events win over free time; the topmost event wins over the ones it covers. Taps on a
    /// header, a spacer or outside the visible hours resolve to nothing.
    pub fn tap(&mut self, point: Point) -> Option<Tap> {
        let offset = self.pager.scroll_offset();
        let placeholder = self.pager.placeholder_at_offset(point.x + offset)?;
        let position = placeholder.position;
        let column = placeholder.frame;
        let local = Point::new(point.x + offset - column.x, point.y - column.y);

        let hit = self
            .layouts
            .get(&position)
            .and_then(|(_, layout)| layout.hit_test(local));
        if let Some(placed) = hit {
            let frame = placed.frame.translated(column.x - offset, column.y);
            self.delegate.event_tapped(&placed.event, frame);
            return Some(Tap::Event {
                position,
                id: placed.event.id(),
                frame,
            });
        }

        let time = self.scale.time_at(local.y)?;
        let at = offset_date(self.origin, position)?.and_time(time);
        self.delegate.free_time_tapped(at);
        Some(Tap::FreeTime { position, at })
    }

    pub fn now_line_enabled(&self) -> bool {
        self.options.now_line_enabled
    }

    pub fn set_now_line_enabled(&mut self, enabled: bool) {
        self.options.now_line_enabled = enabled;
    }

    /// Where the now-line goes at `now`, or `None` when it is disabled or `now` is outside
    /// the visible hours.
    pub fn now_line(&self, now: NaiveDateTime) -> Option<NowLine> {
        if !self.options.now_line_enabled {
            return None;
        }
        let y = self.scale.now_line_y(now.time())?;
        let position = self.position_for(now.date());
        let today = self
            .pager
            .slot_of(position)
            .and_then(|slot| self.pager.placeholder_at_slot(slot))
            .map(|placeholder| (position, placeholder.frame));
        Some(NowLine {
            y,
            span: Rect::new(0.0, y, self.pager.content_size(), 0.0),
            today,
            color: self.options.now_line_color,
        })
    }

    pub fn now_line_at(&self, clock: &impl Clock) -> Option<NowLine> {
        self.now_line(clock.now())
    }

    pub fn hour_marks(&self) -> impl Iterator<Item = HourMark> + '_ {
        self.scale.hour_marks()
    }

    /// The first day at least partly on screen.
    pub fn leading_date(&self) -> Option<NaiveDate> {
        self.date_for(self.pager.leading_position())
    }

    /// Month and year of the leading day, e.g. `"March 2024"`.
    pub fn title(&self) -> Option<String> {
        self.leading_date()
            .map(|date| date.format("%B %Y").to_string())
    }

    pub fn theme(&self) -> Theme {
        self.options.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.options.theme = theme;
    }

    /// Re-seeds the view so `date` is the first day on screen.
    ///
    /// Every page is requested again; completions still in flight are dropped.
    pub fn jump_to_date(&mut self, date: NaiveDate) {
        self.options.initial_date = date;
        self.origin = origin_for(&self.options);
        self.reload();
    }

    /// Swaps the data source and reloads every page. Returns the previous source.
    pub fn set_source(&mut self, source: D) -> D {
        let previous = mem::replace(&mut self.source, source);
        self.reload();
        previous
    }

    /// Requests every page again from the current source.
    pub fn reload(&mut self) {
        self.pager.reset(&mut DaySource {
            source: &self.source,
            origin: self.origin,
        });
        self.layouts.clear();
        self.sync_layouts();
    }
}

fn origin_for(options: &WeekViewOptions) -> NaiveDate {
    let back = i64::try_from(options.visible_days).unwrap_or(i64::MAX);
    offset_date(options.initial_date, -back).unwrap_or(options.initial_date)
}

impl<D, S, G> std::fmt::Debug for WeekView<D, S, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeekView")
            .field("options", &self.options)
            .field("origin", &self.origin)
            .field("scale", &self.scale)
            .field("state", &self.pager.state())
            .finish_non_exhaustive()
    }
}
