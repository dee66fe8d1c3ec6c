use std::time::Duration;

use chrono::{Local, NaiveDate, TimeDelta};

use crate::page_store::PageGeometry;
use crate::{Axis, Color, ConfigError, LayoutOptions, Size, Theme};

/// Configuration for [`crate::Pager`].
///
/// `pages_per_screen` pages (plus the spacers between them) fill the viewport exactly along
/// `axis`; the loaded window holds three screens' worth of pages.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PagerOptions {
    pub pages_per_screen: usize,
    /// Gap between two adjacent pages.
    pub spacer: f64,
    pub viewport: Size,
    pub axis: Axis,
    /// Whether drag-end and deceleration-begin snap to a page edge.
    pub snap_enabled: bool,
}

impl PagerOptions {
    pub fn new(viewport: Size, pages_per_screen: usize) -> Self {
        Self {
            pages_per_screen,
            spacer: 2.0,
            viewport,
            axis: Axis::Horizontal,
            snap_enabled: true,
        }
    }

    pub fn with_spacer(mut self, spacer: f64) -> Self {
        self.spacer = spacer;
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_snap_enabled(mut self, snap_enabled: bool) -> Self {
        self.snap_enabled = snap_enabled;
        self
    }

    /// Checks the options and derives the page geometry they imply.
    pub fn validate(&self) -> Result<PageGeometry, ConfigError> {
        let pages = self.pages_per_screen;
        if pages == 0 {
            return Err(ConfigError::ZeroPageCount);
        }
        if !self.spacer.is_finite() || self.spacer < 0.0 {
            return Err(ConfigError::InvalidSpacer(self.spacer));
        }

        let main = self.viewport.main(self.axis);
        let cross = self.viewport.cross(self.axis);
        let page_main = (main - self.spacer * (pages - 1) as f64) / pages as f64;
        if !page_main.is_finite() || page_main <= 0.0 || !cross.is_finite() || cross <= 0.0 {
            return Err(ConfigError::ViewportTooSmall {
                width: self.viewport.width,
                height: self.viewport.height,
                pages,
                spacer: self.spacer,
            });
        }

        Ok(PageGeometry {
            axis: self.axis,
            page_size: Size::from_main_cross(self.axis, page_main, cross),
            spacer: self.spacer,
        })
    }
}

/// Configuration for [`crate::WeekView`].
///
/// Day columns always page horizontally. Build with [`WeekViewOptions::new`] and adjust with
/// the `with_*` methods; [`crate::WeekView::new`] validates the result.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekViewOptions {
    /// Number of day columns on screen at once.
    pub visible_days: usize,
    pub spacer: f64,
    pub viewport: Size,
    pub start_hour: u32,
    pub end_hour: u32,
    /// Overrides the styler's date header height.
    pub header_height: Option<f64>,
    pub now_line_enabled: bool,
    pub now_line_color: Color,
    /// How often an adapter should refresh the now-line.
    pub now_line_interval: Duration,
    pub snap_enabled: bool,
    /// First day of the middle screen of the loaded window.
    pub initial_date: NaiveDate,
    pub theme: Theme,
    pub layout: LayoutOptions,
}

impl WeekViewOptions {
    pub fn new(viewport: Size, initial_date: NaiveDate) -> Self {
        Self {
            visible_days: 5,
            spacer: 2.0,
            viewport,
            start_hour: 9,
            end_hour: 17,
            header_height: None,
            now_line_enabled: true,
            now_line_color: Color::RED,
            now_line_interval: Duration::from_secs(15),
            snap_enabled: true,
            initial_date,
            theme: Theme::default(),
            layout: LayoutOptions::default(),
        }
    }

    /// Options starting on the host's current local date.
    pub fn today(viewport: Size) -> Self {
        Self::new(viewport, Local::now().date_naive())
    }

    pub fn with_visible_days(mut self, visible_days: usize) -> Self {
        self.visible_days = visible_days;
        self
    }

    pub fn with_spacer(mut self, spacer: f64) -> Self {
        self.spacer = spacer;
        self
    }

    pub fn with_hours(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.start_hour = start_hour;
        self.end_hour = end_hour;
        self
    }

    pub fn with_header_height(mut self, header_height: Option<f64>) -> Self {
        self.header_height = header_height;
        self
    }

    pub fn with_now_line(mut self, enabled: bool, color: Color) -> Self {
        self.now_line_enabled = enabled;
        self.now_line_color = color;
        self
    }

    pub fn with_now_line_interval(mut self, interval: Duration) -> Self {
        self.now_line_interval = interval;
        self
    }

    pub fn with_snap_enabled(mut self, snap_enabled: bool) -> Self {
        self.snap_enabled = snap_enabled;
        self
    }

    pub fn with_initial_date(mut self, initial_date: NaiveDate) -> Self {
        self.initial_date = initial_date;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = layout;
        self
    }

    /// The paging configuration the week view runs on.
    pub fn pager_options(&self) -> PagerOptions {
        PagerOptions::new(self.viewport, self.visible_days)
            .with_spacer(self.spacer)
            .with_snap_enabled(self.snap_enabled)
    }

    /// Checks everything that does not depend on the styler.
    ///
    /// Hour bounds and header height are checked again against the real column height when
    /// the time scale is built.
    pub fn validate(&self) -> Result<PageGeometry, ConfigError> {
        let geometry = self.pager_options().validate()?;
        if self.end_hour > 24 {
            return Err(ConfigError::HourOutOfRange(self.end_hour));
        }
        if self.start_hour >= self.end_hour {
            return Err(ConfigError::EmptyHourRange {
                start: self.start_hour,
                end: self.end_hour,
            });
        }
        if self.now_line_interval.is_zero() {
            return Err(ConfigError::ZeroNowLineInterval);
        }
        if self.layout.cluster_threshold < TimeDelta::zero() {
            return Err(ConfigError::NegativeClusterThreshold);
        }
        Ok(geometry)
    }
}
