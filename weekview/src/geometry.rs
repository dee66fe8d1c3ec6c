use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

use crate::ConfigError;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Maps wall-clock times to vertical offsets inside a day column, and back.
///
/// The visible hours `start_hour..end_hour` are spread evenly over the column height left
/// below the header. Every consumer (event layout, free-time taps, the now-line) goes
/// through the same scale, so their coordinates always agree.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeScale {
    start_hour: u32,
    end_hour: u32,
    top: f64,
    hour_height: f64,
}

/// One labelled hour line.
#[derive(Clone, Debug, PartialEq)]
pub struct HourMark {
    pub hour: u32,
    pub y: f64,
    pub label: String,
}

impl TimeScale {
    pub fn new(
        start_hour: u32,
        end_hour: u32,
        column_height: f64,
        header_height: f64,
    ) -> Result<Self, ConfigError> {
        if end_hour > 24 {
            return Err(ConfigError::HourOutOfRange(end_hour));
        }
        if start_hour >= end_hour {
            return Err(ConfigError::EmptyHourRange {
                start: start_hour,
                end: end_hour,
            });
        }
        if !header_height.is_finite() || header_height < 0.0 {
            return Err(ConfigError::InvalidHeaderHeight(header_height));
        }
        if column_height.is_nan() || column_height <= header_height {
            return Err(ConfigError::HeaderTooTall {
                header: header_height,
                column: column_height,
            });
        }
        let hour_height = (column_height - header_height) / f64::from(end_hour - start_hour);
        Ok(Self {
            start_hour,
            end_hour,
            top: header_height,
            hour_height,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub fn visible_hours(&self) -> u32 {
        self.end_hour - self.start_hour
    }

    /// Offset of the first visible hour (the header height).
    pub fn top(&self) -> f64 {
        self.top
    }

    /// Offset of the last visible hour.
    pub fn bottom(&self) -> f64 {
        self.top + self.hour_height * f64::from(self.visible_hours())
    }

    pub fn hour_height(&self) -> f64 {
        self.hour_height
    }

    pub fn minute_height(&self) -> f64 {
        self.hour_height / 60.0
    }

    /// First visible instant of `day`.
    pub fn window_start(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(self.start_hour))
    }

    /// Last visible instant of `day`. For `end_hour == 24` this is the next midnight.
    pub fn window_end(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(self.end_hour))
    }

    /// Offset of `at` inside the column for `day`, clamped to the visible hours.
    pub fn y_for(&self, day: NaiveDate, at: NaiveDateTime) -> f64 {
        let start = self.window_start(day);
        let clamped = at.clamp(start, self.window_end(day));
        let hours = (clamped - start).num_milliseconds() as f64 / (SECONDS_PER_HOUR * 1000.0);
        self.top + hours * self.hour_height
    }

    /// Offset of a time of day. Times outside the visible hours map outside `top..=bottom`.
    pub fn y_for_time(&self, time: NaiveTime) -> f64 {
        let hours = f64::from(time.num_seconds_from_midnight()) / SECONDS_PER_HOUR;
        self.top + (hours - f64::from(self.start_hour)) * self.hour_height
    }

    /// Inverse of [`Self::y_for_time`], truncated to the minute.
    ///
    /// Returns `None` above the first or at/below the last visible hour.
    pub fn time_at(&self, y: f64) -> Option<NaiveTime> {
        let local = y - self.top;
        if !local.is_finite() || local < 0.0 || y >= self.bottom() {
            return None;
        }
        let hour_index = (local / self.hour_height).floor();
        let hour = self.start_hour + hour_index as u32;
        let minute = ((local - hour_index * self.hour_height) / self.minute_height()).floor();
        let minute = (minute as u32).min(59);
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    /// Offset of the now-line, or `None` when `now` is outside the visible hours.
    pub fn now_line_y(&self, now: NaiveTime) -> Option<f64> {
        let secs = i64::from(now.num_seconds_from_midnight());
        let first = i64::from(self.start_hour) * 3600;
        let last = i64::from(self.end_hour) * 3600;
        (first..=last)
            .contains(&secs)
            .then(|| self.y_for_time(now))
    }

    /// Labelled hour lines for `start_hour..=end_hour`.
    pub fn hour_marks(&self) -> impl Iterator<Item = HourMark> + '_ {
        (self.start_hour..=self.end_hour).map(move |hour| HourMark {
            hour,
            y: self.top + f64::from(hour - self.start_hour) * self.hour_height,
            label: format!("{hour}:00"),
        })
    }
}
