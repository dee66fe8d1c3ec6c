use chrono::NaiveDateTime;

/// Invalid construction parameters for a [`crate::Pager`] or [`crate::WeekView`].
///
/// These are programmer errors: a pager can never be built in a state that violates them.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("pages per screen must be at least 1")]
    ZeroPageCount,
    #[error("spacer size must be finite and non-negative (got {0})")]
    InvalidSpacer(f64),
    #[error("viewport {width}x{height} cannot hold {pages} page(s) with spacer {spacer}")]
    ViewportTooSmall {
        width: f64,
        height: f64,
        pages: usize,
        spacer: f64,
    },
    #[error("start hour {start} must be earlier than end hour {end}")]
    EmptyHourRange { start: u32, end: u32 },
    #[error("end hour {0} is past the end of the day")]
    HourOutOfRange(u32),
    #[error("header height must be finite and non-negative (got {0})")]
    InvalidHeaderHeight(f64),
    #[error("header height {header} leaves no room in a column of height {column}")]
    HeaderTooTall { header: f64, column: f64 },
    #[error("now-line refresh interval must be positive")]
    ZeroNowLineInterval,
    #[error("cluster threshold must not be negative")]
    NegativeClusterThreshold,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("event ends ({end}) before it starts ({start})")]
    EndBeforeStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// A failed fetch reported by a [`crate::DataSource`].
///
/// The pager never propagates this: the page is rendered as an empty day instead.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("event source unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
