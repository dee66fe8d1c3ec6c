use crate::Position;

/// A lightweight, serializable snapshot of the pager's window.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowState {
    pub view_range_start: usize,
    pub views_in_page_count: usize,
    pub load_page_count: usize,
}

/// Extent of the page store at the time of the snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreState {
    pub first_position: Position,
    pub last_position: Position,
    pub materialized: usize,
}

/// A combined snapshot of window, store extent and scroll offset.
///
/// Handy for asserting paging behavior in tests and for debugging overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PagerState {
    pub window: WindowState,
    pub store: StoreState,
    pub scroll_offset: f64,
}
