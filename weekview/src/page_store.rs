use std::collections::VecDeque;
use std::ops::RangeInclusive;

use crate::bridge::{Completion, ContentInbox};
use crate::{Axis, Position, Rect, Size, SourceError};

/// Page size and spacing shared by every page; only the position varies the placement.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageGeometry {
    pub axis: Axis,
    pub page_size: Size,
    pub spacer: f64,
}

impl PageGeometry {
    /// Page extent plus the spacer that follows it.
    pub fn stride(&self) -> f64 {
        self.page_size.main(self.axis) + self.spacer
    }

    /// Origin of the page at `index` pages from some anchor, along the paging axis.
    pub fn main_offset(&self, index: i64) -> f64 {
        index as f64 * self.stride()
    }

    /// Bounds of a page `index` pages after the anchor.
    pub fn bounds_at(&self, index: i64) -> Rect {
        let main = self.main_offset(index);
        match self.axis {
            Axis::Horizontal => Rect::new(
                main,
                0.0,
                self.page_size.width,
                self.page_size.height,
            ),
            Axis::Vertical => Rect::new(
                0.0,
                main,
                self.page_size.width,
                self.page_size.height,
            ),
        }
    }

    /// Page-local bounds (origin at zero).
    pub fn local_bounds(&self) -> Rect {
        Rect::from_origin_size(crate::Point::ZERO, self.page_size)
    }
}

/// What a content source is asked to fill.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRequest {
    pub position: Position,
    /// Canonical bounds of the page (position 0 at the origin).
    pub bounds: Rect,
}

/// Produces page content, immediately and/or later through the [`Completion`].
///
/// `Ok(Some(content))` renders right away. `Ok(None)` leaves the page pending until the
/// completion fires. `Err(_)` renders the page as empty (`C::default()`).
pub trait PageSource<C> {
    fn fill_page(
        &mut self,
        request: PageRequest,
        completion: Completion<C>,
    ) -> Result<Option<C>, SourceError>;
}

impl<C, F> PageSource<C> for F
where
    F: FnMut(PageRequest, Completion<C>) -> Result<Option<C>, SourceError>,
{
    fn fill_page(
        &mut self,
        request: PageRequest,
        completion: Completion<C>,
    ) -> Result<Option<C>, SourceError> {
        self(request, completion)
    }
}

/// The canonical record of one page. Never destroyed while the store lives.
#[derive(Clone, Debug)]
pub struct PageRecord<C> {
    position: Position,
    bounds: Rect,
    content: Option<C>,
    revision: u64,
}

impl<C> PageRecord<C> {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn content(&self) -> Option<&C> {
        self.content.as_ref()
    }

    /// Whether content has been delivered, synchronously or not.
    pub fn is_done(&self) -> bool {
        self.content.is_some()
    }

    /// Number of content writes so far. Bumps on every delivery.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn write(&mut self, content: C) {
        self.content = Some(content);
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Sparse, position-keyed collection of page records.
///
/// Records live in an append-only arena; `order` maps ordinals (0 = lowest position) to arena
/// slots, so prepending never moves a record and the ordered view stays sorted by position.
/// Positions are contiguous: creating a range that does not touch the stored one also
/// materializes the gap between them.
#[derive(Clone, Debug)]
pub struct PageStore<C> {
    geometry: PageGeometry,
    arena: Vec<PageRecord<C>>,
    order: VecDeque<usize>,
    first: Position,
}

impl<C: Default> PageStore<C> {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            arena: Vec::new(),
            order: VecDeque::new(),
            first: 0,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn first_position(&self) -> Option<Position> {
        (!self.is_empty()).then_some(self.first)
    }

    pub fn last_position(&self) -> Option<Position> {
        (!self.is_empty()).then(|| self.first + self.order.len() as i64 - 1)
    }

    pub fn positions(&self) -> Option<RangeInclusive<Position>> {
        Some(self.first_position()?..=self.last_position()?)
    }

    pub fn contains(&self, position: Position) -> bool {
        self.ordinal_of(position).is_some()
    }

    /// Ordinal (rank in position order) of `position`.
    pub fn ordinal_of(&self, position: Position) -> Option<usize> {
        let ordinal = usize::try_from(position.checked_sub(self.first)?).ok()?;
        (ordinal < self.order.len()).then_some(ordinal)
    }

    /// O(1) lookup by position.
    pub fn record_at(&self, position: Position) -> Option<&PageRecord<C>> {
        let ordinal = self.ordinal_of(position)?;
        self.at_ordinal(ordinal)
    }

    pub fn at_ordinal(&self, ordinal: usize) -> Option<&PageRecord<C>> {
        let slot = *self.order.get(ordinal)?;
        self.arena.get(slot)
    }

    /// Records in ascending position order.
    pub fn iter(&self) -> impl Iterator<Item = &PageRecord<C>> {
        self.order.iter().filter_map(|&slot| self.arena.get(slot))
    }

    /// Materializes every missing position in `from..=to`.
    ///
    /// Positions already present are left untouched (no re-fetch). Returns the smallest range
    /// covering the newly created positions, if any.
    pub fn create_pages(
        &mut self,
        from: Position,
        to: Position,
        source: &mut impl PageSource<C>,
        inbox: &ContentInbox<C>,
    ) -> Option<RangeInclusive<Position>> {
        if from > to {
            return None;
        }

        let Some((first, last)) = self.first_position().zip(self.last_position()) else {
            for position in from..=to {
                self.push_back(position, source, inbox);
            }
            return Some(from..=to);
        };

        let mut created: Option<(Position, Position)> = None;
        let mut note = |p: Position| {
            created = Some(match created {
                None => (p, p),
                Some((lo, hi)) => (lo.min(p), hi.max(p)),
            });
        };

        if to > last {
            for position in (last + 1)..=to {
                self.push_back(position, source, inbox);
                note(position);
            }
        }
        if from < first {
            for position in (from..first).rev() {
                self.push_front(position, source, inbox);
                note(position);
            }
        }

        created.map(|(lo, hi)| lo..=hi)
    }

    /// Writes delivered content into the record at `position`, replacing earlier content.
    ///
    /// Returns `false` when the position is not tracked.
    pub fn deliver(&mut self, position: Position, content: C) -> bool {
        let Some(slot) = self
            .ordinal_of(position)
            .and_then(|ordinal| self.order.get(ordinal).copied())
        else {
            return false;
        };
        match self.arena.get_mut(slot) {
            Some(record) => {
                record.write(content);
                true
            }
            None => false,
        }
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.order.clear();
        self.first = 0;
    }

    fn push_back(
        &mut self,
        position: Position,
        source: &mut impl PageSource<C>,
        inbox: &ContentInbox<C>,
    ) {
        if self.is_empty() {
            self.first = position;
        }
        let record = self.request(position, source, inbox);
        self.order.push_back(self.arena.len());
        self.arena.push(record);
    }

    fn push_front(
        &mut self,
        position: Position,
        source: &mut impl PageSource<C>,
        inbox: &ContentInbox<C>,
    ) {
        let record = self.request(position, source, inbox);
        self.order.push_front(self.arena.len());
        self.arena.push(record);
        self.first = position;
    }

    fn request(
        &self,
        position: Position,
        source: &mut impl PageSource<C>,
        inbox: &ContentInbox<C>,
    ) -> PageRecord<C> {
        let bounds = self.geometry.bounds_at(position);
        let request = PageRequest { position, bounds };
        let mut record = PageRecord {
            position,
            bounds,
            content: None,
            revision: 0,
        };
        match source.fill_page(request, inbox.completion_for(position)) {
            Ok(Some(content)) => record.write(content),
            Ok(None) => {}
            Err(err) => {
                wwarn!(position, error = %err, "page source failed; rendering empty page");
                #[cfg(not(feature = "tracing"))]
                let _ = err;
                record.write(C::default());
            }
        }
        record
    }
}
