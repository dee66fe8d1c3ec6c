//! Position-keyed delivery of page content that resolves after the page was requested.
//!
//! A [`Completion`] is handed to the content source together with every page request. It can
//! be cloned, moved to another thread and fired any number of times. Deliveries queue up in
//! the [`ContentInbox`] owned by the pager and are only applied when the owner drains them,
//! so all store mutation stays on the owning thread.

use std::fmt;
use std::sync::mpsc;

use crate::Position;

pub(crate) struct Delivery<C> {
    pub(crate) position: Position,
    pub(crate) epoch: u64,
    pub(crate) content: C,
}

/// Callback channel for one page request.
///
/// The latest delivery wins: each call replaces whatever content the page showed before,
/// including a synchronous result returned alongside the request.
pub struct Completion<C> {
    position: Position,
    epoch: u64,
    tx: mpsc::Sender<Delivery<C>>,
}

impl<C> Clone for Completion<C> {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            epoch: self.epoch,
            tx: self.tx.clone(),
        }
    }
}

impl<C> fmt::Debug for Completion<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("position", &self.position)
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<C> Completion<C> {
    pub fn position(&self) -> Position {
        self.position
    }

    /// Queues `content` for the page this completion was issued for.
    ///
    /// Returns `false` when the receiving pager no longer exists. A delivery for a page that
    /// was discarded by a reset is accepted here and dropped when drained.
    pub fn complete(&self, content: C) -> bool {
        self.tx
            .send(Delivery {
                position: self.position,
                epoch: self.epoch,
                content,
            })
            .is_ok()
    }
}

/// The receiving end of every [`Completion`] issued by one pager.
pub struct ContentInbox<C> {
    tx: mpsc::Sender<Delivery<C>>,
    rx: mpsc::Receiver<Delivery<C>>,
    epoch: u64,
}

impl<C> Default for ContentInbox<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ContentInbox<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentInbox")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl<C> ContentInbox<C> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, epoch: 0 }
    }

    pub fn completion_for(&self, position: Position) -> Completion<C> {
        Completion {
            position,
            epoch: self.epoch,
            tx: self.tx.clone(),
        }
    }

    /// Invalidates every completion issued so far.
    pub fn advance_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Next queued delivery, in the order the completions fired.
    pub(crate) fn try_next(&self) -> Option<Delivery<C>> {
        self.rx.try_recv().ok()
    }
}

/// What happened to a single drained delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Merged into the page record. `visible` tells whether the page is in the loaded window.
    Applied { position: Position, visible: bool },
    /// Issued before a reset, or for a position the store does not track. Dropped.
    Stale { position: Position },
}

/// Totals for one [`crate::Pager::apply_completions`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub applied: usize,
    pub visible: usize,
    pub stale: usize,
}

impl DrainSummary {
    pub(crate) fn record(&mut self, outcome: DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Applied { visible, .. } => {
                self.applied += 1;
                if visible {
                    self.visible += 1;
                }
            }
            DeliveryOutcome::Stale { .. } => self.stale += 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.applied == 0 && self.stale == 0
    }
}
