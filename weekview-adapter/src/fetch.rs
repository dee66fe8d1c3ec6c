use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::runtime::Handle;
use weekview::{Completion, DataSource, Event, SourceError};

/// A [`DataSource`] that runs an async fetch per day on a tokio runtime.
///
/// Each request spawns `fetch(date)` and delivers its result through the page's completion.
/// A failed fetch is logged and delivered as an empty day. The pager picks deliveries up on
/// the next `apply_completions`.
pub struct AsyncSource<F> {
    handle: Handle,
    fetch: Arc<F>,
    show_empty_while_loading: bool,
}

impl<F, Fut> AsyncSource<F>
where
    F: Fn(NaiveDate) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Event>, SourceError>> + Send + 'static,
{
    pub fn new(handle: Handle, fetch: F) -> Self {
        Self {
            handle,
            fetch: Arc::new(fetch),
            show_empty_while_loading: false,
        }
    }

    /// Uses the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current(fetch: F) -> Self {
        Self::new(Handle::current(), fetch)
    }

    /// Renders days as empty until their fetch completes, instead of leaving them pending.
    pub fn with_show_empty_while_loading(mut self, enabled: bool) -> Self {
        self.show_empty_while_loading = enabled;
        self
    }
}

impl<F, Fut> DataSource for AsyncSource<F>
where
    F: Fn(NaiveDate) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Event>, SourceError>> + Send + 'static,
{
    fn generate_events(
        &self,
        date: NaiveDate,
        completion: Completion<Vec<Event>>,
    ) -> Result<Option<Vec<Event>>, SourceError> {
        let fetch = Arc::clone(&self.fetch);
        self.handle.spawn(async move {
            let events = match fetch(date).await {
                Ok(events) => events,
                Err(err) => {
                    wwarn!(%date, error = %err, "fetch failed; showing an empty day");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                    Vec::new()
                }
            };
            completion.complete(events);
        });
        Ok(self.show_empty_while_loading.then(Vec::new))
    }
}

impl<F> std::fmt::Debug for AsyncSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSource")
            .field("show_empty_while_loading", &self.show_empty_while_loading)
            .finish_non_exhaustive()
    }
}
