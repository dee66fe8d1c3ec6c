use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use weekview::{Clock, DataSource, Delegate, NowLine, Styler, WeekView};

/// A periodic task publishing the current time for the now-line.
///
/// The task samples `clock` every `interval` and publishes through a `watch` channel, so the
/// owner only ever sees the latest value and never blocks on it. Stopping (or dropping) the
/// ticker cancels the task.
#[derive(Debug)]
pub struct NowLineTicker {
    token: CancellationToken,
    now: watch::Receiver<NaiveDateTime>,
    task: JoinHandle<()>,
}

impl NowLineTicker {
    /// Spawns the ticker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like `tokio::spawn`.
    pub fn spawn<C>(clock: C, interval: Duration) -> Self
    where
        C: Clock + Send + 'static,
    {
        let (tx, now) = watch::channel(clock.now());
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticks = time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the initial value is already published.
            ticks.tick().await;
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticks.tick() => {
                        if tx.send(clock.now()).is_err() {
                            break;
                        }
                    }
                }
            }
            wdebug!("now-line ticker stopped");
        });
        wdebug!(interval_ms = period.as_millis() as u64, "now-line ticker started");

        Self { token, now, task }
    }

    /// The most recently published time.
    pub fn latest(&self) -> NaiveDateTime {
        *self.now.borrow()
    }

    /// Whether a time was published since the last [`Self::mark_seen`].
    pub fn has_changed(&self) -> bool {
        self.now.has_changed().unwrap_or(false)
    }

    /// Returns the latest time and marks it as seen.
    pub fn mark_seen(&mut self) -> NaiveDateTime {
        *self.now.borrow_and_update()
    }

    /// Waits for the next published time. Returns `None` once the ticker has stopped.
    pub async fn changed(&mut self) -> Option<NaiveDateTime> {
        self.now.changed().await.ok()?;
        Some(*self.now.borrow_and_update())
    }

    pub fn subscribe(&self) -> watch::Receiver<NaiveDateTime> {
        self.now.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }
}

impl Drop for NowLineTicker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Ties a [`NowLineTicker`] to an enabled flag.
///
/// Enabling spawns a ticker, disabling stops it; toggling repeatedly never leaves more than
/// one task running.
#[derive(Debug)]
pub struct NowLineUpdater<C> {
    clock: C,
    interval: Duration,
    ticker: Option<NowLineTicker>,
}

impl<C> NowLineUpdater<C>
where
    C: Clock + Clone + Send + 'static,
{
    /// A disabled updater.
    pub fn new(clock: C, interval: Duration) -> Self {
        Self {
            clock,
            interval,
            ticker: None,
        }
    }

    /// An updater following the view's now-line settings.
    ///
    /// Must be called inside a tokio runtime when the view has the now-line enabled.
    pub fn for_view<D, S, G>(clock: C, view: &WeekView<D, S, G>) -> Self
    where
        D: DataSource,
        S: Styler,
        G: Delegate,
    {
        let mut updater = Self::new(clock, view.options().now_line_interval);
        updater.set_enabled(view.now_line_enabled());
        updater
    }

    pub fn is_enabled(&self) -> bool {
        self.ticker.is_some()
    }

    /// Starts or stops the ticker. Starting requires a tokio runtime.
    pub fn set_enabled(&mut self, enabled: bool) {
        match (enabled, self.ticker.take()) {
            (true, Some(ticker)) => self.ticker = Some(ticker),
            (true, None) => {
                self.ticker = Some(NowLineTicker::spawn(self.clock.clone(), self.interval));
            }
            (false, Some(ticker)) => ticker.stop(),
            (false, None) => {}
        }
    }

    pub fn ticker(&self) -> Option<&NowLineTicker> {
        self.ticker.as_ref()
    }

    /// The now-line, if the ticker published a new time since the last poll.
    ///
    /// Returns `None` when nothing changed, so the host can keep the line it already drew.
    pub fn poll<D, S, G>(&mut self, view: &WeekView<D, S, G>) -> Option<NowLine>
    where
        D: DataSource,
        S: Styler,
        G: Delegate,
    {
        let ticker = self.ticker.as_mut()?;
        if !ticker.has_changed() {
            return None;
        }
        view.now_line(ticker.mark_seen())
    }

    /// The now-line for the latest published time, changed or not.
    pub fn current<D, S, G>(&self, view: &WeekView<D, S, G>) -> Option<NowLine>
    where
        D: DataSource,
        S: Styler,
        G: Delegate,
    {
        view.now_line(self.ticker.as_ref()?.latest())
    }
}
