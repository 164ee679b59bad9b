use super::watchlist::tick_all;
use crate::models::FundQuote;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Watchlist shared between a monitor session and its ticker
pub type SharedWatchlist = Arc<RwLock<Vec<FundQuote>>>;

/// Owned handle to the periodic quote mutator.
///
/// The task runs until `stop()` is awaited or the handle is dropped.
/// Once `stop()` returns the task has exited and the watchlist is no
/// longer touched. Dropping the handle aborts the task.
pub struct TickerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<u64>>,
}

impl TickerHandle {
    /// Spawn a ticker on the current tokio runtime.
    /// The first tick fires one full period after spawning.
    pub fn spawn(watchlist: SharedWatchlist, period: Duration, rng: StdRng) -> Self {
        // tokio intervals panic on a zero period
        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_ticker(watchlist, period, rng, shutdown_rx));

        tracing::info!(period_ms = period.as_millis() as u64, "Ticker started");

        Self {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Stop the ticker and wait for its task to exit.
    /// Returns the number of ticks applied.
    pub async fn stop(mut self) -> u64 {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        let Some(task) = self.task.take() else {
            return 0;
        };

        match task.await {
            Ok(ticks) => {
                tracing::info!(ticks, "Ticker stopped");
                ticks
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ticker task ended abnormally");
                0
            }
        }
    }
}

impl Drop for TickerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Ticker aborted on drop");
        }
    }
}

async fn run_ticker(
    watchlist: SharedWatchlist,
    period: Duration,
    mut rng: StdRng,
    mut shutdown: oneshot::Receiver<()>,
) -> u64 {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = 0u64;

    loop {
        tokio::select! {
            biased;

            // Fires on stop() and when the sender is dropped
            _ = &mut shutdown => break,

            _ = interval.tick() => {
                let mut quotes = watchlist.write().await;
                tick_all(quotes.as_mut_slice(), &mut rng);
                ticks += 1;
                tracing::trace!(ticks, funds = quotes.len(), "Applied tick");
            }
        }
    }

    ticks
}
