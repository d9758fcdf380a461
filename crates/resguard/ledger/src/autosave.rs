//! Periodic background saves.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::ResourceLedger;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handle to a running autosave loop.
///
/// The loop saves the ledger's current state every `period`. Saves run on the
/// blocking pool because stores do synchronous I/O under the ledger lock.
/// Dropping the handle stops the loop without a final save.
pub struct AutosaveTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    ledger: Arc<ResourceLedger>,
}

impl AutosaveTask {
    /// Starts saving `ledger` every `period`. The first save happens one
    /// period after spawning. Must be called inside a tokio runtime.
    pub fn spawn(ledger: Arc<ResourceLedger>, period: Duration) -> Self {
        let (stop, mut stop_rx) = oneshot::channel();
        let task_ledger = Arc::clone(&ledger);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        match save_blocking(Arc::clone(&task_ledger)).await {
                            Ok(saved_at) => tracing::debug!(%saved_at, "autosave complete"),
                            Err(e) => tracing::error!(error = %e, "autosave failed"),
                        }
                    }
                }
            }
            tracing::debug!("autosave loop stopped");
        });

        tracing::info!(period_secs = period.as_secs_f64(), "autosave started");
        Self {
            stop,
            handle,
            ledger,
        }
    }

    /// Starts saving at the ledger's configured interval.
    pub fn from_config(ledger: Arc<ResourceLedger>) -> Self {
        let period = ledger.config().autosave_interval();
        Self::spawn(ledger, period)
    }

    /// Stops the loop, waits for it to exit, then performs a final save.
    pub async fn shutdown(self) -> LedgerResult<DateTime<Utc>> {
        let Self {
            stop,
            handle,
            ledger,
        } = self;

        // The loop may already have exited; nothing to signal then.
        let _ = stop.send(());
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "autosave loop ended abnormally");
        }

        let saved_at = save_blocking(ledger).await?;
        tracing::info!(%saved_at, "final save on shutdown");
        Ok(saved_at)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn save_blocking(ledger: Arc<ResourceLedger>) -> LedgerResult<DateTime<Utc>> {
    tokio::task::spawn_blocking(move || ledger.save_state(None))
        .await
        .map_err(|e| LedgerError::Store(StoreError::Backend(format!("save task failed: {e}"))))?
}
