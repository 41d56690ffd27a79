//! Background garbage-collection loop.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::manager::SessionManager;

/// Handle to a running GC loop.
///
/// Dropping the handle leaves the loop running; call
/// [`shutdown`](Self::shutdown) to stop it.
#[derive(Debug)]
pub struct GcHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl GcHandle {
    /// Token that stops the loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "GC loop terminated abnormally");
        }
    }
}

/// Spawn a task that sweeps `manager` at its configured interval until cancelled.
///
/// The interval comes from the manager's validated config, so it is never zero.
/// The first sweep runs immediately. Must be called within a tokio runtime.
pub(crate) fn spawn_gc_loop(manager: Arc<SessionManager>) -> GcHandle {
    let interval = manager.config().gc_interval;
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(?interval, "GC loop started");

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = manager.gc();
                    trace!(evicted, live = manager.provider().len(), "GC sweep complete");
                }
            }
        }

        debug!("GC loop stopped");
    });

    GcHandle { cancel, task }
}
