//! Background expiry of idle sessions.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::store::ConversationStore;

/// Running sweeper task. Dropping the handle leaves the task running; call
/// [`SweepHandle::shutdown`] to stop it.
pub struct SweepHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Spawn a task that sweeps `store` every `every`.
    pub fn spawn(store: Arc<dyn ConversationStore>, every: Duration) -> Self {
        let token = CancellationToken::new();
        let child = token.child_token();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        debug!(removed, "session sweep finished");
                    }
                }
            }
            info!("session sweeper stopped");
        });
        info!(interval_secs = every.as_secs(), "session sweeper started");
        Self { token, task }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel the task and wait for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }
}
