use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

use crate::configs::StateStore;

/// Periodically writes the state store to disk.
pub struct SnapshotService {
    store: StateStore,
    period: Duration,
}

impl SnapshotService {
    pub fn new(store: StateStore, period: Duration) -> Self {
        Self { store, period }
    }

    /// Starts flushing every period, first after one full period.
    ///
    /// Abort the handle to stop; a flush in progress finishes first since it
    /// never yields.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + self.period, self.period);

            loop {
                interval.tick().await;

                match self.store.flush() {
                    Ok(()) => tracing::debug!("states flushed"),
                    Err(e) => tracing::error!("Failed to flush states: {}", e),
                }
            }
        })
    }
}
