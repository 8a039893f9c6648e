//! Holds store calls in flight until a test releases them.

use std::sync::Arc;

use sweep_store::{StoreError, StoreResult};
use tokio::sync::{Notify, Semaphore};

/// Gate the gated calls of a [`MockRemoteStore`](crate::MockRemoteStore)
/// must pass through.
///
/// A call announces itself through [`wait_started`](Self::wait_started) and
/// then blocks until [`release`](Self::release) hands it a permit.
#[derive(Debug, Clone)]
pub struct CallGate {
    started: Arc<Notify>,
    permits: Arc<Semaphore>,
}

impl CallGate {
    pub(crate) fn new() -> Self {
        Self {
            started: Arc::new(Notify::new()),
            permits: Arc::new(Semaphore::new(0)),
        }
    }

    /// Waits until a call reaches the gate.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Lets `count` calls through.
    pub fn release(&self, count: usize) {
        self.permits.add_permits(count);
    }

    /// Opens the gate for good.
    pub fn open(&self) {
        self.permits.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    pub(crate) async fn pass(&self) -> StoreResult<()> {
        self.started.notify_one();
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| StoreError::other("call gate closed").with_source(e))?;
        permit.forget();
        Ok(())
    }
}
