//! Progress snapshot recorder.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Collects every progress snapshot handed to its sinks.
#[derive(Debug)]
pub struct ProgressRecorder<P> {
    snapshots: Arc<Mutex<Vec<P>>>,
}

impl<P> Default for ProgressRecorder<P> {
    fn default() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<P> Clone for ProgressRecorder<P> {
    fn clone(&self) -> Self {
        Self {
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<P: Clone + Send + 'static> ProgressRecorder<P> {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a sink closure that appends to this recorder.
    pub fn sink(&self) -> impl FnMut(P) + Send + 'static {
        let snapshots = self.snapshots.clone();
        move |progress| lock(&snapshots).push(progress)
    }

    /// Returns every recorded snapshot in report order.
    pub fn snapshots(&self) -> Vec<P> {
        lock(&self.snapshots).clone()
    }

    /// Returns the first recorded snapshot.
    pub fn first(&self) -> Option<P> {
        lock(&self.snapshots).first().cloned()
    }

    /// Returns the most recent snapshot.
    pub fn last(&self) -> Option<P> {
        lock(&self.snapshots).last().cloned()
    }

    /// Returns the number of recorded snapshots.
    pub fn len(&self) -> usize {
        lock(&self.snapshots).len()
    }

    /// Returns `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        lock(&self.snapshots).is_empty()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
