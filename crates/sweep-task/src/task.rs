//! The cancellable task contract.

use std::future::Future;

use crate::TaskStatus;

/// Receives progress snapshots from a running task.
///
/// Implemented for every `FnMut(P) + Send` closure, so callers usually pass a
/// closure directly.
pub trait ProgressSink<P>: Send {
    /// Called with a fresh snapshot after every observable change.
    fn report(&mut self, progress: P);
}

impl<P, F> ProgressSink<P> for F
where
    F: FnMut(P) + Send,
{
    #[inline]
    fn report(&mut self, progress: P) {
        self(progress)
    }
}

/// A unit of long-running work that reports progress and can be terminated.
///
/// # Example
///
/// ```ignore
/// let task = Arc::new(MyTask::new(...));
///
/// let (result, ()) = tokio::join!(
///     task.process(|progress| println!("{progress:?}")),
///     async { task.terminate().await },
/// );
/// ```
pub trait Task: Send + Sync + 'static {
    /// Snapshot type handed to the progress sink.
    type Progress: Clone + Send + Sync + 'static;

    /// Value returned on normal completion.
    type Output: Send + 'static;

    /// Error returned when the task cannot complete.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Human-readable name used in logs.
    const TASK_NAME: &'static str;

    /// Starts the task.
    ///
    /// Implementations report the initial progress before doing any work and
    /// again after every observable change.
    fn process<S>(
        &self,
        sink: S,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send
    where
        S: ProgressSink<Self::Progress>;

    /// Requests cooperative cancellation.
    ///
    /// Resolves once the in-flight unit of work has settled and its progress
    /// has been reported. Calling it repeatedly, or after the task finished,
    /// resolves immediately.
    fn terminate(&self) -> impl Future<Output = ()> + Send;

    /// Returns the current lifecycle state.
    fn status(&self) -> TaskStatus;
}
