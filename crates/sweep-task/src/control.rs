//! Cooperative cancellation with an awaitable completion signal.

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{LifecycleError, TRACING_TARGET, TaskStatus};

/// Termination flag and lifecycle status of a single task.
///
/// A task embeds one `TaskControl`. Its execution calls [`begin`](Self::begin)
/// and checks [`is_terminated`](Self::is_terminated) at every checkpoint;
/// callers use [`terminate`](Self::terminate), which cancels the token right
/// away and then waits on the status channel until the execution settles.
#[derive(Debug)]
pub struct TaskControl {
    cancel_token: CancellationToken,
    status: watch::Sender<TaskStatus>,
}

impl Default for TaskControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskControl {
    /// Creates a control in the [`TaskStatus::Idle`] state.
    pub fn new() -> Self {
        let (status, _) = watch::channel(TaskStatus::Idle);
        Self {
            cancel_token: CancellationToken::new(),
            status,
        }
    }

    /// Returns the current lifecycle state.
    pub fn status(&self) -> TaskStatus {
        *self.status.borrow()
    }

    /// Returns `true` once termination has been requested.
    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Moves the task from `Idle` to `Running`.
    ///
    /// The returned guard must be settled with the final state; dropping it
    /// unsettled marks the execution as [`TaskStatus::Failed`].
    pub fn begin(&self) -> Result<RunGuard<'_>, LifecycleError> {
        let mut previous = TaskStatus::Idle;
        let started = self.status.send_if_modified(|status| {
            previous = *status;
            if *status == TaskStatus::Idle {
                *status = TaskStatus::Running;
                true
            } else {
                false
            }
        });

        if !started {
            return Err(LifecycleError::new(previous));
        }

        tracing::trace!(target: TRACING_TARGET, "Task execution started");
        Ok(RunGuard {
            control: self,
            settled: false,
        })
    }

    /// Requests termination and waits until no execution is in flight.
    ///
    /// Resolves immediately when the task is idle or already settled, so
    /// repeated calls are harmless.
    pub async fn terminate(&self) {
        if !self.cancel_token.is_cancelled() {
            tracing::debug!(
                target: TRACING_TARGET,
                status = %self.status(),
                "Termination requested"
            );
            self.cancel_token.cancel();
        }

        let mut receiver = self.status.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|status| !status.is_running()).await;
    }

    fn settle(&self, status: TaskStatus) {
        self.status.send_replace(status);
        tracing::trace!(target: TRACING_TARGET, status = %status, "Task execution settled");
    }
}

/// Marks one in-flight execution of a task.
#[must_use = "an unsettled guard marks the execution as failed when dropped"]
#[derive(Debug)]
pub struct RunGuard<'a> {
    control: &'a TaskControl,
    settled: bool,
}

impl RunGuard<'_> {
    /// Publishes the final state and wakes every pending `terminate` call.
    pub fn settle(mut self, status: TaskStatus) {
        self.settled = true;
        self.control.settle(status);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(
                target: TRACING_TARGET,
                "Task execution dropped before settling"
            );
            self.control.settle(TaskStatus::Failed);
        }
    }
}
