//! Sinks for task lifecycle events.

use std::fmt;

use serde_json::Value;

use crate::{TRACING_TARGET_RUNNER, Task, TaskId, TaskStatus};

/// Receives lifecycle events from a [`TaskRunner`](crate::TaskRunner).
///
/// This is the boundary towards whatever keeps the task list for display
/// (a UI, a registry, a log). Implementations must not block.
pub trait TaskReporter<T: Task>: Send + Sync + 'static {
    /// Called once before the task starts, with the caller-supplied display data.
    fn task_started(&self, _id: TaskId, _extra: &Value) {}

    /// Called with every progress snapshot.
    fn progress_changed(&self, id: TaskId, progress: &T::Progress);

    /// Called once with the final state and the task outcome.
    fn task_settled(&self, id: TaskId, status: TaskStatus, outcome: &Result<T::Output, T::Error>);
}

/// Reporter that writes lifecycle events to [`tracing`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl<T> TaskReporter<T> for TracingReporter
where
    T: Task,
    T::Progress: fmt::Debug,
    T::Output: fmt::Debug,
{
    fn task_started(&self, id: TaskId, extra: &Value) {
        tracing::info!(
            target: TRACING_TARGET_RUNNER,
            task_id = %id,
            task = T::TASK_NAME,
            extra = %extra,
            "Task started"
        );
    }

    fn progress_changed(&self, id: TaskId, progress: &T::Progress) {
        tracing::debug!(
            target: TRACING_TARGET_RUNNER,
            task_id = %id,
            progress = ?progress,
            "Task progress"
        );
    }

    fn task_settled(&self, id: TaskId, status: TaskStatus, outcome: &Result<T::Output, T::Error>) {
        match outcome {
            Ok(output) => {
                tracing::info!(
                    target: TRACING_TARGET_RUNNER,
                    task_id = %id,
                    task = T::TASK_NAME,
                    status = %status,
                    "Task finished"
                );
                tracing::debug!(
                    target: TRACING_TARGET_RUNNER,
                    task_id = %id,
                    output = ?output,
                    "Task output"
                );
            }
            Err(err) => tracing::error!(
                target: TRACING_TARGET_RUNNER,
                task_id = %id,
                task = T::TASK_NAME,
                status = %status,
                error = %err,
                "Task failed"
            ),
        }
    }
}
