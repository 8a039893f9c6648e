//! Task error types.

use tokio::task::JoinError;

use crate::TaskStatus;

/// Returned when a task is asked to start outside of the [`TaskStatus::Idle`] state.
///
/// Tasks execute at most once; a second `process` call, concurrent or not,
/// is rejected with this error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("task cannot start while {status}")]
pub struct LifecycleError {
    /// The state the task was in when the start was attempted.
    pub status: TaskStatus,
}

impl LifecycleError {
    /// Creates a new lifecycle error for the given state.
    pub fn new(status: TaskStatus) -> Self {
        Self { status }
    }
}

/// Error returned when waiting on a spawned task.
#[derive(Debug, thiserror::Error)]
pub enum RunError<E>
where
    E: std::error::Error + 'static,
{
    /// The task itself returned an error.
    #[error(transparent)]
    Task(E),

    /// The spawned execution panicked or was aborted.
    #[error("task execution did not finish: {0}")]
    Join(#[from] JoinError),
}

impl<E> RunError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the task error, if the task itself failed.
    pub fn task_error(&self) -> Option<&E> {
        match self {
            Self::Task(err) => Some(err),
            Self::Join(_) => None,
        }
    }

    /// Consumes the error and returns the task error, if any.
    pub fn into_task_error(self) -> Option<E> {
        match self {
            Self::Task(err) => Some(err),
            Self::Join(_) => None,
        }
    }
}
