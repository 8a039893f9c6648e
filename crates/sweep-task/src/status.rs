//! Task lifecycle states.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Lifecycle state of a task.
///
/// ```text
/// Idle -> Running -> Completed | Failed | Terminated
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not started.
    #[default]
    Idle,
    /// An execution is in flight.
    Running,
    /// The execution ran to its natural end.
    Completed,
    /// The execution aborted with an error.
    Failed,
    /// The execution stopped early after a termination request.
    Terminated,
}

impl TaskStatus {
    /// Returns `true` while an execution is in flight.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns `true` once the execution has settled.
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Terminated)
    }
}
