//! Prelude module for convenient imports.

pub use crate::control::{RunGuard, TaskControl};
pub use crate::error::{LifecycleError, RunError};
pub use crate::reporter::{TaskReporter, TracingReporter};
pub use crate::runner::{TaskHandle, TaskId, TaskRunner, Terminator};
pub use crate::status::TaskStatus;
pub use crate::task::{ProgressSink, Task};
