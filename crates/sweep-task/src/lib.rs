#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod control;
mod error;
mod reporter;
mod runner;
mod status;
mod task;

#[doc(hidden)]
pub mod prelude;

pub use control::{RunGuard, TaskControl};
pub use error::{LifecycleError, RunError};
pub use reporter::{TaskReporter, TracingReporter};
pub use runner::{TaskHandle, TaskId, TaskRunner, Terminator};
pub use status::TaskStatus;
pub use task::{ProgressSink, Task};

/// Tracing target for task lifecycle events.
pub const TRACING_TARGET: &str = "sweep_task";

/// Tracing target for runner and reporter events.
pub const TRACING_TARGET_RUNNER: &str = "sweep_task::runner";
