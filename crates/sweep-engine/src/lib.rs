#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod batch_delete;
mod config;
mod error;
mod ignore;
mod progress;
mod state;
mod target;

#[doc(hidden)]
pub mod prelude;

pub use batch_delete::BatchDeleteTask;
pub use config::{BatchDeleteConfig, DEFAULT_PAGE_LIMIT};
pub use error::{BatchDeleteError, BatchDeleteResult, SkipSummary};
pub use ignore::IgnoreSet;
pub use progress::{DeleteRecord, ProgressStatus, RecordStatus};
pub use target::{DeleteTarget, TargetKind};

/// Tracing target for batch delete events.
pub const TRACING_TARGET: &str = "sweep_engine";
