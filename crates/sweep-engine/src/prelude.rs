//! Prelude module for convenient imports.

pub use crate::batch_delete::BatchDeleteTask;
pub use crate::config::BatchDeleteConfig;
pub use crate::error::{BatchDeleteError, BatchDeleteResult, SkipSummary};
pub use crate::progress::{DeleteRecord, ProgressStatus, RecordStatus};
pub use crate::target::{DeleteTarget, TargetKind};
