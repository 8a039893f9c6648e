//! Batch delete errors.
//!
//! Every error raised after the traversal started carries the progress
//! accumulated up to that point, so callers can always show what was
//! deleted and what was not.

use std::fmt;

use strum::{AsRefStr, IntoStaticStr};
use sweep_store::{ErrorClass, StoreError};
use sweep_task::LifecycleError;

use crate::ProgressStatus;

/// Result type for batch delete operations.
pub type BatchDeleteResult<T, E = BatchDeleteError> = Result<T, E>;

/// Classes of objects skipped during a traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipSummary {
    /// At least one object was protected against deletion.
    pub protected: bool,
    /// At least one object version could not be deleted.
    pub version_conflict: bool,
}

impl SkipSummary {
    /// Returns `true` if any object was skipped.
    #[inline]
    pub fn any(&self) -> bool {
        self.protected || self.version_conflict
    }
}

impl fmt::Display for SkipSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.protected, self.version_conflict) {
            (true, true) => f.write_str("protected objects and version conflicts"),
            (true, false) => f.write_str("protected objects"),
            (false, true) => f.write_str("version conflicts"),
            (false, false) => f.write_str("nothing"),
        }
    }
}

/// Errors returned by a [`BatchDeleteTask`](crate::BatchDeleteTask).
#[derive(Debug, thiserror::Error, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BatchDeleteError {
    /// Listing objects failed.
    #[error("listing failed under '{prefix}'")]
    Listing {
        prefix: String,
        #[source]
        source: StoreError,
        progress: Box<ProgressStatus>,
    },

    /// The store became unreachable while deleting.
    #[error("network error while deleting '{key}'")]
    Network {
        key: String,
        #[source]
        source: StoreError,
        progress: Box<ProgressStatus>,
    },

    /// A delete failed for an unclassified reason.
    #[error("failed to delete '{key}': {source}")]
    Delete {
        key: String,
        #[source]
        source: StoreError,
        progress: Box<ProgressStatus>,
    },

    /// The traversal finished but some objects had to be skipped.
    #[error("finished with skipped objects: {skipped}")]
    Incomplete {
        skipped: SkipSummary,
        progress: Box<ProgressStatus>,
    },

    /// The task was already started.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl BatchDeleteError {
    pub(crate) fn listing(
        prefix: impl Into<String>,
        source: StoreError,
        progress: ProgressStatus,
    ) -> Self {
        Self::Listing {
            prefix: prefix.into(),
            source,
            progress: Box::new(progress),
        }
    }

    /// Wraps a fatal delete failure, keeping network errors apart.
    pub(crate) fn delete(
        key: impl Into<String>,
        source: StoreError,
        progress: ProgressStatus,
    ) -> Self {
        let key = key.into();
        let progress = Box::new(progress);
        match source.class() {
            ErrorClass::Network => Self::Network {
                key,
                source,
                progress,
            },
            _ => Self::Delete {
                key,
                source,
                progress,
            },
        }
    }

    pub(crate) fn incomplete(skipped: SkipSummary, progress: ProgressStatus) -> Self {
        Self::Incomplete {
            skipped,
            progress: Box::new(progress),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns the progress accumulated before the error, if the traversal
    /// had started.
    pub fn progress(&self) -> Option<&ProgressStatus> {
        match self {
            Self::Listing { progress, .. }
            | Self::Network { progress, .. }
            | Self::Delete { progress, .. }
            | Self::Incomplete { progress, .. } => Some(progress),
            Self::Lifecycle(_) | Self::Config { .. } => None,
        }
    }

    /// Consumes the error and returns its progress.
    pub fn into_progress(self) -> Option<ProgressStatus> {
        match self {
            Self::Listing { progress, .. }
            | Self::Network { progress, .. }
            | Self::Delete { progress, .. }
            | Self::Incomplete { progress, .. } => Some(*progress),
            Self::Lifecycle(_) | Self::Config { .. } => None,
        }
    }

    /// Returns `true` when every object was processed and some were skipped.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::Incomplete { .. })
    }
}
