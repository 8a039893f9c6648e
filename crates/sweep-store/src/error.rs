//! Store error types.

use strum::{AsRefStr, IntoStaticStr};

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// How a failed store call should be treated by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorClass {
    /// The object is under a write or lifecycle protection (retention lock).
    Protected,
    /// The targeted version cannot be deleted with this operation.
    VersionConflict,
    /// The store could not be reached.
    Network,
    /// Anything else.
    Other,
}

/// Errors returned by a [`RemoteStore`](crate::RemoteStore).
///
/// Adapters classify backend failures into these variants; callers only
/// match on them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object is protected against deletion (e.g. a WORM retention lock).
    #[error("protected: {reason}")]
    Protected {
        /// Human-readable protection reason.
        reason: String,
        /// Backend error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// The object version is not eligible for deletion by this operation.
    #[error("version conflict: {reason}")]
    VersionConflict {
        /// Human-readable conflict reason.
        reason: String,
        /// Backend error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// Connectivity-level failure.
    #[error("network error: {source}")]
    Network {
        /// Underlying transport error.
        #[source]
        source: BoxedError,
    },

    /// The container is unknown to this store.
    #[error("container not found: {container}")]
    ContainerNotFound {
        /// Requested container name.
        container: String,
    },

    /// The store does not support the requested operation.
    #[error("unsupported operation: {operation}")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// Invalid continuation marker.
    #[error("invalid marker: {0}")]
    InvalidMarker(String),

    /// Any other backend failure.
    #[error("{message}")]
    Other {
        /// Backend error message.
        message: String,
        /// Backend error, if any.
        #[source]
        source: Option<BoxedError>,
    },
}

impl StoreError {
    /// Creates a new protection error.
    pub fn protected(reason: impl Into<String>) -> Self {
        Self::Protected {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a new version conflict error.
    pub fn version_conflict(reason: impl Into<String>) -> Self {
        Self::VersionConflict {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a new network error.
    pub fn network(source: impl Into<BoxedError>) -> Self {
        Self::Network {
            source: source.into(),
        }
    }

    /// Creates a new container not found error.
    pub fn container_not_found(container: impl Into<String>) -> Self {
        Self::ContainerNotFound {
            container: container.into(),
        }
    }

    /// Creates a new unsupported operation error.
    pub fn unsupported(operation: &'static str) -> Self {
        Self::Unsupported { operation }
    }

    /// Creates a new invalid marker error.
    pub fn invalid_marker(msg: impl Into<String>) -> Self {
        Self::InvalidMarker(msg.into())
    }

    /// Creates a new unclassified error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a backend error to the variants that carry an optional source.
    pub fn with_source(mut self, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        match &mut self {
            Self::Protected { source, .. }
            | Self::VersionConflict { source, .. }
            | Self::Other { source, .. } => *source = Some(Box::new(err)),
            _ => {}
        }
        self
    }

    /// Returns the handling class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Protected { .. } => ErrorClass::Protected,
            Self::VersionConflict { .. } => ErrorClass::VersionConflict,
            Self::Network { .. } => ErrorClass::Network,
            Self::ContainerNotFound { .. }
            | Self::Unsupported { .. }
            | Self::InvalidMarker(_)
            | Self::Other { .. } => ErrorClass::Other,
        }
    }
}
