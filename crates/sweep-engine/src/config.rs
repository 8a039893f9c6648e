//! Batch delete configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{BatchDeleteError, BatchDeleteResult};

/// Default number of objects requested per listing.
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

/// Configuration for a [`BatchDeleteTask`](crate::BatchDeleteTask).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
pub struct BatchDeleteConfig {
    /// Objects requested per listing, before skipped objects are added.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SWEEP_PAGE_LIMIT", default_value_t = DEFAULT_PAGE_LIMIT)
    )]
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Delete every stored version of each object explicitly.
    #[cfg_attr(feature = "config", arg(long, env = "SWEEP_VERSIONED"))]
    #[serde(default)]
    pub versioned: bool,
}

fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for BatchDeleteConfig {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            versioned: false,
        }
    }
}

impl BatchDeleteConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page limit.
    pub fn with_page_limit(mut self, page_limit: usize) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Enables or disables versioned deletion.
    pub fn with_versioned(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }

    /// Rejects a zero page limit.
    pub fn validate(&self) -> BatchDeleteResult<()> {
        if self.page_limit == 0 {
            return Err(BatchDeleteError::config("page limit must be greater than zero"));
        }
        Ok(())
    }
}
