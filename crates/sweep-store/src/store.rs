//! The remote object store contract.

use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::types::{ListedObject, Marker};

/// Listing request for one page of objects under a prefix.
#[derive(Debug, Clone, Copy)]
pub struct ListRequest<'a> {
    /// Container (bucket) to list.
    pub container: &'a str,
    /// Key prefix; every returned key starts with it.
    pub prefix: &'a str,
    /// Maximum number of items in the page.
    pub limit: usize,
    /// Resume after this marker; `None` lists from the beginning.
    pub marker: Option<&'a Marker>,
    /// List every stored version instead of the latest ones.
    pub versioned: bool,
}

impl<'a> ListRequest<'a> {
    /// Creates a request for the first page under `prefix`.
    pub fn new(container: &'a str, prefix: &'a str, limit: usize) -> Self {
        Self {
            container,
            prefix,
            limit,
            marker: None,
            versioned: false,
        }
    }

    /// Resumes listing after `marker`.
    pub fn with_marker(mut self, marker: Option<&'a Marker>) -> Self {
        self.marker = marker;
        self
    }

    /// Enables multi-version listing.
    pub fn with_versions(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }
}

/// One page of listed objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Listed objects in store order.
    pub items: Vec<ListedObject>,
    /// Cursor for the next page; `None` on the final page.
    pub next_marker: Option<Marker>,
}

impl ListPage {
    /// Creates a page.
    pub fn new(items: Vec<ListedObject>, next_marker: Option<Marker>) -> Self {
        Self { items, next_marker }
    }

    /// Returns `true` when this is the final page.
    pub fn is_last(&self) -> bool {
        self.next_marker.is_none()
    }
}

/// Remote object store consumed by the deletion engine.
///
/// Implementations are stateless from the caller's perspective and shared
/// across tasks behind an `Arc`.
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lists up to `request.limit` objects under `request.prefix`.
    async fn list(&self, request: ListRequest<'_>) -> StoreResult<ListPage>;

    /// Deletes one object, or one version of it when `version` is set.
    async fn delete(&self, container: &str, key: &str, version: Option<&str>) -> StoreResult<()>;
}
