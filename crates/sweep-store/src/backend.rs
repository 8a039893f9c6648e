//! [`RemoteStore`] adapter over [`object_store::ObjectStore`].
//!
//! [`ObjectStoreRemote`] binds one container name to a cloneable
//! `Arc<dyn ObjectStore>` (S3, local filesystem, in-memory, ...). Listing
//! uses `list_with_offset` with the last returned key as the continuation
//! marker, reading one item ahead to decide whether another page exists.
//!
//! Keys are `object_store` path strings exactly as listed, already
//! percent-encoded. They are parsed back with [`Path::parse`], never
//! re-encoded, so a listed key always addresses the object it came from.

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, future};
use object_store::path::{DELIMITER, Path};
use object_store::{ObjectMeta, ObjectStore};

use crate::error::{StoreError, StoreResult};
use crate::store::{ListPage, ListRequest, RemoteStore};
use crate::types::{ListedObject, Marker};

/// Tracing target for the `object_store` adapter.
const TRACING_TARGET: &str = "sweep_store::object_store";

/// [`RemoteStore`] backed by any [`ObjectStore`] implementation.
///
/// The object store is scoped to a single bucket, so the adapter serves
/// exactly one container and rejects requests for any other.
#[derive(Clone, Debug)]
pub struct ObjectStoreRemote {
    container: String,
    store: Arc<dyn ObjectStore>,
    ordered_listing: bool,
}

impl ObjectStoreRemote {
    /// Wraps a concrete [`ObjectStore`] serving `container`.
    pub fn new(container: impl Into<String>, store: impl ObjectStore) -> Self {
        Self::from_arc(container, Arc::new(store))
    }

    /// Wraps a shared [`ObjectStore`] serving `container`.
    pub fn from_arc(container: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            container: container.into(),
            store,
            ordered_listing: true,
        }
    }

    /// Declares whether the backend lists keys in lexicographic order.
    ///
    /// Cloud stores and the in-memory store do; the local filesystem does not.
    /// Unordered listings are collected and sorted before paging, which costs
    /// a full scan of the prefix per page.
    pub fn with_ordered_listing(mut self, ordered: bool) -> Self {
        self.ordered_listing = ordered;
        self
    }

    /// Returns the container served by this adapter.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Returns the wrapped object store.
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    fn check_container(&self, container: &str) -> StoreResult<()> {
        if container == self.container {
            Ok(())
        } else {
            Err(StoreError::container_not_found(container))
        }
    }

    async fn collect_page(&self, request: &ListRequest<'_>) -> StoreResult<Vec<ObjectMeta>> {
        let parent = parent_path(request.prefix)?;
        let stream = match request.marker {
            Some(marker) => {
                let offset = Path::parse(marker.as_str())
                    .map_err(|err| StoreError::invalid_marker(err.to_string()))?;
                self.store.list_with_offset(parent.as_ref(), &offset)
            }
            None => self.store.list(parent.as_ref()),
        };

        let prefix = request.prefix;
        let matching = stream
            .map_err(classify)
            .try_filter(|meta| future::ready(meta.location.as_ref().starts_with(prefix)));

        // One item of read-ahead tells whether another page exists.
        let wanted = request.limit.saturating_add(1);
        if self.ordered_listing {
            matching.take(wanted).try_collect().await
        } else {
            let mut all: Vec<ObjectMeta> = matching.try_collect().await?;
            all.sort_by(|a, b| a.location.cmp(&b.location));
            all.truncate(wanted);
            Ok(all)
        }
    }
}

#[async_trait::async_trait]
impl RemoteStore for ObjectStoreRemote {
    #[tracing::instrument(
        name = "object_store.list",
        skip(self, request),
        fields(container = request.container, prefix = request.prefix, limit = request.limit)
    )]
    async fn list(&self, request: ListRequest<'_>) -> StoreResult<ListPage> {
        self.check_container(request.container)?;
        if request.versioned {
            return Err(StoreError::unsupported("versioned listing"));
        }
        if request.limit == 0 {
            return Ok(ListPage::default());
        }

        let mut metas = self.collect_page(&request).await?;
        let has_more = metas.len() > request.limit;
        metas.truncate(request.limit);

        let items: Vec<ListedObject> = metas
            .into_iter()
            .map(|meta| ListedObject::new(meta.location.as_ref()))
            .collect();
        let next_marker = if has_more {
            items.last().map(|item| Marker::new(item.key.as_str()))
        } else {
            None
        };

        tracing::debug!(
            target: TRACING_TARGET,
            items = items.len(),
            has_more,
            "Listed page"
        );

        Ok(ListPage::new(items, next_marker))
    }

    #[tracing::instrument(name = "object_store.delete", skip(self))]
    async fn delete(&self, container: &str, key: &str, version: Option<&str>) -> StoreResult<()> {
        self.check_container(container)?;
        if version.is_some() {
            return Err(StoreError::unsupported("version-qualified delete"));
        }

        match self.store.delete(&object_path(key)?).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(target: TRACING_TARGET, key, "Object already absent");
                Ok(())
            }
            Err(err) => Err(classify(err)),
        }
    }
}

/// Parses a listed key without encoding it again.
fn object_path(key: &str) -> StoreResult<Path> {
    Path::parse(key).map_err(|err| StoreError::other(err.to_string()).with_source(err))
}

/// Returns the deepest directory that contains every key starting with `prefix`.
fn parent_path(prefix: &str) -> StoreResult<Option<Path>> {
    prefix
        .rsplit_once(DELIMITER)
        .map(|(parent, _)| parent)
        .filter(|parent| !parent.is_empty())
        .map(object_path)
        .transpose()
}

/// Converts an [`object_store::Error`] into a classified [`StoreError`].
fn classify(err: object_store::Error) -> StoreError {
    match &err {
        object_store::Error::PermissionDenied { .. } => {
            StoreError::protected(err.to_string()).with_source(err)
        }
        object_store::Error::Precondition { .. } => {
            StoreError::version_conflict(err.to_string()).with_source(err)
        }
        _ if is_connectivity_error(&err) => StoreError::network(err),
        _ => StoreError::other(err.to_string()).with_source(err),
    }
}

/// Walks the source chain looking for a transport-level I/O failure.
fn is_connectivity_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>()
            && matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::NotConnected
                    | io::ErrorKind::TimedOut
                    | io::ErrorKind::BrokenPipe
                    | io::ErrorKind::HostUnreachable
                    | io::ErrorKind::NetworkUnreachable
                    | io::ErrorKind::NetworkDown
            )
        {
            return true;
        }
        current = err.source();
    }
    false
}
