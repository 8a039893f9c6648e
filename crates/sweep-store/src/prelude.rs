//! Prelude module for convenient imports.

pub use crate::backend::ObjectStoreRemote;
#[cfg(feature = "config")]
pub use crate::config::{BackendKind, StoreConfig};
pub use crate::error::{ErrorClass, StoreError, StoreResult};
pub use crate::store::{ListPage, ListRequest, RemoteStore};
pub use crate::types::{ListedObject, Marker, ObjectId};
