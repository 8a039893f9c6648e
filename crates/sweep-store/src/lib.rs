#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod backend;
#[cfg(feature = "config")]
#[cfg_attr(docsrs, doc(cfg(feature = "config")))]
mod config;
mod error;
mod store;
/// Object identifiers, listed objects and continuation markers.
pub mod types;

#[doc(hidden)]
pub mod prelude;

pub use backend::ObjectStoreRemote;
#[cfg(feature = "config")]
pub use config::{BackendKind, StoreConfig};
pub use error::{BoxedError, ErrorClass, StoreError, StoreResult};
pub use store::{ListPage, ListRequest, RemoteStore};
pub use types::{ListedObject, Marker, ObjectId};

/// Tracing target for store adapter operations.
pub const TRACING_TARGET: &str = "sweep_store";
