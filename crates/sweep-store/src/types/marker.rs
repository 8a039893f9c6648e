//! Opaque listing continuation marker.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Cursor returned by a list call to resume listing after the last item.
///
/// The content is defined by the store that produced it and must be passed
/// back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(String);

impl Marker {
    /// Wraps a store-specific cursor.
    pub fn new(cursor: impl Into<String>) -> Self {
        Self(cursor.into())
    }

    /// Returns the raw cursor.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Marker {
    fn from(cursor: &str) -> Self {
        Self::new(cursor)
    }
}

impl AsRef<str> for Marker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
