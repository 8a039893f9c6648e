//! Object identity as addressed by the remote store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one object (or one version of it) inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    /// Container (bucket) name.
    pub container: String,
    /// Full object key.
    pub key: String,
    /// Version qualifier, when the object is addressed by version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ObjectId {
    /// Creates an identifier for the latest version of `key`.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            version: None,
        }
    }

    /// Qualifies the identifier with a specific version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

/// One entry of a listed page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListedObject {
    /// Full object key.
    pub key: String,
    /// Version id, present for versioned listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ListedObject {
    /// Creates an unversioned entry.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: None,
        }
    }

    /// Creates a versioned entry.
    pub fn versioned(key: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            version: Some(version.into()),
        }
    }

    /// Builds the identifier of this entry inside `container`.
    ///
    /// The version is only part of the identity when `versioned` is set, since
    /// unversioned operations always address the latest version.
    pub fn object_id(&self, container: &str, versioned: bool) -> ObjectId {
        let id = ObjectId::new(container, self.key.as_str());
        match (&self.version, versioned) {
            (Some(version), true) => id.with_version(version.as_str()),
            _ => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_version() {
        let id = ObjectId::new("media", "videos/a.mp4").with_version("v2");
        assert_eq!(id.to_string(), "media/videos/a.mp4@v2");
        assert_eq!(ObjectId::new("media", "a").to_string(), "media/a");
    }

    #[test]
    fn version_is_ignored_outside_versioned_mode() {
        let listed = ListedObject::versioned("videos/a.mp4", "v1");

        assert_eq!(listed.object_id("media", false).version, None);
        assert_eq!(
            listed.object_id("media", true).version.as_deref(),
            Some("v1")
        );
    }
}
