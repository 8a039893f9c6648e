//! What a batch delete is pointed at.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{AsRefStr, Display, IntoStaticStr};

/// Whether the target path is a folder (prefix) or a single object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetKind {
    /// Every object whose key starts with the path.
    Folder,
    /// Exactly one object; not handled by the batch delete.
    Object,
}

/// Container and path a batch delete operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTarget {
    pub container: String,
    pub path: String,
    pub kind: TargetKind,
}

impl DeleteTarget {
    /// Targets every object whose key starts with `prefix`.
    ///
    /// The prefix is matched as a plain string, so `videos/clip` also covers
    /// `videos/clip-2.mp4`. An empty prefix covers the whole container.
    pub fn prefix(container: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path: prefix.into(),
            kind: TargetKind::Folder,
        }
    }

    /// Targets a single object.
    pub fn object(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path: key.into(),
            kind: TargetKind::Object,
        }
    }

    /// Infers the kind from the path: empty paths and paths ending in `/`
    /// are folders, anything else is an object.
    pub fn from_path(container: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        if path.is_empty() || path.ends_with('/') {
            Self::prefix(container, path)
        } else {
            Self::object(container, path)
        }
    }

    #[inline]
    pub fn is_folder(&self) -> bool {
        self.kind == TargetKind::Folder
    }

    /// Describes the target for task reporters.
    pub fn display_data(&self) -> Value {
        json!({
            "container": self.container,
            "path": self.path,
            "kind": self.kind.as_ref(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_inferred_from_the_path() {
        assert!(DeleteTarget::from_path("media", "videos/").is_folder());
        assert!(DeleteTarget::from_path("media", "").is_folder());
        assert!(!DeleteTarget::from_path("media", "videos/a.mp4").is_folder());
        assert!(DeleteTarget::prefix("media", "videos/clip").is_folder());
    }

    #[test]
    fn display_data_names_the_kind() {
        let target = DeleteTarget::from_path("media", "videos/a.mp4");
        assert_eq!(
            target.display_data(),
            json!({ "container": "media", "path": "videos/a.mp4", "kind": "object" })
        );
    }
}
