//! Progress reported by a batch delete.

use std::fmt;

use serde::{Deserialize, Serialize};
use sweep_store::ObjectId;

/// Outcome of one processed object.
///
/// Serialized as a plain string: empty while pending, `"success"`, or the
/// failure reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RecordStatus {
    /// Not processed yet.
    #[default]
    Pending,
    /// Deleted.
    Success,
    /// Not deleted, with a human-readable reason.
    Failed(String),
}

impl RecordStatus {
    const SUCCESS: &'static str = "success";

    /// Returns `true` for [`RecordStatus::Success`].
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<String> for RecordStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" => Self::Pending,
            Self::SUCCESS => Self::Success,
            _ => Self::Failed(value),
        }
    }
}

impl From<RecordStatus> for String {
    fn from(status: RecordStatus) -> Self {
        match status {
            RecordStatus::Pending => String::new(),
            RecordStatus::Success => RecordStatus::SUCCESS.to_owned(),
            RecordStatus::Failed(reason) => reason,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Success => f.write_str(Self::SUCCESS),
            Self::Failed(reason) => f.write_str(reason),
        }
    }
}

/// Log entry for one processed object. Never changed once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRecord {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub container: String,
    pub status: RecordStatus,
}

impl DeleteRecord {
    /// Creates a record for `id`.
    pub fn new(id: &ObjectId, status: RecordStatus) -> Self {
        Self {
            key: id.key.clone(),
            version: id.version.clone(),
            container: id.container.clone(),
            status,
        }
    }

    /// Returns the identifier of the recorded object.
    pub fn object_id(&self) -> ObjectId {
        let id = ObjectId::new(self.container.as_str(), self.key.as_str());
        match &self.version {
            Some(version) => id.with_version(version.as_str()),
            None => id,
        }
    }
}

/// Snapshot of a batch delete, reported after every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStatus {
    /// Whether individual versions are being deleted.
    pub versioned: bool,
    /// Objects deleted.
    pub success_count: u64,
    /// Objects skipped because they are protected or version-locked.
    pub failure_count: u64,
    /// Every processed object, in processing order.
    pub details: Vec<DeleteRecord>,
}

impl ProgressStatus {
    /// Creates a zeroed snapshot.
    pub fn new(versioned: bool) -> Self {
        Self {
            versioned,
            ..Self::default()
        }
    }

    /// Returns `true` when nothing has been processed yet.
    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    /// Returns the records that did not end in a successful delete.
    pub fn failures(&self) -> impl Iterator<Item = &DeleteRecord> {
        self.details
            .iter()
            .filter(|record| !record.status.is_success())
    }

    pub(crate) fn push_success(&mut self, id: &ObjectId) {
        self.success_count += 1;
        self.details.push(DeleteRecord::new(id, RecordStatus::Success));
    }

    pub(crate) fn push_skip(&mut self, id: &ObjectId, reason: String) {
        self.failure_count += 1;
        self.details
            .push(DeleteRecord::new(id, RecordStatus::Failed(reason)));
    }

    pub(crate) fn push_failure(&mut self, id: &ObjectId, reason: String) {
        self.details
            .push(DeleteRecord::new(id, RecordStatus::Failed(reason)));
    }
}
