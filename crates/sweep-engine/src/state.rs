//! Per-execution traversal state.

use sweep_store::{ErrorClass, ListedObject, Marker, ObjectId};

use crate::{BatchDeleteError, BatchDeleteResult, IgnoreSet, ProgressStatus, SkipSummary};

/// Everything one execution of a batch delete mutates.
///
/// Created fresh by every `process` call and owned by its traversal loop.
#[derive(Debug)]
pub(crate) struct ExecutionState {
    progress: ProgressStatus,
    ignored: IgnoreSet,
    skipped: SkipSummary,
    marker: Option<Marker>,
}

impl ExecutionState {
    pub fn new(versioned: bool) -> Self {
        Self {
            progress: ProgressStatus::new(versioned),
            ignored: IgnoreSet::new(),
            skipped: SkipSummary::default(),
            marker: None,
        }
    }

    /// Returns a detached copy of the progress for reporting.
    #[inline]
    pub fn snapshot(&self) -> ProgressStatus {
        self.progress.clone()
    }

    pub fn into_progress(self) -> ProgressStatus {
        self.progress
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Stores the marker of the page just processed.
    ///
    /// Without a marker the next listing starts over from the beginning of
    /// the prefix, where only skipped objects remain.
    pub fn advance(&mut self, marker: Option<Marker>) {
        self.marker = marker;
    }

    /// Number of objects to request so that skipped ones do not crowd out
    /// live candidates.
    pub fn listing_limit(&self, page_limit: usize) -> usize {
        page_limit.saturating_add(self.ignored.len())
    }

    /// Maps listed entries to identifiers, dropping ignored ones.
    pub fn candidates(
        &self,
        container: &str,
        versioned: bool,
        items: &[ListedObject],
    ) -> Vec<ObjectId> {
        items
            .iter()
            .map(|item| item.object_id(container, versioned))
            .filter(|id| !self.ignored.contains(id))
            .collect()
    }

    pub fn record_success(&mut self, id: &ObjectId) {
        self.progress.push_success(id);
    }

    /// Records a permanent failure and ignores the object from now on.
    pub fn record_skip(&mut self, id: &ObjectId, class: ErrorClass, reason: String) {
        match class {
            ErrorClass::Protected => self.skipped.protected = true,
            ErrorClass::VersionConflict => self.skipped.version_conflict = true,
            ErrorClass::Network | ErrorClass::Other => {}
        }
        self.progress.push_skip(id, reason);
        self.ignored.insert(id.clone());
    }

    /// Records the failure that aborts the traversal.
    pub fn record_failure(&mut self, id: &ObjectId, reason: String) {
        self.progress.push_failure(id, reason);
    }

    /// Ends a traversal that ran out of candidates.
    pub fn finish(self) -> BatchDeleteResult<ProgressStatus> {
        if self.skipped.any() {
            Err(BatchDeleteError::incomplete(self.skipped, self.progress))
        } else {
            Ok(self.progress)
        }
    }
}
