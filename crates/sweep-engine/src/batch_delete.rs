//! Paginated prefix deletion.

use std::fmt;
use std::sync::Arc;

use sweep_store::{ErrorClass, ListPage, ListRequest, ObjectId, RemoteStore, StoreError};
use sweep_task::{ProgressSink, Task, TaskControl, TaskStatus};

use crate::state::ExecutionState;
use crate::{
    BatchDeleteConfig, BatchDeleteError, BatchDeleteResult, DeleteTarget, ProgressStatus,
    TRACING_TARGET,
};

/// Reason recorded for deletes that failed on connectivity.
const NETWORK_FAILURE: &str = "network error";

/// How a traversal stopped without an error.
enum Stopped {
    Finished(ProgressStatus),
    Terminated(ProgressStatus),
}

/// Deletes every object under a prefix, page by page.
///
/// A task runs at most once. Objects are deleted one at a time in listing
/// order; protected objects and version conflicts are recorded and skipped,
/// any other delete failure aborts the run.
pub struct BatchDeleteTask {
    target: DeleteTarget,
    config: BatchDeleteConfig,
    store: Arc<dyn RemoteStore>,
    control: TaskControl,
}

impl BatchDeleteTask {
    /// Creates a task deleting `target` through `store`.
    pub fn new(
        target: DeleteTarget,
        config: BatchDeleteConfig,
        store: Arc<dyn RemoteStore>,
    ) -> BatchDeleteResult<Self> {
        config.validate()?;
        Ok(Self {
            target,
            config,
            store,
            control: TaskControl::new(),
        })
    }

    /// Returns the container and path this task deletes.
    pub fn target(&self) -> &DeleteTarget {
        &self.target
    }

    /// Returns the validated configuration.
    pub fn config(&self) -> &BatchDeleteConfig {
        &self.config
    }

    async fn traverse<S>(&self, sink: &mut S) -> BatchDeleteResult<Stopped>
    where
        S: ProgressSink<ProgressStatus>,
    {
        let mut state = ExecutionState::new(self.config.versioned);
        sink.report(state.snapshot());

        if !self.target.is_folder() {
            tracing::debug!(
                target: TRACING_TARGET,
                container = %self.target.container,
                key = %self.target.path,
                "Target is a single object, nothing to traverse"
            );
            return Ok(Stopped::Finished(state.into_progress()));
        }

        let container = self.target.container.as_str();
        let prefix = self.target.path.as_str();
        let versioned = self.config.versioned;

        loop {
            if self.control.is_terminated() {
                sink.report(state.snapshot());
                return Ok(Stopped::Terminated(state.into_progress()));
            }

            let limit = state.listing_limit(self.config.page_limit);
            let request = ListRequest::new(container, prefix, limit)
                .with_marker(state.marker())
                .with_versions(versioned);

            let ListPage { items, next_marker } = match self.store.list(request).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        container,
                        prefix,
                        error = %err,
                        "Listing failed"
                    );
                    return Err(BatchDeleteError::listing(prefix, err, state.into_progress()));
                }
            };

            let candidates = state.candidates(container, versioned, &items);
            tracing::debug!(
                target: TRACING_TARGET,
                container,
                prefix,
                limit,
                listed = items.len(),
                candidates = candidates.len(),
                has_more = next_marker.is_some(),
                "Listed page"
            );

            if candidates.is_empty() {
                return state.finish().map(Stopped::Finished);
            }

            for id in &candidates {
                if self.control.is_terminated() {
                    break;
                }

                if let Err(err) = self.delete_one(&mut state, sink, id).await {
                    return Err(BatchDeleteError::delete(
                        id.key.as_str(),
                        err,
                        state.into_progress(),
                    ));
                }
            }

            state.advance(next_marker);
        }
    }

    /// Deletes one object and records the outcome.
    ///
    /// Returns the store error only when it must abort the traversal.
    async fn delete_one<S>(
        &self,
        state: &mut ExecutionState,
        sink: &mut S,
        id: &ObjectId,
    ) -> Result<(), StoreError>
    where
        S: ProgressSink<ProgressStatus>,
    {
        let outcome = self
            .store
            .delete(&id.container, &id.key, id.version.as_deref())
            .await;

        let fatal = match outcome {
            Ok(()) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    key = %id.key,
                    version = id.version.as_deref(),
                    "Object deleted"
                );
                state.record_success(id);
                None
            }
            Err(err) => match err.class() {
                class @ (ErrorClass::Protected | ErrorClass::VersionConflict) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        key = %id.key,
                        version = id.version.as_deref(),
                        class = class.as_ref(),
                        error = %err,
                        "Skipping object"
                    );
                    state.record_skip(id, class, err.to_string());
                    None
                }
                ErrorClass::Network => {
                    state.record_failure(id, NETWORK_FAILURE.to_owned());
                    Some(err)
                }
                ErrorClass::Other => {
                    state.record_failure(id, err.to_string());
                    Some(err)
                }
            },
        };

        sink.report(state.snapshot());

        match fatal {
            Some(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    key = %id.key,
                    version = id.version.as_deref(),
                    error = %err,
                    "Delete failed, aborting"
                );
                Err(err)
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for BatchDeleteTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchDeleteTask")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("status", &self.control.status())
            .finish_non_exhaustive()
    }
}

impl Task for BatchDeleteTask {
    type Error = BatchDeleteError;
    type Output = ProgressStatus;
    type Progress = ProgressStatus;

    const TASK_NAME: &'static str = "batch_delete";

    async fn process<S>(&self, mut sink: S) -> BatchDeleteResult<ProgressStatus>
    where
        S: ProgressSink<ProgressStatus>,
    {
        let guard = self.control.begin()?;

        tracing::info!(
            target: TRACING_TARGET,
            container = %self.target.container,
            prefix = %self.target.path,
            kind = %self.target.kind,
            versioned = self.config.versioned,
            page_limit = self.config.page_limit,
            "Batch delete started"
        );

        let (status, outcome) = match self.traverse(&mut sink).await {
            Ok(Stopped::Finished(progress)) => (TaskStatus::Completed, Ok(progress)),
            Ok(Stopped::Terminated(progress)) => (TaskStatus::Terminated, Ok(progress)),
            Err(err @ BatchDeleteError::Incomplete { .. }) => (TaskStatus::Completed, Err(err)),
            Err(err) => (TaskStatus::Failed, Err(err)),
        };

        let progress = match &outcome {
            Ok(progress) => Some(progress),
            Err(err) => err.progress(),
        };
        tracing::info!(
            target: TRACING_TARGET,
            status = %status,
            success_count = progress.map_or(0, |p| p.success_count),
            failure_count = progress.map_or(0, |p| p.failure_count),
            "Batch delete finished"
        );

        guard.settle(status);
        outcome
    }

    async fn terminate(&self) {
        self.control.terminate().await;
    }

    fn status(&self) -> TaskStatus {
        self.control.status()
    }
}

#[cfg(test)]
mod tests {
    use std::pin::pin;

    use sweep_test::{MockRemoteStore, ProgressRecorder};

    use super::*;
    use crate::{DeleteRecord, RecordStatus};

    const CONTAINER: &str = "media";

    fn task(store: &MockRemoteStore, path: &str, page_limit: usize) -> BatchDeleteTask {
        let config = BatchDeleteConfig::new().with_page_limit(page_limit);
        BatchDeleteTask::new(
            DeleteTarget::from_path(CONTAINER, path),
            config,
            Arc::new(store.clone()),
        )
        .unwrap()
    }

    fn statuses(progress: &ProgressStatus) -> Vec<(&str, Option<&str>)> {
        progress
            .details
            .iter()
            .map(|record| {
                let status = match &record.status {
                    RecordStatus::Success => None,
                    other => Some(other.failure_reason().unwrap_or_default()),
                };
                (record.key.as_str(), status)
            })
            .collect()
    }

    #[tokio::test]
    async fn deletes_every_page() {
        let store = MockRemoteStore::new();
        store.add_objects(
            CONTAINER,
            &["videos/1", "videos/2", "videos/3", "videos/4", "videos/5", "photos/1"],
        );
        let recorder = ProgressRecorder::<ProgressStatus>::new();

        let progress = task(&store, "videos/", 2)
            .process(recorder.sink())
            .await
            .unwrap();

        assert_eq!(progress.success_count, 5);
        assert_eq!(progress.failure_count, 0);
        assert_eq!(store.keys(CONTAINER), ["photos/1"]);

        // Zeroed snapshot first, then one per delete.
        assert_eq!(recorder.len(), 6);
        assert_eq!(recorder.first(), Some(ProgressStatus::new(false)));
        assert_eq!(recorder.last(), Some(progress));
    }

    #[tokio::test]
    async fn protected_object_is_skipped_and_summarized() {
        let store = MockRemoteStore::new();
        store
            .add_objects(CONTAINER, &["videos/a", "videos/b", "videos/c"])
            .protect("videos/c");
        let task = task(&store, "videos/", 2);

        let err = task.process(|_: ProgressStatus| {}).await.unwrap_err();
        let BatchDeleteError::Incomplete { skipped, progress } = &err else {
            panic!("unexpected error: {err}");
        };

        assert!(skipped.protected);
        assert!(!skipped.version_conflict);
        assert_eq!(progress.success_count, 2);
        assert_eq!(progress.failure_count, 1);
        assert_eq!(
            statuses(progress),
            [
                ("videos/a", None),
                ("videos/b", None),
                ("videos/c", Some("protected: object is under a retention lock")),
            ]
        );
        assert_eq!(task.status(), TaskStatus::Completed);

        // [a, b], then [c] after the marker, then a fresh listing with the
        // limit grown by the skipped object that only returns c again.
        let limits: Vec<_> = store
            .list_calls()
            .iter()
            .map(|call| (call.limit, call.marker.is_some()))
            .collect();
        assert_eq!(limits, [(2, false), (2, true), (3, false)]);
    }

    #[tokio::test]
    async fn skipped_object_is_recorded_once() {
        let store = MockRemoteStore::new();
        store
            .add_objects(CONTAINER, &["logs/0", "logs/1", "logs/2", "logs/3"])
            .protect("logs/0");

        let err = task(&store, "logs/", 1)
            .process(|_: ProgressStatus| {})
            .await
            .unwrap_err();
        let progress = err.progress().unwrap();

        assert_eq!(progress.failure_count, 1);
        assert_eq!(progress.success_count, 3);
        let protected_deletes = store
            .delete_calls()
            .iter()
            .filter(|call| call.key == "logs/0")
            .count();
        assert_eq!(protected_deletes, 1);
        assert_eq!(store.keys(CONTAINER), ["logs/0"]);
    }

    #[tokio::test]
    async fn version_conflicts_are_skipped() {
        let store = MockRemoteStore::new();
        store
            .add_version(CONTAINER, "docs/a", "v1")
            .add_version(CONTAINER, "docs/a", "v2")
            .add_version(CONTAINER, "docs/b", "v1")
            .conflict_on("docs/b");

        let config = BatchDeleteConfig::new()
            .with_page_limit(10)
            .with_versioned(true);
        let task = BatchDeleteTask::new(
            DeleteTarget::prefix(CONTAINER, "docs/"),
            config,
            Arc::new(store.clone()),
        )
        .unwrap();

        let err = task.process(|_: ProgressStatus| {}).await.unwrap_err();
        let BatchDeleteError::Incomplete { skipped, progress } = err else {
            panic!("unexpected error");
        };

        assert!(skipped.version_conflict);
        assert!(progress.versioned);
        assert_eq!(progress.success_count, 2);
        assert_eq!(
            progress.details[2],
            DeleteRecord {
                key: "docs/b".into(),
                version: Some("v1".into()),
                container: CONTAINER.into(),
                status: RecordStatus::Failed(
                    "version conflict: the latest version cannot be deleted".into()
                ),
            }
        );
        assert!(!store.contains(CONTAINER, "docs/a"));
    }

    #[tokio::test]
    async fn versioned_mode_deletes_each_version() {
        let store = MockRemoteStore::new();
        store
            .add_version(CONTAINER, "docs/a", "v1")
            .add_version(CONTAINER, "docs/a", "v2");

        let config = BatchDeleteConfig::new().with_versioned(true);
        let task = BatchDeleteTask::new(
            DeleteTarget::prefix(CONTAINER, "docs/"),
            config,
            Arc::new(store.clone()),
        )
        .unwrap();

        let progress = task.process(|_: ProgressStatus| {}).await.unwrap();
        assert_eq!(progress.success_count, 2);

        let versions: Vec<_> = store
            .delete_calls()
            .into_iter()
            .map(|call| call.version)
            .collect();
        assert_eq!(versions, [Some("v1".to_string()), Some("v2".to_string())]);
        assert!(store.list_calls().iter().all(|call| call.versioned));
    }

    #[tokio::test]
    async fn network_error_aborts_the_traversal() {
        let store = MockRemoteStore::new();
        store
            .add_objects(CONTAINER, &["videos/a", "videos/b", "videos/c", "videos/d"])
            .fail_network_on("videos/b");
        let task = task(&store, "videos/", 2);

        let err = task.process(|_: ProgressStatus| {}).await.unwrap_err();
        assert!(matches!(err, BatchDeleteError::Network { .. }));
        assert_eq!(task.status(), TaskStatus::Failed);

        let progress = err.progress().unwrap();
        assert_eq!(
            statuses(progress),
            [("videos/a", None), ("videos/b", Some(NETWORK_FAILURE))]
        );
        assert_eq!(progress.failure_count, 0);

        assert_eq!(store.list_calls().len(), 1);
        assert_eq!(store.delete_calls().len(), 2);
        assert!(store.contains(CONTAINER, "videos/c"));
    }

    #[tokio::test]
    async fn unclassified_error_aborts_with_its_message() {
        let store = MockRemoteStore::new();
        store
            .add_objects(CONTAINER, &["videos/a", "videos/b"])
            .fail_delete_on("videos/a", "internal error");

        let err = task(&store, "videos/", 10)
            .process(|_: ProgressStatus| {})
            .await
            .unwrap_err();

        assert!(matches!(err, BatchDeleteError::Delete { .. }));
        assert_eq!(
            statuses(err.progress().unwrap()),
            [("videos/a", Some("internal error"))]
        );
        assert_eq!(store.delete_calls().len(), 1);
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let store = MockRemoteStore::new();
        store.add_object(CONTAINER, "videos/a").fail_listing("throttled");
        let recorder = ProgressRecorder::<ProgressStatus>::new();
        let task = task(&store, "videos/", 10);

        let err = task.process(recorder.sink()).await.unwrap_err();

        assert!(matches!(err, BatchDeleteError::Listing { .. }));
        assert_eq!(err.to_string(), "listing failed under 'videos/'");
        assert!(err.progress().unwrap().is_empty());
        assert_eq!(recorder.len(), 1);
        assert_eq!(task.status(), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn single_object_target_is_left_alone() {
        let store = MockRemoteStore::new();
        store.add_object(CONTAINER, "videos/a.mp4");
        let recorder = ProgressRecorder::<ProgressStatus>::new();

        let progress = task(&store, "videos/a.mp4", 10)
            .process(recorder.sink())
            .await
            .unwrap();

        assert_eq!(progress, ProgressStatus::new(false));
        assert_eq!(recorder.snapshots(), [ProgressStatus::new(false)]);
        assert!(store.list_calls().is_empty());
        assert!(store.contains(CONTAINER, "videos/a.mp4"));
    }

    #[tokio::test]
    async fn prefix_is_matched_as_a_string() {
        let store = MockRemoteStore::new();
        store.add_objects(CONTAINER, &["videos/clip-1", "videos/clip-2", "videos/movie"]);
        let task = BatchDeleteTask::new(
            DeleteTarget::prefix(CONTAINER, "videos/clip"),
            BatchDeleteConfig::new(),
            Arc::new(store.clone()),
        )
        .unwrap();

        let progress = task.process(|_: ProgressStatus| {}).await.unwrap();
        assert_eq!(progress.success_count, 2);
        assert_eq!(store.keys(CONTAINER), ["videos/movie"]);
    }

    #[tokio::test]
    async fn terminate_waits_for_the_in_flight_delete() {
        let store = MockRemoteStore::new();
        store.add_objects(CONTAINER, &["videos/a", "videos/b", "videos/c"]);
        let gate = store.gate_deletes();
        let recorder = ProgressRecorder::<ProgressStatus>::new();
        let task = task(&store, "videos/", 10);

        let mut process = pin!(task.process(recorder.sink()));
        tokio::select! {
            biased;
            _ = &mut process => panic!("process finished while its delete was gated"),
            () = gate.wait_started() => {}
        }

        let mut terminate = pin!(task.terminate());
        assert!(futures::poll!(&mut terminate).is_pending());
        assert_eq!(task.status(), TaskStatus::Running);

        gate.release(1);
        let (outcome, ()) = tokio::join!(process, terminate);
        let progress = outcome.unwrap();

        assert_eq!(statuses(&progress), [("videos/a", None)]);
        assert_eq!(task.status(), TaskStatus::Terminated);
        assert_eq!(store.delete_calls().len(), 1);
        assert_eq!(recorder.last(), Some(progress));
    }

    #[tokio::test]
    async fn terminate_waits_for_the_in_flight_listing() {
        let store = MockRemoteStore::new();
        store.add_objects(CONTAINER, &["videos/a", "videos/b"]);
        let gate = store.gate_listings();
        let recorder = ProgressRecorder::<ProgressStatus>::new();
        let task = task(&store, "videos/", 10);

        let mut process = pin!(task.process(recorder.sink()));
        tokio::select! {
            biased;
            _ = &mut process => panic!("process finished while its listing was gated"),
            () = gate.wait_started() => {}
        }

        let mut terminate = pin!(task.terminate());
        assert!(futures::poll!(&mut terminate).is_pending());
        assert_eq!(task.status(), TaskStatus::Running);

        gate.release(1);
        let (outcome, ()) = tokio::join!(process, terminate);
        let progress = outcome.unwrap();

        assert!(progress.is_empty());
        assert_eq!(task.status(), TaskStatus::Terminated);
        assert_eq!(store.list_calls().len(), 1);
        assert!(store.delete_calls().is_empty());
        assert_eq!(store.keys(CONTAINER), ["videos/a", "videos/b"]);
        assert_eq!(recorder.last(), Some(progress));
    }

    #[tokio::test]
    async fn concurrent_terminates_both_wait_for_the_drain() {
        let store = MockRemoteStore::new();
        store.add_objects(CONTAINER, &["videos/a", "videos/b"]);
        let gate = store.gate_deletes();
        let task = task(&store, "videos/", 10);

        let mut process = pin!(task.process(|_: ProgressStatus| {}));
        tokio::select! {
            biased;
            _ = &mut process => panic!("process finished while its delete was gated"),
            () = gate.wait_started() => {}
        }

        let mut first = pin!(task.terminate());
        let mut second = pin!(task.terminate());
        assert!(futures::poll!(&mut first).is_pending());
        assert!(futures::poll!(&mut second).is_pending());

        gate.release(1);
        let (outcome, (), ()) = tokio::join!(process, first, second);

        assert_eq!(outcome.unwrap().success_count, 1);
        assert_eq!(task.status(), TaskStatus::Terminated);
        assert_eq!(store.delete_calls().len(), 1);
    }

    #[tokio::test]
    async fn terminate_is_idempotent() {
        let store = MockRemoteStore::new();
        store.add_objects(CONTAINER, &["videos/a"]);
        let recorder = ProgressRecorder::<ProgressStatus>::new();
        let task = task(&store, "videos/", 10);

        task.process(recorder.sink()).await.unwrap();
        let snapshots = recorder.len();

        task.terminate().await;
        task.terminate().await;

        assert_eq!(recorder.len(), snapshots);
        assert_eq!(task.status(), TaskStatus::Completed);
    }

    #[tokio::test]
    async fn terminate_before_start_stops_at_the_first_checkpoint() {
        let store = MockRemoteStore::new();
        store.add_objects(CONTAINER, &["videos/a"]);
        let recorder = ProgressRecorder::<ProgressStatus>::new();
        let task = task(&store, "videos/", 10);

        task.terminate().await;
        let progress = task.process(recorder.sink()).await.unwrap();

        assert!(progress.is_empty());
        assert!(recorder.snapshots().iter().all(ProgressStatus::is_empty));
        assert_eq!(task.status(), TaskStatus::Terminated);
        assert!(store.list_calls().is_empty());
        assert!(store.contains(CONTAINER, "videos/a"));
    }

    #[tokio::test]
    async fn a_task_runs_once() {
        let store = MockRemoteStore::new();
        store.add_container(CONTAINER);
        let task = task(&store, "videos/", 10);

        task.process(|_: ProgressStatus| {}).await.unwrap();
        let err = task.process(|_: ProgressStatus| {}).await.unwrap_err();

        assert!(matches!(err, BatchDeleteError::Lifecycle(_)));
        assert!(err.progress().is_none());
    }

    #[tokio::test]
    async fn zero_page_limit_is_rejected() {
        let store = MockRemoteStore::new();
        let err = BatchDeleteTask::new(
            DeleteTarget::prefix(CONTAINER, "videos/"),
            BatchDeleteConfig::new().with_page_limit(0),
            Arc::new(store),
        )
        .unwrap_err();

        assert!(matches!(err, BatchDeleteError::Config { .. }));
    }

    #[tokio::test]
    async fn deletes_through_an_object_store() {
        use futures::TryStreamExt;
        use object_store::memory::InMemory;
        use object_store::path::Path;
        use object_store::{ObjectStore, PutPayload};
        use sweep_store::ObjectStoreRemote;

        let memory = Arc::new(InMemory::new());
        for key in ["videos/a", "videos/b", "videos/c", "photos/x"] {
            memory
                .put(&Path::from(key), PutPayload::from_static(b"data"))
                .await
                .unwrap();
        }
        let remote = ObjectStoreRemote::from_arc(CONTAINER, memory.clone());

        let task = BatchDeleteTask::new(
            DeleteTarget::prefix(CONTAINER, "videos/"),
            BatchDeleteConfig::new().with_page_limit(2),
            Arc::new(remote),
        )
        .unwrap();

        let progress = task.process(|_: ProgressStatus| {}).await.unwrap();
        assert_eq!(progress.success_count, 3);

        let remaining: Vec<_> = memory
            .list(None)
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(remaining, ["photos/x"]);
    }

    #[tokio::test]
    async fn keys_needing_encoding_are_deleted_once() {
        use futures::TryStreamExt;
        use object_store::memory::InMemory;
        use object_store::path::Path;
        use object_store::{ObjectStore, PutPayload};
        use sweep_store::ObjectStoreRemote;

        let memory = Arc::new(InMemory::new());
        for key in ["videos/50%off.mp4", "videos/#1", "videos/{a}", "photos/x"] {
            memory
                .put(&Path::from(key), PutPayload::from_static(b"data"))
                .await
                .unwrap();
        }
        let remote = ObjectStoreRemote::from_arc(CONTAINER, memory.clone());

        let task = BatchDeleteTask::new(
            DeleteTarget::prefix(CONTAINER, "videos/"),
            BatchDeleteConfig::new().with_page_limit(2),
            Arc::new(remote),
        )
        .unwrap();

        let progress = task.process(|_: ProgressStatus| {}).await.unwrap();
        assert_eq!(progress.success_count, 3);

        let mut keys: Vec<_> = progress.details.iter().map(|r| r.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 3);

        let remaining: Vec<_> = memory
            .list(None)
            .map_ok(|meta| meta.location.to_string())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(remaining, ["photos/x"]);
    }
}
