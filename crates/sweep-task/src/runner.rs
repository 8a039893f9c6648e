//! Runs tasks and forwards their lifecycle to a reporter.

use std::fmt;
use std::sync::Arc;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{RunError, TRACING_TARGET_RUNNER, Task, TaskReporter, TaskStatus};

/// Identifier assigned to every task the runner starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a new time-ordered task id (UUIDv7).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives tasks and reports their progress and settlement.
#[derive(Debug)]
pub struct TaskRunner<R> {
    reporter: Arc<R>,
}

impl<R> Clone for TaskRunner<R> {
    fn clone(&self) -> Self {
        Self {
            reporter: self.reporter.clone(),
        }
    }
}

impl<R> TaskRunner<R> {
    /// Creates a runner reporting to `reporter`.
    pub fn new(reporter: R) -> Self {
        Self {
            reporter: Arc::new(reporter),
        }
    }

    /// Returns the reporter shared by all runs.
    pub fn reporter(&self) -> &Arc<R> {
        &self.reporter
    }

    /// Runs `task` to settlement on the current task.
    ///
    /// `extra` is opaque display data handed to the reporter as-is.
    pub async fn run<T>(&self, id: TaskId, task: &T, extra: &Value) -> Result<T::Output, T::Error>
    where
        T: Task,
        R: TaskReporter<T>,
    {
        tracing::debug!(
            target: TRACING_TARGET_RUNNER,
            task_id = %id,
            task = T::TASK_NAME,
            "Running task"
        );

        self.reporter.task_started(id, extra);

        let reporter = self.reporter.clone();
        let sink = move |progress: T::Progress| reporter.progress_changed(id, &progress);
        let outcome = task.process(sink).await;

        self.reporter.task_settled(id, task.status(), &outcome);
        outcome
    }

    /// Spawns `task` on the tokio runtime.
    ///
    /// The execution counts as in flight from this call on, so terminating
    /// through the returned handle also waits for a run that has not been
    /// polled yet.
    pub fn spawn<T>(&self, task: Arc<T>, extra: Value) -> TaskHandle<T>
    where
        T: Task,
        R: TaskReporter<T>,
    {
        let id = TaskId::new();
        let runner = self.clone();
        let running = task.clone();
        let finished = CancellationToken::new();
        let finish_guard = finished.clone().drop_guard();
        let join = tokio::spawn(async move {
            let _finish_guard = finish_guard;
            runner.run(id, running.as_ref(), &extra).await
        });

        TaskHandle {
            id,
            task,
            finished,
            join,
        }
    }
}

/// Handle to a spawned task.
pub struct TaskHandle<T: Task> {
    id: TaskId,
    task: Arc<T>,
    finished: CancellationToken,
    join: JoinHandle<Result<T::Output, T::Error>>,
}

impl<T: Task> TaskHandle<T> {
    /// Returns the id assigned by the runner.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the current lifecycle state of the task.
    pub fn status(&self) -> TaskStatus {
        self.task.status()
    }

    /// Returns `true` once the spawned execution has returned.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Returns a cloneable handle that can terminate the task from elsewhere.
    pub fn terminator(&self) -> Terminator<T> {
        Terminator {
            task: self.task.clone(),
            finished: self.finished.clone(),
        }
    }

    /// Requests termination and waits for the spawned execution to return.
    pub async fn terminate(&self) {
        terminate_spawned(self.task.as_ref(), &self.finished).await;
    }

    /// Waits for the spawned execution and returns its outcome.
    pub async fn wait(self) -> Result<T::Output, RunError<T::Error>> {
        self.join.await?.map_err(RunError::Task)
    }
}

impl<T: Task> fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("task", &T::TASK_NAME)
            .field("finished", &self.join.is_finished())
            .finish()
    }
}

/// Cloneable termination handle for a spawned task.
#[derive(Debug)]
pub struct Terminator<T> {
    task: Arc<T>,
    finished: CancellationToken,
}

impl<T> Clone for Terminator<T> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
            finished: self.finished.clone(),
        }
    }
}

impl<T: Task> Terminator<T> {
    /// Requests termination and waits for the spawned execution to return.
    pub async fn terminate(&self) {
        terminate_spawned(self.task.as_ref(), &self.finished).await;
    }
}

/// Cancels `task`, then waits until its spawned execution has returned.
///
/// `finished` is cancelled when the spawned future completes or is dropped,
/// which covers a run that had not begun when termination was requested.
async fn terminate_spawned<T: Task>(task: &T, finished: &CancellationToken) {
    task.terminate().await;
    finished.cancelled().await;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::sync::Notify;

    use super::*;
    use crate::{ProgressSink, TaskControl};

    /// Counts up to `limit`, waiting on `step` before every increment.
    struct CountingTask {
        limit: u32,
        step: Arc<Notify>,
        control: TaskControl,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("counting failed")]
    struct CountingError;

    impl CountingTask {
        fn new(limit: u32) -> Self {
            Self {
                limit,
                step: Arc::new(Notify::new()),
                control: TaskControl::new(),
            }
        }
    }

    impl Task for CountingTask {
        type Error = CountingError;
        type Output = u32;
        type Progress = u32;

        const TASK_NAME: &'static str = "counting";

        async fn process<S>(&self, mut sink: S) -> Result<u32, CountingError>
        where
            S: ProgressSink<u32>,
        {
            let guard = self.control.begin().map_err(|_| CountingError)?;
            let mut count = 0;
            sink.report(count);

            while count < self.limit {
                if self.control.is_terminated() {
                    sink.report(count);
                    guard.settle(TaskStatus::Terminated);
                    return Ok(count);
                }
                self.step.notified().await;
                count += 1;
                sink.report(count);
            }

            guard.settle(TaskStatus::Completed);
            Ok(count)
        }

        async fn terminate(&self) {
            self.control.terminate().await;
        }

        fn status(&self) -> TaskStatus {
            self.control.status()
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl TaskReporter<CountingTask> for RecordingReporter {
        fn task_started(&self, _id: TaskId, extra: &Value) {
            self.events.lock().unwrap().push(format!("started {extra}"));
        }

        fn progress_changed(&self, _id: TaskId, progress: &u32) {
            self.events.lock().unwrap().push(format!("progress {progress}"));
        }

        fn task_settled(&self, _id: TaskId, status: TaskStatus, outcome: &Result<u32, CountingError>) {
            let outcome = match outcome {
                Ok(count) => count.to_string(),
                Err(err) => err.to_string(),
            };
            self.events
                .lock()
                .unwrap()
                .push(format!("settled {status} {outcome}"));
        }
    }

    #[tokio::test]
    async fn run_reports_every_event_in_order() {
        let runner = TaskRunner::new(RecordingReporter::default());
        let task = CountingTask::new(2);
        task.step.notify_one();

        let extra = serde_json::json!({ "path": "videos/" });
        let step = task.step.clone();
        let (outcome, ()) = tokio::join!(runner.run(TaskId::new(), &task, &extra), async move {
            tokio::task::yield_now().await;
            step.notify_one();
        });

        assert_eq!(outcome.unwrap(), 2);
        assert_eq!(
            runner.reporter().events(),
            vec![
                r#"started {"path":"videos/"}"#.to_string(),
                "progress 0".to_string(),
                "progress 1".to_string(),
                "progress 2".to_string(),
                "settled completed 2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn spawned_task_can_be_terminated() {
        let runner = TaskRunner::new(RecordingReporter::default());
        let task = Arc::new(CountingTask::new(100));
        let step = task.step.clone();

        let handle = runner.spawn(task, Value::Null);
        let terminator = handle.terminator();

        step.notify_one();
        let terminate = tokio::spawn(async move { terminator.terminate().await });
        while !terminate.is_finished() {
            step.notify_one();
            tokio::task::yield_now().await;
        }

        terminate.await.unwrap();
        assert_eq!(handle.status(), TaskStatus::Terminated);

        let count = handle.wait().await.unwrap();
        assert!(count < 100);

        let events = runner.reporter().events();
        assert_eq!(events.last().unwrap(), &format!("settled terminated {count}"));
    }

    #[tokio::test]
    async fn terminate_right_after_spawn_waits_for_the_run() {
        let runner = TaskRunner::new(RecordingReporter::default());
        let task = Arc::new(CountingTask::new(100));

        let handle = runner.spawn(task, Value::Null);
        handle.terminate().await;

        assert_eq!(handle.status(), TaskStatus::Terminated);
        let events = runner.reporter().events();
        assert_eq!(events.last().unwrap(), "settled terminated 0");

        assert_eq!(handle.wait().await.unwrap(), 0);
        assert_eq!(runner.reporter().events(), events);
    }

    #[tokio::test]
    async fn terminate_after_completion_is_immediate() {
        let runner = TaskRunner::new(RecordingReporter::default());
        let task = Arc::new(CountingTask::new(0));

        let handle = runner.spawn(task, Value::Null);
        let terminator = handle.terminator();
        assert_eq!(handle.wait().await.unwrap(), 0);

        terminator.terminate().await;
        terminator.terminate().await;
    }
}
