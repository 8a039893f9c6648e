//! Runs one batch delete to completion or termination.

use std::sync::Arc;

use anyhow::{Context, bail};
use sweep_engine::{BatchDeleteError, BatchDeleteTask, ProgressStatus};
use sweep_task::{RunError, Task, TaskRunner, TaskStatus, TracingReporter};

use crate::TRACING_TARGET_SWEEP;
use crate::config::Cli;
use crate::shutdown::shutdown_signal;

/// Connects the store, runs the batch delete and reports its outcome.
///
/// A termination signal stops the task after its in-flight delete; a second
/// signal is not needed and is ignored.
pub async fn sweep(cli: &Cli) -> anyhow::Result<()> {
    let remote = cli
        .store
        .connect()
        .context("failed to connect to the object store")?;

    let task = BatchDeleteTask::new(cli.target(), cli.delete.clone(), Arc::new(remote))
        .context("invalid batch delete configuration")?;
    let task = Arc::new(task);

    let runner = TaskRunner::new(TracingReporter);
    let handle = runner.spawn(task.clone(), task.target().display_data());
    let terminator = handle.terminator();

    tracing::debug!(
        target: TRACING_TARGET_SWEEP,
        task_id = %handle.id(),
        "Batch delete spawned"
    );

    let watcher = tokio::spawn(async move {
        shutdown_signal().await;
        terminator.terminate().await;
    });

    let outcome = handle.wait().await;
    watcher.abort();

    let (progress, error) = match outcome {
        Ok(progress) => (Some(progress), None),
        Err(RunError::Task(err)) => (err.progress().cloned(), Some(err)),
        Err(err @ RunError::Join(_)) => {
            return Err(err).context("batch delete task panicked");
        }
    };

    if cli.print_details
        && let Some(progress) = &progress
    {
        print_details(progress)?;
    }

    match (task.status(), error) {
        (_, Some(err @ BatchDeleteError::Incomplete { .. })) => {
            bail!("{err}")
        }
        (_, Some(err)) => Err(err).context("batch delete failed"),
        (TaskStatus::Terminated, None) => bail!("batch delete terminated before completion"),
        (_, None) => Ok(()),
    }
}

fn print_details(progress: &ProgressStatus) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(progress).context("failed to serialize progress")?;
    println!("{json}");
    Ok(())
}
