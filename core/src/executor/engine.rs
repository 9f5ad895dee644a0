use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::RunError;
use crate::task::{Selection, TaskRegistry, TaskScope};
use crate::volume::{reclaimed, VolumeProbe};

use super::types::{ProgressUpdate, RunOptions, RunState, Summary, TaskOutcome};

/// Runs a selection of catalogue tasks one after another and measures the
/// free space they reclaimed.
pub struct RunCoordinator {
    registry: Arc<TaskRegistry>,
    volume: Arc<dyn VolumeProbe>,
    opts: RunOptions,
}

impl RunCoordinator {
    pub fn new(
        registry: Arc<TaskRegistry>,
        volume: Arc<dyn VolumeProbe>,
        opts: RunOptions,
    ) -> Self {
        Self {
            registry,
            volume,
            opts,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn options(&self) -> &RunOptions {
        &self.opts
    }

    /// Execute `selection` in canonical order.
    ///
    /// Tasks never fail the run: their own errors are swallowed and a task
    /// that outlives the configured timeout is abandoned and reported in
    /// [`Summary::timed_out`]. An abandoned task's background jobs are
    /// cancelled and awaited before the next task starts, so tasks never
    /// overlap. `cancel` is honoured between tasks.
    pub async fn execute<F>(
        &self,
        selection: &Selection,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<Summary, RunError>
    where
        F: FnMut(&ProgressUpdate),
    {
        if selection.is_empty() {
            return Err(RunError::NoTasksSelected);
        }
        let tasks = self.registry.resolve(selection)?;

        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();
        let before = self.measure()?;
        tracing::info!(
            run_id = %run_id,
            tasks = tasks.len(),
            volume = %self.opts.volume_root.display(),
            free_bytes = before,
            "run started"
        );

        let mut state = RunState::new(tasks.len());
        let mut timed_out = Vec::new();
        let mut cancelled = false;

        for task in tasks {
            if cancel.is_cancelled() {
                tracing::info!(run_id = %run_id, next = %task.id, "run cancelled");
                cancelled = true;
                break;
            }

            on_progress(&state.start(&task.id, &task.label));
            let task_start = Instant::now();
            let scope = TaskScope::new();
            let body = scope.run(task.action.run());
            let outcome = match tokio::time::timeout(self.opts.task_timeout, body).await {
                Ok(()) => {
                    scope.drain().await;
                    TaskOutcome::Completed
                }
                Err(_) => {
                    tracing::warn!(
                        run_id = %run_id,
                        task = %task.id,
                        timeout_secs = self.opts.task_timeout.as_secs(),
                        "task timed out, abandoning"
                    );
                    // Background jobs of this task must be gone before the next one starts.
                    scope.abandon().await;
                    timed_out.push(task.id.clone());
                    TaskOutcome::TimedOut
                }
            };
            tracing::debug!(
                task = %task.id,
                elapsed_ms = task_start.elapsed().as_millis() as u64,
                ?outcome,
                "task finished"
            );
            on_progress(&state.finish(&task.id, &task.label, outcome));
        }

        let after = self.measure()?;
        let summary = Summary {
            tasks_completed: state.completed,
            space_reclaimed: reclaimed(before, after),
            cancelled,
            timed_out,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        tracing::info!(
            run_id = %run_id,
            completed = summary.tasks_completed,
            reclaimed_bytes = summary.space_reclaimed,
            duration_ms = summary.duration_ms,
            "run finished"
        );
        Ok(summary)
    }

    fn measure(&self) -> Result<u64, RunError> {
        let root = &self.opts.volume_root;
        self.volume.available_bytes(root).map_err(|source| {
            tracing::warn!(volume = %root.display(), error = %source, "free space unavailable");
            RunError::Measurement {
                root: root.clone(),
                source,
            }
        })
    }
}
