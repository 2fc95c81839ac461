//! Task dispatching.
//!
//! Moves tasks that hold their source slot onto worker contexts, bounded by
//! the configured worker pool size.

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::source::SourceId;

use super::core::AgentDispatcher;
use super::task::{Task, TaskDisposition, TaskId};
use super::telemetry::TelemetryEvent;

impl AgentDispatcher {
    /// Dispatches ready tasks while worker slots are free.
    ///
    /// Tasks in `ready` already hold their source's serialization slot; the
    /// only thing gating them here is the pool bound.
    pub(crate) fn dispatch_ready(&mut self) {
        while self.running < self.config.max_concurrent_tasks {
            let Some(task) = self.ready.pop_front() else {
                return;
            };
            self.spawn_task(task);
        }
    }

    /// Spawns one task on a worker context.
    fn spawn_task(&mut self, task: Task) {
        self.running += 1;

        let task_id = task.id().clone();
        let kind = task.kind_name();
        let source_id = task.source_id();
        let done = task.done_flag();

        debug!(task_id = %task_id, kind = %kind, source_id = %source_id, "Task started");
        self.telemetry.emit(TelemetryEvent::TaskStarted {
            task_id: task_id.clone(),
            kind,
            source_id,
        });

        let completion_tx = self.completion_tx.clone();
        let registry = std::sync::Arc::clone(&self.registry);

        tokio::spawn(async move {
            let start = Instant::now();

            // Bodies block on the persistence layer, so they run on the
            // blocking pool. A panicking payload must not leak its source
            // slot or wedge the event loop: the join error is absorbed, the
            // task marked done, and a contained failure reported.
            let run = tokio::task::spawn_blocking(move || task.run(registry.as_ref())).await;
            let disposition = match run {
                Ok(disposition) => disposition,
                Err(join_error) => {
                    done.store(true, Ordering::Release);
                    tracing::error!(
                        task_id = %task_id,
                        error = %join_error,
                        "Task payload panicked"
                    );
                    TaskDisposition::ContainedFailure
                }
            };

            let _ = completion_tx.send(TaskCompletion {
                task_id,
                kind,
                source_id,
                disposition,
                duration: start.elapsed(),
            });
        });
    }
}

/// Result of a completed task execution, sent from the worker context back
/// to the dispatcher.
pub(crate) struct TaskCompletion {
    pub task_id: TaskId,
    pub kind: &'static str,
    pub source_id: SourceId,
    pub disposition: TaskDisposition,
    pub duration: Duration,
}
