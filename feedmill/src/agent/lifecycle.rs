//! Task lifecycle management.
//!
//! Handles submission admission, completion processing (including promotion
//! of the next task parked on the released source), and shutdown draining.

use tracing::{debug, error, warn};

use super::core::AgentDispatcher;
use super::dispatch::TaskCompletion;
use super::serializer::Admission;
use super::task::{Task, TaskDisposition};
use super::telemetry::TelemetryEvent;

impl AgentDispatcher {
    /// Handles a newly submitted task.
    ///
    /// If the task's source has no in-flight task it becomes ready for
    /// dispatch; otherwise it parks in that source's FIFO queue.
    pub(crate) fn handle_submission(&mut self, task: Task) {
        let task_id = task.id().clone();
        let kind = task.kind_name();
        let source_id = task.source_id();

        debug!(task_id = %task_id, kind = %kind, source_id = %source_id, "Task submitted");
        self.telemetry.emit(TelemetryEvent::TaskSubmitted {
            task_id: task_id.clone(),
            kind,
            source_id,
        });

        match self.serializer.admit(task) {
            Admission::Immediate(task) => {
                self.ready.push_back(task);
            }
            Admission::Parked { queue_depth } => {
                debug!(
                    task_id = %task_id,
                    kind = %kind,
                    source_id = %source_id,
                    queue_depth = queue_depth,
                    "Source busy, task parked"
                );
                self.telemetry.emit(TelemetryEvent::TaskParked {
                    task_id,
                    kind,
                    source_id,
                    queue_depth,
                });
            }
        }
    }

    /// Handles a completed task.
    ///
    /// Frees the worker slot, releases the source's serialization slot and
    /// promotes the next parked task for that source, if any.
    pub(crate) fn handle_completion(&mut self, completion: TaskCompletion) {
        self.running = self.running.saturating_sub(1);
        self.log_completion(&completion);

        self.telemetry.emit(TelemetryEvent::TaskCompleted {
            task_id: completion.task_id,
            kind: completion.kind,
            source_id: completion.source_id,
            disposition: completion.disposition,
            duration: completion.duration,
        });

        if let Some(promoted) = self.serializer.release(completion.source_id) {
            debug!(
                task_id = %promoted.id(),
                source_id = %completion.source_id,
                "Promoting next task for source"
            );
            self.ready.push_back(promoted);
        }
    }

    /// Logs a completion at the level its disposition warrants.
    fn log_completion(&self, completion: &TaskCompletion) {
        match completion.disposition {
            TaskDisposition::Completed => {
                debug!(
                    task_id = %completion.task_id,
                    kind = %completion.kind,
                    source_id = %completion.source_id,
                    duration_ms = completion.duration.as_millis(),
                    "Task completed"
                );
            }
            TaskDisposition::Skipped => {
                debug!(
                    task_id = %completion.task_id,
                    kind = %completion.kind,
                    source_id = %completion.source_id,
                    "Task skipped, source gone"
                );
            }
            TaskDisposition::ContainedFailure => {
                error!(
                    task_id = %completion.task_id,
                    kind = %completion.kind,
                    source_id = %completion.source_id,
                    duration_ms = completion.duration.as_millis(),
                    "Task failed, failure contained on source log"
                );
            }
        }
    }

    /// Shuts the dispatcher down.
    ///
    /// In-flight tasks run to completion; tasks still queued (parked on a
    /// source, or ready but not yet on a worker) are abandoned: marked done
    /// without their callback ever firing.
    pub(crate) async fn shutdown(&mut self) {
        self.task_rx.close();

        let parked = self.serializer.drain();
        let ready: Vec<Task> = self.ready.drain(..).collect();
        // Tasks still sitting in the submission channel are abandoned too,
        // so every accepted ticket eventually reads done.
        let mut unread = Vec::new();
        while let Ok(task) = self.task_rx.try_recv() {
            unread.push(task);
        }
        let dropped = parked.len() + ready.len() + unread.len();

        for task in parked.into_iter().chain(ready).chain(unread) {
            self.telemetry.emit(TelemetryEvent::TaskAbandoned {
                task_id: task.id().clone(),
                kind: task.kind_name(),
                source_id: task.source_id(),
            });
            task.abandon();
        }

        if dropped > 0 {
            warn!(dropped = dropped, "Shutdown abandoned queued tasks");
        }

        // Wait for in-flight tasks; their completions still release cleanly.
        while self.running > 0 {
            match self.completion_rx.recv().await {
                Some(completion) => {
                    self.running = self.running.saturating_sub(1);
                    self.log_completion(&completion);
                    self.telemetry.emit(TelemetryEvent::TaskCompleted {
                        task_id: completion.task_id,
                        kind: completion.kind,
                        source_id: completion.source_id,
                        disposition: completion.disposition,
                        duration: completion.duration,
                    });
                    // The serializer was drained; nothing can be promoted.
                    let _ = self.serializer.release(completion.source_id);
                }
                None => break,
            }
        }
    }
}
