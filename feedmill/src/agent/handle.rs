//! Task ticket for completion observation.
//!
//! Submission is fire-and-forget: the ticket exposes nothing but the task id
//! and the `done` flag, and dropping it detaches the observer without
//! affecting the task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::task::TaskId;

/// Observer handle for a submitted task.
#[derive(Clone)]
pub struct TaskTicket {
    task_id: TaskId,
    done: Arc<AtomicBool>,
}

impl TaskTicket {
    pub(crate) fn new(task_id: TaskId, done: Arc<AtomicBool>) -> Self {
        Self { task_id, done }
    }

    /// Returns the task's unique identifier.
    pub fn id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns true once the task's callback has fired or the task was
    /// abandoned (source removed, or dispatcher shutdown). Never resets.
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for TaskTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTicket")
            .field("task_id", &self.task_id)
            .field("done", &self.is_done())
            .finish()
    }
}
