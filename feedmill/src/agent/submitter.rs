//! Task submission interface.
//!
//! [`AgentSubmitter`] is the public face of the agent system: one typed
//! `queue_*` method per operation kind, each fire-and-forget. The interactive
//! side never blocks; tasks flow to the dispatcher over a channel and the
//! completion callback fires later on a worker context. Consumers that need
//! affinity to a particular thread hand the result off themselves.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::source::{FetchDepth, FlagColor, SourceId};

use super::handle::TaskTicket;
use super::task::{OnComplete, Task, TaskKind, TaskOutcome};

// =============================================================================
// Agent Submitter
// =============================================================================

/// Handle for submitting tasks to the dispatcher.
///
/// Clone-able; all clones feed the same dispatcher.
#[derive(Clone)]
pub struct AgentSubmitter {
    sender: mpsc::Sender<Task>,
}

impl AgentSubmitter {
    pub(crate) fn new(sender: mpsc::Sender<Task>) -> Self {
        Self { sender }
    }

    /// Submits a task for execution.
    ///
    /// # Panics
    ///
    /// Panics if the dispatcher has been dropped (channel closed).
    pub fn submit(
        &self,
        source_id: SourceId,
        kind: TaskKind,
        on_complete: OnComplete,
    ) -> TaskTicket {
        self.try_submit(source_id, kind, on_complete)
            .expect("Agent dispatcher channel closed")
    }

    /// Attempts to submit a task for execution.
    ///
    /// Returns `None` if the dispatcher has been dropped or the submission
    /// channel is full.
    pub fn try_submit(
        &self,
        source_id: SourceId,
        kind: TaskKind,
        on_complete: OnComplete,
    ) -> Option<TaskTicket> {
        let task = Task::new(source_id, kind, on_complete);
        let ticket = task.ticket();
        self.sender.try_send(task).ok()?;
        Some(ticket)
    }

    // -------------------------------------------------------------------------
    // Feed operations
    // -------------------------------------------------------------------------

    /// Removes a feed from a source.
    pub fn queue_remove_feed(
        &self,
        source_id: SourceId,
        feed_id: u64,
        finished: impl FnOnce() + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::FeedRemove { feed_id },
            Box::new(move |_| finished()),
        )
    }

    /// Marks all posts of a feed as read.
    pub fn queue_mark_feed_read(
        &self,
        source_id: SourceId,
        feed_id: u64,
        finished: impl FnOnce() + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::FeedMarkRead { feed_id },
            Box::new(move |_| finished()),
        )
    }

    /// Clears the log entries attributed to a feed.
    pub fn queue_clear_feed_logs(
        &self,
        source_id: SourceId,
        feed_id: u64,
        finished: impl FnOnce() + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::FeedClearLogs { feed_id },
            Box::new(move |_| finished()),
        )
    }

    // -------------------------------------------------------------------------
    // Folder operations
    // -------------------------------------------------------------------------

    /// Adds a folder under `parent_id` (0 for the source root).
    pub fn queue_add_folder(
        &self,
        source_id: SourceId,
        title: impl Into<String>,
        parent_id: u64,
        finished: impl FnOnce() + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::FolderAdd {
                title: title.into(),
                parent_id,
            },
            Box::new(move |_| finished()),
        )
    }

    /// Removes a folder, its subfolders and their feeds.
    pub fn queue_remove_folder(
        &self,
        source_id: SourceId,
        folder_id: u64,
        finished: impl FnOnce() + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::FolderRemove { folder_id },
            Box::new(move |_| finished()),
        )
    }

    /// Marks every post under a folder as read.
    pub fn queue_mark_folder_read(
        &self,
        source_id: SourceId,
        folder_id: u64,
        finished: impl FnOnce(SourceId) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::FolderMarkRead { folder_id },
            Box::new(move |outcome| {
                if let TaskOutcome::SourceTouched { source_id } = outcome {
                    finished(source_id);
                }
            }),
        )
    }

    /// Clears the log entries attributed to feeds under a folder.
    pub fn queue_clear_folder_logs(
        &self,
        source_id: SourceId,
        folder_id: u64,
        finished: impl FnOnce() + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::FolderClearLogs { folder_id },
            Box::new(move |_| finished()),
        )
    }

    // -------------------------------------------------------------------------
    // Source operations
    // -------------------------------------------------------------------------

    /// Marks every post in a source as read.
    pub fn queue_mark_source_read(
        &self,
        source_id: SourceId,
        finished: impl FnOnce(SourceId) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::SourceMarkRead,
            Box::new(move |outcome| {
                if let TaskOutcome::SourceTouched { source_id } = outcome {
                    finished(source_id);
                }
            }),
        )
    }

    /// Clears the source's entire log.
    pub fn queue_clear_source_logs(
        &self,
        source_id: SourceId,
        finished: impl FnOnce() + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::SourceClearLogs,
            Box::new(move |_| finished()),
        )
    }

    /// Fetches a source overview at the given depth.
    pub fn queue_get_source(
        &self,
        source_id: SourceId,
        depth: FetchDepth,
        finished: impl FnOnce(SourceId, serde_json::Value) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::SourceGet { depth },
            Box::new(move |outcome| {
                if let TaskOutcome::Overview {
                    source_id,
                    overview,
                } = outcome
                {
                    finished(source_id, overview);
                }
            }),
        )
    }

    /// Fetches the source's structured status object.
    pub fn queue_get_source_status(
        &self,
        source_id: SourceId,
        finished: impl FnOnce(SourceId, serde_json::Value) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::SourceGetStatus,
            Box::new(move |outcome| {
                if let TaskOutcome::Status { source_id, status } = outcome {
                    finished(source_id, status);
                }
            }),
        )
    }

    /// Fetches the set of flag colors in use across the source.
    pub fn queue_get_used_flag_colors(
        &self,
        source_id: SourceId,
        finished: impl FnOnce(SourceId, HashSet<FlagColor>) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::SourceGetUsedFlagColors,
            Box::new(move |outcome| {
                if let TaskOutcome::UsedFlagColors { source_id, colors } = outcome {
                    finished(source_id, colors);
                }
            }),
        )
    }

    // -------------------------------------------------------------------------
    // Script folder operations
    // -------------------------------------------------------------------------

    /// Adds a script folder; the callback conveys which source to refresh.
    pub fn queue_add_script_folder(
        &self,
        source_id: SourceId,
        title: impl Into<String>,
        show_total: bool,
        show_unread: bool,
        finished: impl FnOnce(SourceId) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::ScriptFolderAdd {
                title: title.into(),
                show_total,
                show_unread,
            },
            Box::new(move |outcome| {
                if let TaskOutcome::SourceTouched { source_id } = outcome {
                    finished(source_id);
                }
            }),
        )
    }

    /// Updates a script folder's title and display flags.
    pub fn queue_update_script_folder(
        &self,
        source_id: SourceId,
        script_folder_id: u64,
        title: impl Into<String>,
        show_total: bool,
        show_unread: bool,
        finished: impl FnOnce(SourceId, u64) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::ScriptFolderUpdate {
                script_folder_id,
                title: title.into(),
                show_total,
                show_unread,
            },
            Box::new(move |outcome| {
                if let TaskOutcome::ScriptFolderUpdated {
                    source_id,
                    script_folder_id,
                } = outcome
                {
                    finished(source_id, script_folder_id);
                }
            }),
        )
    }

    /// Removes a script folder.
    pub fn queue_remove_script_folder(
        &self,
        source_id: SourceId,
        script_folder_id: u64,
        finished: impl FnOnce(SourceId, u64) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::ScriptFolderRemove { script_folder_id },
            Box::new(move |outcome| {
                if let TaskOutcome::ScriptFolderRemoved {
                    source_id,
                    script_folder_id,
                } = outcome
                {
                    finished(source_id, script_folder_id);
                }
            }),
        )
    }

    // -------------------------------------------------------------------------
    // Script operations
    // -------------------------------------------------------------------------

    /// Removes a script registration.
    pub fn queue_remove_script(
        &self,
        source_id: SourceId,
        script_id: u64,
        finished: impl FnOnce(SourceId, u64) + Send + 'static,
    ) -> TaskTicket {
        self.submit(
            source_id,
            TaskKind::ScriptRemove { script_id },
            Box::new(move |outcome| {
                if let TaskOutcome::ScriptRemoved {
                    source_id,
                    script_id,
                } = outcome
                {
                    finished(source_id, script_id);
                }
            }),
        )
    }
}

impl std::fmt::Debug for AgentSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSubmitter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_submit_closed_channel_returns_none() {
        let (tx, rx) = mpsc::channel(1);
        let submitter = AgentSubmitter::new(tx);
        drop(rx);

        let result = submitter.try_submit(
            SourceId::new(1),
            TaskKind::SourceMarkRead,
            Box::new(|_| {}),
        );
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_try_submit_enqueues_task() {
        let (tx, mut rx) = mpsc::channel(4);
        let submitter = AgentSubmitter::new(tx);

        let ticket = submitter
            .try_submit(
                SourceId::new(1),
                TaskKind::FeedRemove { feed_id: 2 },
                Box::new(|_| {}),
            )
            .unwrap();

        let task = rx.recv().await.unwrap();
        assert_eq!(task.id(), ticket.id());
        assert_eq!(task.kind_name(), "FeedRemove");
        assert_eq!(task.source_id(), SourceId::new(1));
        assert!(!ticket.is_done());
    }

    #[tokio::test]
    async fn test_queue_method_shapes_callback() {
        let (tx, mut rx) = mpsc::channel(4);
        let submitter = AgentSubmitter::new(tx);

        let _ticket = submitter.queue_remove_script(SourceId::new(3), 77, |source_id, script_id| {
            assert_eq!(source_id, SourceId::new(3));
            assert_eq!(script_id, 77);
        });

        let task = rx.recv().await.unwrap();
        assert_eq!(task.kind_name(), "ScriptRemove");
    }
}
