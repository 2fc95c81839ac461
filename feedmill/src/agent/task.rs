//! Task: an immutable description of one unit of background work.
//!
//! A task captures an operation kind with its parameters, the id of the
//! owning source, and a completion callback. Everything is fixed at
//! construction; the only state transition is `done: false → true`, exactly
//! once, after the callback has fired or the task was abandoned because its
//! source no longer exists.
//!
//! Execution resolves the source id through the [`SourceRegistry`] at run
//! time — handles are never cached at submission time, so a task submitted
//! against a source that is removed before it runs degrades to a silent
//! no-op rather than touching freed state.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::source::{
    FetchDepth, FlagColor, Source, SourceError, SourceId, SourceRegistry,
};

use super::handle::TaskTicket;

/// Global counter for generating unique task IDs.
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

// =============================================================================
// Task Id
// =============================================================================

/// Unique identifier for a submitted task.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a unique auto-generated task id of the form `task-{counter}`.
    pub(crate) fn auto() -> Self {
        let counter = TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("task-{}", counter))
    }

    /// Returns the string value of this task id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Task Kind
// =============================================================================

/// The operation a task performs, with its parameters captured.
///
/// The enum is closed on purpose: an unknown kind is unrepresentable, so the
/// dispatcher never needs an "unexpected operation" error path.
#[derive(Clone, Debug)]
pub enum TaskKind {
    FeedRemove {
        feed_id: u64,
    },
    FeedMarkRead {
        feed_id: u64,
    },
    FeedClearLogs {
        feed_id: u64,
    },
    FolderAdd {
        title: String,
        parent_id: u64,
    },
    FolderRemove {
        folder_id: u64,
    },
    FolderMarkRead {
        folder_id: u64,
    },
    FolderClearLogs {
        folder_id: u64,
    },
    SourceMarkRead,
    SourceClearLogs,
    SourceGet {
        depth: FetchDepth,
    },
    SourceGetStatus,
    SourceGetUsedFlagColors,
    ScriptFolderAdd {
        title: String,
        show_total: bool,
        show_unread: bool,
    },
    ScriptFolderUpdate {
        script_folder_id: u64,
        title: String,
        show_total: bool,
        show_unread: bool,
    },
    ScriptFolderRemove {
        script_folder_id: u64,
    },
    ScriptRemove {
        script_id: u64,
    },
}

impl TaskKind {
    /// Returns a short name for logging and telemetry.
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::FeedRemove { .. } => "FeedRemove",
            TaskKind::FeedMarkRead { .. } => "FeedMarkRead",
            TaskKind::FeedClearLogs { .. } => "FeedClearLogs",
            TaskKind::FolderAdd { .. } => "FolderAdd",
            TaskKind::FolderRemove { .. } => "FolderRemove",
            TaskKind::FolderMarkRead { .. } => "FolderMarkRead",
            TaskKind::FolderClearLogs { .. } => "FolderClearLogs",
            TaskKind::SourceMarkRead => "SourceMarkRead",
            TaskKind::SourceClearLogs => "SourceClearLogs",
            TaskKind::SourceGet { .. } => "SourceGet",
            TaskKind::SourceGetStatus => "SourceGetStatus",
            TaskKind::SourceGetUsedFlagColors => "SourceGetUsedFlagColors",
            TaskKind::ScriptFolderAdd { .. } => "ScriptFolderAdd",
            TaskKind::ScriptFolderUpdate { .. } => "ScriptFolderUpdate",
            TaskKind::ScriptFolderRemove { .. } => "ScriptFolderRemove",
            TaskKind::ScriptRemove { .. } => "ScriptRemove",
        }
    }

    /// Runs the kind-specific body against a resolved source.
    ///
    /// Absence of the *target* entity (feed, folder, script, …) is harmless:
    /// the mutation no-ops and the success outcome is still produced, so the
    /// completion callback fires either way. Only genuine operational
    /// failures surface as `Err`.
    fn execute(&self, source: &Source) -> Result<TaskOutcome, SourceError> {
        let source_id = source.id();
        match self {
            TaskKind::FeedRemove { feed_id } => {
                source.remove_feed(*feed_id);
                Ok(TaskOutcome::None)
            }
            TaskKind::FeedMarkRead { feed_id } => {
                source.mark_feed_read(*feed_id);
                Ok(TaskOutcome::None)
            }
            TaskKind::FeedClearLogs { feed_id } => {
                source.clear_feed_logs(*feed_id);
                Ok(TaskOutcome::None)
            }
            TaskKind::FolderAdd { title, parent_id } => {
                source.add_folder(title.clone(), *parent_id)?;
                Ok(TaskOutcome::None)
            }
            TaskKind::FolderRemove { folder_id } => {
                source.remove_folder(*folder_id);
                Ok(TaskOutcome::None)
            }
            TaskKind::FolderMarkRead { folder_id } => {
                source.mark_folder_read(*folder_id);
                Ok(TaskOutcome::SourceTouched { source_id })
            }
            TaskKind::FolderClearLogs { folder_id } => {
                source.clear_folder_logs(*folder_id);
                Ok(TaskOutcome::None)
            }
            TaskKind::SourceMarkRead => {
                source.mark_all_as_read();
                Ok(TaskOutcome::SourceTouched { source_id })
            }
            TaskKind::SourceClearLogs => {
                source.clear_logs();
                Ok(TaskOutcome::None)
            }
            TaskKind::SourceGet { depth } => Ok(TaskOutcome::Overview {
                source_id,
                overview: source.to_json(*depth),
            }),
            TaskKind::SourceGetStatus => Ok(TaskOutcome::Status {
                source_id,
                status: source.get_status(),
            }),
            TaskKind::SourceGetUsedFlagColors => Ok(TaskOutcome::UsedFlagColors {
                source_id,
                colors: source.get_used_flag_colors(),
            }),
            TaskKind::ScriptFolderAdd {
                title,
                show_total,
                show_unread,
            } => {
                source.add_script_folder(title.clone(), *show_total, *show_unread)?;
                Ok(TaskOutcome::SourceTouched { source_id })
            }
            TaskKind::ScriptFolderUpdate {
                script_folder_id,
                title,
                show_total,
                show_unread,
            } => {
                source.update_script_folder(
                    *script_folder_id,
                    title.clone(),
                    *show_total,
                    *show_unread,
                )?;
                Ok(TaskOutcome::ScriptFolderUpdated {
                    source_id,
                    script_folder_id: *script_folder_id,
                })
            }
            TaskKind::ScriptFolderRemove { script_folder_id } => {
                source.remove_script_folder(*script_folder_id);
                Ok(TaskOutcome::ScriptFolderRemoved {
                    source_id,
                    script_folder_id: *script_folder_id,
                })
            }
            TaskKind::ScriptRemove { script_id } => {
                source.remove_script(*script_id);
                Ok(TaskOutcome::ScriptRemoved {
                    source_id,
                    script_id: *script_id,
                })
            }
        }
    }

    /// The outcome delivered when the body failed and was contained.
    ///
    /// Carries the identifiers that were fixed at submission and empty
    /// payloads otherwise; the real result of the failed operation surfaces
    /// later through the source's own log.
    fn contained_outcome(&self, source_id: SourceId) -> TaskOutcome {
        match self {
            TaskKind::FeedRemove { .. }
            | TaskKind::FeedMarkRead { .. }
            | TaskKind::FeedClearLogs { .. }
            | TaskKind::FolderAdd { .. }
            | TaskKind::FolderRemove { .. }
            | TaskKind::FolderClearLogs { .. }
            | TaskKind::SourceClearLogs => TaskOutcome::None,
            TaskKind::FolderMarkRead { .. }
            | TaskKind::SourceMarkRead
            | TaskKind::ScriptFolderAdd { .. } => TaskOutcome::SourceTouched { source_id },
            TaskKind::SourceGet { .. } => TaskOutcome::Overview {
                source_id,
                overview: serde_json::Value::Null,
            },
            TaskKind::SourceGetStatus => TaskOutcome::Status {
                source_id,
                status: serde_json::Value::Null,
            },
            TaskKind::SourceGetUsedFlagColors => TaskOutcome::UsedFlagColors {
                source_id,
                colors: HashSet::new(),
            },
            TaskKind::ScriptFolderUpdate {
                script_folder_id, ..
            } => TaskOutcome::ScriptFolderUpdated {
                source_id,
                script_folder_id: *script_folder_id,
            },
            TaskKind::ScriptFolderRemove { script_folder_id } => {
                TaskOutcome::ScriptFolderRemoved {
                    source_id,
                    script_folder_id: *script_folder_id,
                }
            }
            TaskKind::ScriptRemove { script_id } => TaskOutcome::ScriptRemoved {
                source_id,
                script_id: *script_id,
            },
        }
    }
}

// =============================================================================
// Task Outcome
// =============================================================================

/// Kind-specific result data delivered to the completion callback.
#[derive(Debug)]
pub enum TaskOutcome {
    /// No payload.
    None,

    /// Conveys which source the consumer should refresh.
    SourceTouched { source_id: SourceId },

    /// Source overview object from a `SourceGet` task.
    Overview {
        source_id: SourceId,
        overview: serde_json::Value,
    },

    /// Structured status object from a `SourceGetStatus` task.
    Status {
        source_id: SourceId,
        status: serde_json::Value,
    },

    /// Flag colors in use across the source.
    UsedFlagColors {
        source_id: SourceId,
        colors: HashSet<FlagColor>,
    },

    ScriptFolderUpdated {
        source_id: SourceId,
        script_folder_id: u64,
    },

    ScriptFolderRemoved {
        source_id: SourceId,
        script_folder_id: u64,
    },

    ScriptRemoved {
        source_id: SourceId,
        script_id: u64,
    },
}

/// Completion callback; invoked at most once, never before the body ends.
pub type OnComplete = Box<dyn FnOnce(TaskOutcome) + Send + 'static>;

/// How a task run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskDisposition {
    /// Body ran and the callback fired.
    Completed,

    /// Source was gone at execution time; nothing ran, no callback.
    Skipped,

    /// Body failed; the failure was logged on the source and the callback
    /// fired with the kind's fallback outcome.
    ContainedFailure,
}

impl std::fmt::Display for TaskDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "Completed"),
            Self::Skipped => write!(f, "Skipped"),
            Self::ContainedFailure => write!(f, "ContainedFailure"),
        }
    }
}

// =============================================================================
// Task
// =============================================================================

/// One queued unit of background work.
pub struct Task {
    id: TaskId,
    source_id: SourceId,
    kind: TaskKind,
    on_complete: OnComplete,
    done: Arc<AtomicBool>,
}

impl Task {
    /// Creates a task with all parameters fixed.
    pub fn new(source_id: SourceId, kind: TaskKind, on_complete: OnComplete) -> Self {
        Self {
            id: TaskId::auto(),
            source_id,
            kind,
            on_complete,
            done: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }

    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Returns the observer handle for this task.
    pub fn ticket(&self) -> TaskTicket {
        TaskTicket::new(self.id.clone(), Arc::clone(&self.done))
    }

    pub(crate) fn done_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.done)
    }

    /// Executes the task: resolve, run the body under failure containment,
    /// deliver the callback, mark done.
    pub(crate) fn run(self, registry: &SourceRegistry) -> TaskDisposition {
        let Some(source) = registry.get(self.source_id) else {
            // The caller's source is gone; there is nothing meaningful to
            // report, so the callback is not invoked.
            tracing::debug!(
                task_id = %self.id,
                kind = self.kind.name(),
                source_id = %self.source_id,
                "Source no longer exists, skipping task"
            );
            self.done.store(true, Ordering::Release);
            return TaskDisposition::Skipped;
        };

        source.clear_last_error();
        let result = self.kind.execute(&source);

        let disposition = match &result {
            Ok(_) => TaskDisposition::Completed,
            Err(error) => {
                source.log_error(format!("{} ({})", error, self.kind.name()));
                tracing::error!(
                    task_id = %self.id,
                    kind = self.kind.name(),
                    source_id = %self.source_id,
                    error = %error,
                    "Task body failed, containing"
                );
                TaskDisposition::ContainedFailure
            }
        };

        let outcome = result.unwrap_or_else(|_| self.kind.contained_outcome(self.source_id));
        (self.on_complete)(outcome);
        self.done.store(true, Ordering::Release);

        disposition
    }

    /// Marks the task done without running it or invoking the callback.
    ///
    /// Used when the dispatcher drops queued tasks at shutdown, so ticket
    /// observers are never left polling forever.
    pub(crate) fn abandon(self) {
        self.done.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("source_id", &self.source_id)
            .field("kind", &self.kind.name())
            .field("done", &self.done.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FetchDepth;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn registry_with_source() -> (SourceRegistry, SourceId, u64) {
        let registry = SourceRegistry::new();
        let source_id = SourceId::new(1);
        let source = Source::new(source_id, "Local");
        let feed_id = source.add_feed("https://example.com/a.xml", 0, "Feed A");
        registry.register(source);
        (registry, source_id, feed_id)
    }

    #[test]
    fn test_task_id_auto_is_unique() {
        let a = TaskId::auto();
        let b = TaskId::auto();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("task-"));
    }

    #[test]
    fn test_run_remove_feed_invokes_callback_once() {
        let (registry, source_id, feed_id) = registry_with_source();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = Arc::clone(&calls);
        let task = Task::new(
            source_id,
            TaskKind::FeedRemove { feed_id },
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let ticket = task.ticket();

        assert!(!ticket.is_done());
        let disposition = task.run(&registry);

        assert_eq!(disposition, TaskDisposition::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ticket.is_done());
        assert!(registry
            .get(source_id)
            .unwrap()
            .get_feed(feed_id, FetchDepth::None)
            .is_none());
    }

    #[test]
    fn test_run_skips_when_source_absent() {
        let (registry, source_id, feed_id) = registry_with_source();
        registry.unregister(source_id);

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let task = Task::new(
            source_id,
            TaskKind::FeedRemove { feed_id },
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let ticket = task.ticket();

        let disposition = task.run(&registry);

        assert_eq!(disposition, TaskDisposition::Skipped);
        assert_eq!(calls.load(Ordering::SeqCst), 0, "callback must not fire");
        assert!(ticket.is_done());
    }

    #[test]
    fn test_run_absent_target_still_calls_back() {
        let (registry, source_id, _feed_id) = registry_with_source();

        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let task = Task::new(
            source_id,
            TaskKind::ScriptRemove { script_id: 999 },
            Box::new(move |outcome| {
                *seen_clone.lock().unwrap() = Some(outcome);
            }),
        );

        assert_eq!(task.run(&registry), TaskDisposition::Completed);

        let outcome = seen.lock().unwrap().take();
        match outcome {
            Some(TaskOutcome::ScriptRemoved {
                source_id: sid,
                script_id,
            }) => {
                assert_eq!(sid, source_id);
                assert_eq!(script_id, 999);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_run_contains_body_failure() {
        let (registry, source_id, _feed_id) = registry_with_source();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        // Empty title is an operational failure inside the body.
        let task = Task::new(
            source_id,
            TaskKind::ScriptFolderAdd {
                title: "   ".to_string(),
                show_total: false,
                show_unread: false,
            },
            Box::new(move |outcome| {
                assert!(matches!(outcome, TaskOutcome::SourceTouched { .. }));
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let ticket = task.ticket();

        let disposition = task.run(&registry);

        assert_eq!(disposition, TaskDisposition::ContainedFailure);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(ticket.is_done());

        // The failure is visible through the source's own log surface.
        let source = registry.get(source_id).unwrap();
        assert!(source.last_error().unwrap().contains("title"));
        assert!(source
            .logs()
            .iter()
            .any(|entry| entry.message.contains("ScriptFolderAdd")));
    }

    #[test]
    fn test_abandon_sets_done_without_callback() {
        let (_registry, source_id, feed_id) = registry_with_source();

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let task = Task::new(
            source_id,
            TaskKind::FeedRemove { feed_id },
            Box::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            }),
        );
        let ticket = task.ticket();

        task.abandon();

        assert!(ticket.is_done());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TaskKind::FeedRemove { feed_id: 1 }.name(), "FeedRemove");
        assert_eq!(TaskKind::SourceMarkRead.name(), "SourceMarkRead");
        assert_eq!(
            TaskKind::SourceGet {
                depth: FetchDepth::Data
            }
            .name(),
            "SourceGet"
        );
    }
}
