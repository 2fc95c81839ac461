//! Error types for source operations.

use thiserror::Error;

/// Operational failures raised by entity operations inside a task body.
///
/// These never escape the agent system: the failure containment wrapper
/// records them on the owning source's log and completes the task normally.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A title argument was empty or all-whitespace.
    #[error("title must not be empty")]
    EmptyTitle,

    /// A script folder with this title already exists in the source.
    #[error("a script folder titled '{0}' already exists")]
    DuplicateScriptFolderTitle(String),
}
