//! Folder entity.

use serde::Serialize;

/// A folder grouping feeds (and nested folders) within a source.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: u64,
    pub title: String,
    /// Parent folder id; 0 means the source root.
    pub parent: u64,
    pub sort_order: u64,
}

impl Folder {
    pub fn new(id: u64, title: impl Into<String>, parent: u64) -> Self {
        Self {
            id,
            title: title.into(),
            parent,
            sort_order: 0,
        }
    }
}
