//! Script folder entity.
//!
//! Script folders are virtual collections that scripts assign posts into;
//! they are not part of the feed/folder hierarchy. The `show_total` and
//! `show_unread` flags drive badge display in the presentation layer and
//! travel with the entity.

use serde::Serialize;

/// A script-populated virtual folder within a source.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptFolder {
    pub id: u64,
    pub title: String,
    pub show_total: bool,
    pub show_unread: bool,
    pub total_post_count: u64,
    pub total_unread_count: u64,
}

impl ScriptFolder {
    pub fn new(id: u64, title: impl Into<String>, show_total: bool, show_unread: bool) -> Self {
        Self {
            id,
            title: title.into(),
            show_total,
            show_unread,
            total_post_count: 0,
            total_unread_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_field_names() {
        let folder = ScriptFolder::new(2, "Favorites", true, false);
        let json = serde_json::to_value(&folder).unwrap();

        assert_eq!(json["id"], 2);
        assert_eq!(json["title"], "Favorites");
        assert_eq!(json["showTotal"], true);
        assert_eq!(json["showUnread"], false);
        assert_eq!(json["totalPostCount"], 0);
        assert_eq!(json["totalUnreadCount"], 0);
    }
}
