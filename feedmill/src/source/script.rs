//! Script entity.
//!
//! Scripts run against incoming posts. The engine only stores their
//! registration (filename, enablement, trigger events, optional feed
//! filter); execution is handled by the scripting layer.

use std::collections::BTreeSet;

use serde::Serialize;

/// Events a script can be triggered on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptEvent {
    NewPost,
    UpdatePost,
}

impl ScriptEvent {
    /// Returns the identifier used in persisted registrations.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptEvent::NewPost => "newpost",
            ScriptEvent::UpdatePost => "updatepost",
        }
    }

    /// Parses a persisted identifier.
    pub fn from_str_opt(value: &str) -> Option<ScriptEvent> {
        match value {
            "newpost" => Some(ScriptEvent::NewPost),
            "updatepost" => Some(ScriptEvent::UpdatePost),
            _ => None,
        }
    }
}

/// A registered post-processing script.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub id: u64,
    pub filename: String,
    pub is_enabled: bool,
    pub run_on_events: BTreeSet<ScriptEvent>,
    /// Restricts the script to these feeds; `None` means all feeds.
    #[serde(rename = "runOnFeedIDs", skip_serializing_if = "Option::is_none")]
    pub run_on_feed_ids: Option<BTreeSet<u64>>,
}

impl Script {
    pub fn new(
        id: u64,
        filename: impl Into<String>,
        is_enabled: bool,
        run_on_events: BTreeSet<ScriptEvent>,
        run_on_feed_ids: Option<BTreeSet<u64>>,
    ) -> Self {
        Self {
            id,
            filename: filename.into(),
            is_enabled,
            run_on_events,
            run_on_feed_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_identifiers() {
        assert_eq!(ScriptEvent::NewPost.as_str(), "newpost");
        assert_eq!(ScriptEvent::UpdatePost.as_str(), "updatepost");
        assert_eq!(
            ScriptEvent::from_str_opt("newpost"),
            Some(ScriptEvent::NewPost)
        );
        assert_eq!(ScriptEvent::from_str_opt("deletepost"), None);
    }

    #[test]
    fn test_json_field_names() {
        let script = Script::new(
            5,
            "dedupe.lua",
            true,
            BTreeSet::from([ScriptEvent::NewPost]),
            Some(BTreeSet::from([1, 2])),
        );
        let json = serde_json::to_value(&script).unwrap();

        assert_eq!(json["id"], 5);
        assert_eq!(json["filename"], "dedupe.lua");
        assert_eq!(json["isEnabled"], true);
        assert_eq!(json["runOnEvents"][0], "newpost");
        assert_eq!(json["runOnFeedIDs"][0], 1);
    }

    #[test]
    fn test_json_omits_absent_feed_filter() {
        let script = Script::new(1, "all.lua", false, BTreeSet::new(), None);
        let json = serde_json::to_value(&script).unwrap();
        assert!(json.get("runOnFeedIDs").is_none());
    }
}
