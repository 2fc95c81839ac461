//! Per-source operation log.
//!
//! Every source keeps a log of noteworthy events (refresh errors, contained
//! task failures, script output). Entries carry the numeric level scheme the
//! persistence layer and remote API agreed on, so the values are part of the
//! stable contract and not a plain enum discriminant.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Log severity, spaced out so intermediate levels can be added without
/// renumbering persisted entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Returns the stable numeric value for this level.
    pub fn as_u64(&self) -> u64 {
        match self {
            LogLevel::Debug => 100,
            LogLevel::Info => 200,
            LogLevel::Warning => 300,
            LogLevel::Error => 400,
        }
    }

    /// Looks up a level by its numeric value.
    pub fn from_u64(value: u64) -> Option<LogLevel> {
        match value {
            100 => Some(LogLevel::Debug),
            200 => Some(LogLevel::Info),
            300 => Some(LogLevel::Warning),
            400 => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// A single entry in a source's log.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(serialize_with = "serialize_level")]
    pub level: LogLevel,
    pub message: String,
    #[serde(rename = "feedID", skip_serializing_if = "Option::is_none")]
    pub feed_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_title: Option<String>,
}

fn serialize_level<S: serde::Serializer>(level: &LogLevel, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(level.as_u64())
}

impl LogEntry {
    /// Creates an entry timestamped now.
    pub fn new(id: u64, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            level,
            message: message.into(),
            feed_id: None,
            feed_title: None,
        }
    }

    /// Attributes this entry to a feed.
    pub fn with_feed(mut self, feed_id: u64, feed_title: impl Into<String>) -> Self {
        self.feed_id = Some(feed_id);
        self.feed_title = Some(feed_title.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_numeric_values() {
        assert_eq!(LogLevel::Debug.as_u64(), 100);
        assert_eq!(LogLevel::Info.as_u64(), 200);
        assert_eq!(LogLevel::Warning.as_u64(), 300);
        assert_eq!(LogLevel::Error.as_u64(), 400);
    }

    #[test]
    fn test_level_round_trip() {
        for level in [
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warning,
            LogLevel::Error,
        ] {
            assert_eq!(LogLevel::from_u64(level.as_u64()), Some(level));
        }
        assert_eq!(LogLevel::from_u64(250), None);
    }

    #[test]
    fn test_entry_json_fields() {
        let entry = LogEntry::new(7, LogLevel::Error, "boom").with_feed(3, "Example Feed");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["level"], 400);
        assert_eq!(json["message"], "boom");
        assert_eq!(json["feedID"], 3);
        assert_eq!(json["feedTitle"], "Example Feed");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_entry_json_omits_absent_feed() {
        let entry = LogEntry::new(1, LogLevel::Info, "ok");
        let json = serde_json::to_value(&entry).unwrap();

        assert!(json.get("feedID").is_none());
        assert!(json.get("feedTitle").is_none());
    }
}
