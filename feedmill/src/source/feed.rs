//! Feed entity.
//!
//! A feed belongs to exactly one source and (optionally) one folder within
//! it. Post content itself is fetched and stored elsewhere; the engine keeps
//! the aggregate counters the UI and the agent operations need.

use std::collections::BTreeMap;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::flag::FlagColor;

/// Statistic keys reported for a feed, in JSON identifier form.
pub const FEED_STATISTIC_KEYS: [&str; 4] =
    ["postCount", "flaggedPostCount", "oldestPost", "newestPost"];

/// A subscribed feed within a source.
///
/// The serialized field names are a stable contract with API consumers.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub id: u64,
    pub url: String,
    /// Owning folder id; 0 means the source root.
    pub folder: u64,
    pub title: String,
    pub sort_order: u64,
    pub unread_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    /// Populated only when looked up with `FetchDepth::Statistics`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BTreeMap<String, String>>,

    // Post aggregates; maintained by the (out-of-scope) refresh layer and
    // seeded directly in tests and demos.
    #[serde(skip)]
    pub total_post_count: u64,
    #[serde(skip)]
    pub flagged_post_count: u64,
    #[serde(skip)]
    pub oldest_post: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub newest_post: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub used_flag_colors: HashSet<FlagColor>,
}

impl Feed {
    /// Creates a feed with empty aggregates.
    pub fn new(id: u64, url: impl Into<String>, folder: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            folder,
            title: title.into(),
            sort_order: 0,
            unread_count: 0,
            last_refresh_error: None,
            last_checked: None,
            statistics: None,
            total_post_count: 0,
            flagged_post_count: 0,
            oldest_post: None,
            newest_post: None,
            used_flag_colors: HashSet::new(),
        }
    }

    /// Builds the statistics map with the stable JSON identifiers as keys.
    ///
    /// Timestamps render as RFC 3339; absent values render as empty strings,
    /// matching what consumers already expect from the status surface.
    pub fn build_statistics(&self) -> BTreeMap<String, String> {
        let fmt =
            |ts: Option<DateTime<Utc>>| ts.map(|t| t.to_rfc3339()).unwrap_or_default();
        BTreeMap::from([
            ("postCount".to_string(), self.total_post_count.to_string()),
            (
                "flaggedPostCount".to_string(),
                self.flagged_post_count.to_string(),
            ),
            ("oldestPost".to_string(), fmt(self.oldest_post)),
            ("newestPost".to_string(), fmt(self.newest_post)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_json_field_names() {
        let mut feed = Feed::new(4, "https://example.com/rss.xml", 0, "Example");
        feed.sort_order = 2;
        feed.unread_count = 11;
        feed.last_refresh_error = Some("timeout".to_string());

        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["url"], "https://example.com/rss.xml");
        assert_eq!(json["folder"], 0);
        assert_eq!(json["title"], "Example");
        assert_eq!(json["sortOrder"], 2);
        assert_eq!(json["unreadCount"], 11);
        assert_eq!(json["lastRefreshError"], "timeout");
        // Aggregates are internal, not part of the wire contract.
        assert!(json.get("totalPostCount").is_none());
        assert!(json.get("statistics").is_none());
    }

    #[test]
    fn test_statistics_keys() {
        let mut feed = Feed::new(1, "https://example.com/a.xml", 0, "A");
        feed.total_post_count = 40;
        feed.flagged_post_count = 3;
        feed.oldest_post = Some(Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap());

        let stats = feed.build_statistics();
        for key in FEED_STATISTIC_KEYS {
            assert!(stats.contains_key(key), "missing statistic {key}");
        }
        assert_eq!(stats["postCount"], "40");
        assert_eq!(stats["flaggedPostCount"], "3");
        assert!(stats["oldestPost"].starts_with("2023-01-02T03:04:05"));
        assert_eq!(stats["newestPost"], "");
    }
}
