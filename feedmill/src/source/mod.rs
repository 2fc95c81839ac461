//! Sources and their owned entities.
//!
//! A source is a configured feed-aggregation origin owning feeds, folders,
//! script folders and scripts. It is the unit of serialization for the agent
//! system: entity mutations are only ever performed from inside a task body
//! while that task holds the source's serialization slot, so the entity
//! layer itself needs no cross-operation coordination beyond a plain lock
//! around its state.
//!
//! Lookups take a [`FetchDepth`] hint and return `Option` — an id that no
//! longer exists is a valid, non-error condition.

mod error;
pub mod feed;
pub mod flag;
pub mod folder;
pub mod log;
pub mod registry;
pub mod script;
pub mod script_folder;

pub use error::SourceError;
pub use feed::Feed;
pub use flag::FlagColor;
pub use folder::Folder;
pub use log::{LogEntry, LogLevel};
pub use registry::SourceRegistry;
pub use script::{Script, ScriptEvent};
pub use script_folder::ScriptFolder;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

// =============================================================================
// Source Id
// =============================================================================

/// Unique identifier of a configured source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(u64);

impl SourceId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SourceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

// =============================================================================
// Fetch Depth
// =============================================================================

/// How much data a lookup should materialize.
///
/// `None` returns identity fields only, `Data` includes owned rows and
/// counters, `Statistics` additionally computes aggregate statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum FetchDepth {
    #[default]
    None,
    Data,
    Statistics,
}

// =============================================================================
// Source
// =============================================================================

/// Statistic keys reported for a source, in JSON identifier form.
pub const SOURCE_STATISTIC_KEYS: [&str; 5] = [
    "feedCount",
    "postCount",
    "flaggedPostCount",
    "oldestPost",
    "newestPost",
];

/// Interior state of a source; guarded by the `Source` lock.
struct SourceState {
    title: String,
    sort_order: u64,
    feeds: BTreeMap<u64, Feed>,
    folders: BTreeMap<u64, Folder>,
    script_folders: BTreeMap<u64, ScriptFolder>,
    scripts: BTreeMap<u64, Script>,
    logs: Vec<LogEntry>,
    last_error: Option<String>,
    highest_post_id: u64,
    next_entity_id: u64,
    next_log_id: u64,
}

impl SourceState {
    fn alloc_entity_id(&mut self) -> u64 {
        self.next_entity_id += 1;
        self.next_entity_id
    }

    fn alloc_log_id(&mut self) -> u64 {
        self.next_log_id += 1;
        self.next_log_id
    }

    /// The given folder plus all folders nested below it.
    fn folder_subtree(&self, folder_id: u64) -> BTreeSet<u64> {
        let mut subtree = BTreeSet::from([folder_id]);
        loop {
            let before = subtree.len();
            for folder in self.folders.values() {
                if subtree.contains(&folder.parent) {
                    subtree.insert(folder.id);
                }
            }
            if subtree.len() == before {
                break;
            }
        }
        subtree
    }
}

/// A live source handle.
///
/// Shared as `Arc<Source>` through the [`SourceRegistry`]. All methods take
/// `&self`; mutation methods assume the caller holds the per-source
/// serialization slot, and the operation gauge makes violations of that
/// assumption observable.
pub struct Source {
    id: SourceId,
    state: RwLock<SourceState>,
    /// Emulated backing-store round-trip time applied inside operations.
    latency: Mutex<Option<Duration>>,
    ops_in_flight: AtomicUsize,
    peak_ops: AtomicUsize,
}

/// RAII guard for the operation gauge.
struct OpGuard<'a> {
    source: &'a Source,
}

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.source.ops_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Source {
    /// Creates an empty source.
    pub fn new(id: SourceId, title: impl Into<String>) -> Self {
        Self {
            id,
            state: RwLock::new(SourceState {
                title: title.into(),
                sort_order: 0,
                feeds: BTreeMap::new(),
                folders: BTreeMap::new(),
                script_folders: BTreeMap::new(),
                scripts: BTreeMap::new(),
                logs: Vec::new(),
                last_error: None,
                highest_post_id: 0,
                next_entity_id: 0,
                next_log_id: 0,
            }),
            latency: Mutex::new(None),
            ops_in_flight: AtomicUsize::new(0),
            peak_ops: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn title(&self) -> String {
        self.state.read().unwrap().title.clone()
    }

    /// Emulates backing-store round-trip time inside every operation.
    ///
    /// Used by tests and demos to make scheduling behavior observable.
    pub fn set_operation_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Highest number of operations ever observed in flight at once.
    ///
    /// Under the per-source serialization discipline this never exceeds 1.
    pub fn peak_operations_in_flight(&self) -> usize {
        self.peak_ops.load(Ordering::SeqCst)
    }

    fn begin_op(&self) -> OpGuard<'_> {
        let in_flight = self.ops_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_ops.fetch_max(in_flight, Ordering::SeqCst);

        let latency = *self.latency.lock().unwrap();
        if let Some(delay) = latency {
            std::thread::sleep(delay);
        }
        OpGuard { source: self }
    }

    // -------------------------------------------------------------------------
    // Configuration-time helpers
    // -------------------------------------------------------------------------

    /// Adds a feed and returns its id.
    pub fn add_feed(
        &self,
        url: impl Into<String>,
        folder: u64,
        title: impl Into<String>,
    ) -> u64 {
        let mut state = self.state.write().unwrap();
        let id = state.alloc_entity_id();
        let mut feed = Feed::new(id, url, folder, title);
        feed.sort_order = state.feeds.len() as u64;
        state.feeds.insert(id, feed);
        id
    }

    /// Adds a script registration and returns its id.
    pub fn add_script(
        &self,
        filename: impl Into<String>,
        is_enabled: bool,
        run_on_events: BTreeSet<ScriptEvent>,
        run_on_feed_ids: Option<BTreeSet<u64>>,
    ) -> u64 {
        let mut state = self.state.write().unwrap();
        let id = state.alloc_entity_id();
        state.scripts.insert(
            id,
            Script::new(id, filename, is_enabled, run_on_events, run_on_feed_ids),
        );
        id
    }

    /// Mutates a feed in place; the seam the refresh layer updates post
    /// aggregates through. Returns false if the feed does not exist.
    pub fn with_feed_mut(&self, feed_id: u64, f: impl FnOnce(&mut Feed)) -> bool {
        let mut state = self.state.write().unwrap();
        match state.feeds.get_mut(&feed_id) {
            Some(feed) => {
                f(feed);
                true
            }
            None => false,
        }
    }

    /// Records the highest post id handed out by the post store.
    pub fn set_highest_post_id(&self, id: u64) {
        self.state.write().unwrap().highest_post_id = id;
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Looks up a feed by id.
    pub fn get_feed(&self, feed_id: u64, depth: FetchDepth) -> Option<Feed> {
        let state = self.state.read().unwrap();
        let mut feed = state.feeds.get(&feed_id)?.clone();
        if depth >= FetchDepth::Statistics {
            feed.statistics = Some(feed.build_statistics());
        }
        Some(feed)
    }

    /// Looks up a folder by id.
    pub fn get_folder(&self, folder_id: u64, _depth: FetchDepth) -> Option<Folder> {
        self.state.read().unwrap().folders.get(&folder_id).cloned()
    }

    /// Looks up a script folder by id.
    pub fn get_script_folder(
        &self,
        script_folder_id: u64,
        _depth: FetchDepth,
    ) -> Option<ScriptFolder> {
        self.state
            .read()
            .unwrap()
            .script_folders
            .get(&script_folder_id)
            .cloned()
    }

    /// Looks up a script by id.
    pub fn get_script(&self, script_id: u64) -> Option<Script> {
        self.state.read().unwrap().scripts.get(&script_id).cloned()
    }

    /// Returns all feeds, ordered by id.
    pub fn get_feeds(&self) -> Vec<Feed> {
        self.state.read().unwrap().feeds.values().cloned().collect()
    }

    /// Returns all script folders, ordered by id.
    pub fn get_script_folders(&self) -> Vec<ScriptFolder> {
        self.state
            .read()
            .unwrap()
            .script_folders
            .values()
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------------
    // Operations (run from task bodies holding the serialization slot)
    // -------------------------------------------------------------------------

    /// Removes a feed. Removing an id that is already gone is a no-op.
    pub fn remove_feed(&self, feed_id: u64) {
        let _op = self.begin_op();
        let mut state = self.state.write().unwrap();
        state.feeds.remove(&feed_id);
        state.logs.retain(|entry| entry.feed_id != Some(feed_id));
    }

    /// Marks all posts of one feed as read.
    pub fn mark_feed_read(&self, feed_id: u64) {
        let _op = self.begin_op();
        let mut state = self.state.write().unwrap();
        if let Some(feed) = state.feeds.get_mut(&feed_id) {
            feed.unread_count = 0;
        }
    }

    /// Marks all posts of the feeds in a folder (and its subfolders) as read.
    pub fn mark_folder_read(&self, folder_id: u64) {
        let _op = self.begin_op();
        let mut state = self.state.write().unwrap();
        let subtree = state.folder_subtree(folder_id);
        for feed in state.feeds.values_mut() {
            if subtree.contains(&feed.folder) {
                feed.unread_count = 0;
            }
        }
    }

    /// Marks every post in the source as read.
    pub fn mark_all_as_read(&self) {
        let _op = self.begin_op();
        let mut state = self.state.write().unwrap();
        for feed in state.feeds.values_mut() {
            feed.unread_count = 0;
        }
    }

    /// Removes the log entries attributed to one feed.
    pub fn clear_feed_logs(&self, feed_id: u64) {
        let _op = self.begin_op();
        let mut state = self.state.write().unwrap();
        state.logs.retain(|entry| entry.feed_id != Some(feed_id));
    }

    /// Removes the log entries attributed to feeds in a folder subtree.
    pub fn clear_folder_logs(&self, folder_id: u64) {
        let _op = self.begin_op();
        let mut state = self.state.write().unwrap();
        let subtree = state.folder_subtree(folder_id);
        let folder_feeds: BTreeSet<u64> = state
            .feeds
            .values()
            .filter(|feed| subtree.contains(&feed.folder))
            .map(|feed| feed.id)
            .collect();
        state.logs.retain(|entry| match entry.feed_id {
            Some(feed_id) => !folder_feeds.contains(&feed_id),
            None => true,
        });
    }

    /// Removes all log entries of the source.
    pub fn clear_logs(&self) {
        let _op = self.begin_op();
        self.state.write().unwrap().logs.clear();
    }

    /// Adds a folder and returns its id.
    pub fn add_folder(
        &self,
        title: impl Into<String>,
        parent: u64,
    ) -> Result<u64, SourceError> {
        let _op = self.begin_op();
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SourceError::EmptyTitle);
        }
        let mut state = self.state.write().unwrap();
        let id = state.alloc_entity_id();
        let mut folder = Folder::new(id, title, parent);
        folder.sort_order = state.folders.len() as u64;
        state.folders.insert(id, folder);
        Ok(id)
    }

    /// Removes a folder, its subfolders and the feeds they contain.
    pub fn remove_folder(&self, folder_id: u64) {
        let _op = self.begin_op();
        let mut state = self.state.write().unwrap();
        let subtree = state.folder_subtree(folder_id);
        state.folders.retain(|id, _| !subtree.contains(id));
        state.feeds.retain(|_, feed| !subtree.contains(&feed.folder));
    }

    /// Adds a script folder and returns its id.
    pub fn add_script_folder(
        &self,
        title: impl Into<String>,
        show_total: bool,
        show_unread: bool,
    ) -> Result<u64, SourceError> {
        let _op = self.begin_op();
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SourceError::EmptyTitle);
        }
        let mut state = self.state.write().unwrap();
        if state.script_folders.values().any(|sf| sf.title == title) {
            return Err(SourceError::DuplicateScriptFolderTitle(title));
        }
        let id = state.alloc_entity_id();
        state
            .script_folders
            .insert(id, ScriptFolder::new(id, title, show_total, show_unread));
        Ok(id)
    }

    /// Updates a script folder's title and display flags.
    ///
    /// Returns `Ok(false)` when the id does not exist (harmless absence).
    pub fn update_script_folder(
        &self,
        script_folder_id: u64,
        title: impl Into<String>,
        show_total: bool,
        show_unread: bool,
    ) -> Result<bool, SourceError> {
        let _op = self.begin_op();
        let title = title.into();
        if title.trim().is_empty() {
            return Err(SourceError::EmptyTitle);
        }
        let mut state = self.state.write().unwrap();
        match state.script_folders.get_mut(&script_folder_id) {
            Some(script_folder) => {
                script_folder.title = title;
                script_folder.show_total = show_total;
                script_folder.show_unread = show_unread;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes a script folder. Absent ids are a no-op.
    pub fn remove_script_folder(&self, script_folder_id: u64) {
        let _op = self.begin_op();
        self.state
            .write()
            .unwrap()
            .script_folders
            .remove(&script_folder_id);
    }

    /// Removes a script registration. Absent ids are a no-op.
    pub fn remove_script(&self, script_id: u64) {
        let _op = self.begin_op();
        self.state.write().unwrap().scripts.remove(&script_id);
    }

    /// Returns the set of flag colors currently in use across all feeds.
    pub fn get_used_flag_colors(&self) -> HashSet<FlagColor> {
        let _op = self.begin_op();
        let state = self.state.read().unwrap();
        state
            .feeds
            .values()
            .flat_map(|feed| feed.used_flag_colors.iter().copied())
            .collect()
    }

    /// Computes source-level statistics keyed by the stable JSON identifiers.
    pub fn fetch_statistics(&self) -> BTreeMap<String, String> {
        let _op = self.begin_op();
        self.statistics_locked()
    }

    /// Builds the status object served to presentation-layer consumers.
    ///
    /// Field names are a stable contract: `unreadCounts` (per-feed unread
    /// totals), `feedErrors` (per-feed refresh errors), `highestPostID`.
    pub fn get_status(&self) -> serde_json::Value {
        let _op = self.begin_op();
        let state = self.state.read().unwrap();

        let unread_counts: Vec<serde_json::Value> = state
            .feeds
            .values()
            .map(|feed| json!({"feedID": feed.id, "unreadCount": feed.unread_count}))
            .collect();

        let feed_errors: Vec<serde_json::Value> = state
            .feeds
            .values()
            .filter_map(|feed| {
                feed.last_refresh_error
                    .as_ref()
                    .map(|error| json!({"feedID": feed.id, "feedError": error}))
            })
            .collect();

        json!({
            "unreadCounts": unread_counts,
            "feedErrors": feed_errors,
            "highestPostID": state.highest_post_id,
        })
    }

    /// Builds the overview object for this source at the requested depth.
    pub fn to_json(&self, depth: FetchDepth) -> serde_json::Value {
        let _op = self.begin_op();
        let state = self.state.read().unwrap();

        let mut overview = json!({
            "id": self.id.as_u64(),
            "title": state.title,
            "sortOrder": state.sort_order,
        });

        if depth >= FetchDepth::Data {
            let feeds: Vec<Feed> = state
                .feeds
                .values()
                .map(|feed| {
                    let mut feed = feed.clone();
                    if depth >= FetchDepth::Statistics {
                        feed.statistics = Some(feed.build_statistics());
                    }
                    feed
                })
                .collect();
            overview["feeds"] = serde_json::to_value(feeds).unwrap_or_default();
            overview["folders"] =
                serde_json::to_value(state.folders.values().collect::<Vec<_>>())
                    .unwrap_or_default();
            overview["scriptFolders"] =
                serde_json::to_value(state.script_folders.values().collect::<Vec<_>>())
                    .unwrap_or_default();
            overview["scripts"] =
                serde_json::to_value(state.scripts.values().collect::<Vec<_>>())
                    .unwrap_or_default();
        }

        if depth >= FetchDepth::Statistics {
            drop(state);
            overview["statistics"] =
                serde_json::to_value(self.statistics_locked()).unwrap_or_default();
        }

        overview
    }

    /// Statistics without the operation gauge, for callers already inside an
    /// operation.
    fn statistics_locked(&self) -> BTreeMap<String, String> {
        let state = self.state.read().unwrap();
        let post_count: u64 = state.feeds.values().map(|f| f.total_post_count).sum();
        let flagged_count: u64 = state.feeds.values().map(|f| f.flagged_post_count).sum();
        let oldest: Option<DateTime<Utc>> =
            state.feeds.values().filter_map(|f| f.oldest_post).min();
        let newest: Option<DateTime<Utc>> =
            state.feeds.values().filter_map(|f| f.newest_post).max();
        let fmt = |ts: Option<DateTime<Utc>>| ts.map(|t| t.to_rfc3339()).unwrap_or_default();

        BTreeMap::from([
            ("feedCount".to_string(), state.feeds.len().to_string()),
            ("postCount".to_string(), post_count.to_string()),
            ("flaggedPostCount".to_string(), flagged_count.to_string()),
            ("oldestPost".to_string(), fmt(oldest)),
            ("newestPost".to_string(), fmt(newest)),
        ])
    }

    // -------------------------------------------------------------------------
    // Log surface
    // -------------------------------------------------------------------------

    /// Appends an entry to the source log.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, feed_id: Option<u64>) {
        let mut state = self.state.write().unwrap();
        let id = state.alloc_log_id();
        let mut entry = LogEntry::new(id, level, message);
        if let Some(feed_id) = feed_id {
            if let Some(feed) = state.feeds.get(&feed_id) {
                entry = entry.with_feed(feed_id, feed.title.clone());
            } else {
                entry.feed_id = Some(feed_id);
            }
        }
        state.logs.push(entry);
    }

    /// Records a contained operational failure against this source.
    pub fn log_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.log(LogLevel::Error, message.clone(), None);
        self.state.write().unwrap().last_error = Some(message);
    }

    /// Clears the sticky last-error marker; called when a new task body
    /// starts so the surface reflects the latest operation.
    pub fn clear_last_error(&self) {
        self.state.write().unwrap().last_error = None;
    }

    /// The most recent contained failure, if any.
    pub fn last_error(&self) -> Option<String> {
        self.state.read().unwrap().last_error.clone()
    }

    /// Snapshot of the source log.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.state.read().unwrap().logs.clone()
    }
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap();
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("title", &state.title)
            .field("feeds", &state.feeds.len())
            .field("folders", &state.folders.len())
            .field("script_folders", &state.script_folders.len())
            .field("scripts", &state.scripts.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn sample_source() -> Source {
        let source = Source::new(SourceId::new(1), "Local");
        let tech = source.add_folder("Tech", 0).unwrap();
        let rust = source.add_folder("Rust", tech).unwrap();
        let f1 = source.add_feed("https://example.com/a.xml", tech, "Feed A");
        let f2 = source.add_feed("https://example.com/b.xml", rust, "Feed B");
        let f3 = source.add_feed("https://example.com/c.xml", 0, "Feed C");
        source.with_feed_mut(f1, |feed| feed.unread_count = 3);
        source.with_feed_mut(f2, |feed| feed.unread_count = 5);
        source.with_feed_mut(f3, |feed| feed.unread_count = 7);
        source
    }

    #[test]
    fn test_remove_feed_is_idempotent() {
        let source = sample_source();
        let feeds = source.get_feeds();
        let feed_id = feeds[0].id;

        source.remove_feed(feed_id);
        assert!(source.get_feed(feed_id, FetchDepth::None).is_none());

        // Second removal of the same id is a harmless no-op.
        source.remove_feed(feed_id);
        assert_eq!(source.get_feeds().len(), feeds.len() - 1);
    }

    #[test]
    fn test_mark_folder_read_covers_subtree() {
        let source = sample_source();
        let tech = source
            .get_folder(1, FetchDepth::None)
            .expect("folder 1 is Tech");
        assert_eq!(tech.title, "Tech");

        source.mark_folder_read(tech.id);

        let feeds = source.get_feeds();
        let by_title = |t: &str| feeds.iter().find(|f| f.title == t).unwrap();
        // Feed A is in Tech, Feed B in its subfolder Rust; both marked.
        assert_eq!(by_title("Feed A").unread_count, 0);
        assert_eq!(by_title("Feed B").unread_count, 0);
        // Feed C sits at the root and is untouched.
        assert_eq!(by_title("Feed C").unread_count, 7);
    }

    #[test]
    fn test_mark_all_as_read() {
        let source = sample_source();
        source.mark_all_as_read();
        assert!(source.get_feeds().iter().all(|f| f.unread_count == 0));
    }

    #[test]
    fn test_script_folder_add_update_remove() {
        let source = sample_source();

        let id = source.add_script_folder("Favorites", true, false).unwrap();
        assert_eq!(
            source
                .get_script_folder(id, FetchDepth::None)
                .unwrap()
                .title,
            "Favorites"
        );

        assert!(matches!(
            source.add_script_folder("Favorites", false, false),
            Err(SourceError::DuplicateScriptFolderTitle(_))
        ));
        assert!(matches!(
            source.add_script_folder("   ", false, false),
            Err(SourceError::EmptyTitle)
        ));

        assert!(source
            .update_script_folder(id, "Starred", false, true)
            .unwrap());
        let updated = source.get_script_folder(id, FetchDepth::None).unwrap();
        assert_eq!(updated.title, "Starred");
        assert!(!updated.show_total);
        assert!(updated.show_unread);

        // Updating an absent id reports harmless absence, not an error.
        assert!(!source
            .update_script_folder(9999, "Whatever", false, false)
            .unwrap());

        source.remove_script_folder(id);
        assert!(source.get_script_folder(id, FetchDepth::None).is_none());
    }

    #[test]
    fn test_clear_feed_and_folder_logs() {
        let source = sample_source();
        let feeds = source.get_feeds();
        let feed_a = feeds.iter().find(|f| f.title == "Feed A").unwrap().id;
        let feed_c = feeds.iter().find(|f| f.title == "Feed C").unwrap().id;

        source.log(LogLevel::Info, "refreshed", Some(feed_a));
        source.log(LogLevel::Warning, "slow response", Some(feed_c));
        source.log(LogLevel::Info, "source-wide note", None);
        assert_eq!(source.logs().len(), 3);

        // Feed A lives in folder Tech (id 1).
        source.clear_folder_logs(1);
        let remaining = source.logs();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|e| e.feed_id != Some(feed_a)));

        source.clear_feed_logs(feed_c);
        assert_eq!(source.logs().len(), 1);

        source.clear_logs();
        assert!(source.logs().is_empty());
    }

    #[test]
    fn test_remove_folder_removes_subtree_and_feeds() {
        let source = sample_source();
        source.remove_folder(1); // Tech, with Rust nested below

        assert!(source.get_folder(1, FetchDepth::None).is_none());
        assert!(source.get_folder(2, FetchDepth::None).is_none());
        let feeds = source.get_feeds();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].title, "Feed C");
    }

    #[test]
    fn test_used_flag_colors_union() {
        let source = sample_source();
        let feeds = source.get_feeds();
        source.with_feed_mut(feeds[0].id, |feed| {
            feed.used_flag_colors.insert(FlagColor::Red);
            feed.used_flag_colors.insert(FlagColor::Blue);
        });
        source.with_feed_mut(feeds[1].id, |feed| {
            feed.used_flag_colors.insert(FlagColor::Blue);
        });

        let colors = source.get_used_flag_colors();
        assert_eq!(colors.len(), 2);
        assert!(colors.contains(&FlagColor::Red));
        assert!(colors.contains(&FlagColor::Blue));
    }

    #[test]
    fn test_statistics_aggregate_over_feeds() {
        let source = sample_source();
        let feeds = source.get_feeds();
        source.with_feed_mut(feeds[0].id, |feed| {
            feed.total_post_count = 10;
            feed.flagged_post_count = 2;
            feed.oldest_post = Some(Utc.with_ymd_and_hms(2022, 5, 1, 0, 0, 0).unwrap());
            feed.newest_post = Some(Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap());
        });
        source.with_feed_mut(feeds[1].id, |feed| {
            feed.total_post_count = 5;
            feed.oldest_post = Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
            feed.newest_post = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        });

        let stats = source.fetch_statistics();
        for key in SOURCE_STATISTIC_KEYS {
            assert!(stats.contains_key(key), "missing statistic {key}");
        }
        assert_eq!(stats["feedCount"], "3");
        assert_eq!(stats["postCount"], "15");
        assert_eq!(stats["flaggedPostCount"], "2");
        assert!(stats["oldestPost"].starts_with("2021-01-01"));
        assert!(stats["newestPost"].starts_with("2024-01-01"));
    }

    #[test]
    fn test_status_object_fields() {
        let source = sample_source();
        let feeds = source.get_feeds();
        source.with_feed_mut(feeds[0].id, |feed| {
            feed.last_refresh_error = Some("404 Not Found".to_string());
        });
        source.set_highest_post_id(1234);

        let status = source.get_status();
        assert_eq!(status["unreadCounts"].as_array().unwrap().len(), 3);
        assert_eq!(status["feedErrors"].as_array().unwrap().len(), 1);
        assert_eq!(status["feedErrors"][0]["feedID"], feeds[0].id);
        assert_eq!(status["feedErrors"][0]["feedError"], "404 Not Found");
        assert_eq!(status["highestPostID"], 1234);
    }

    #[test]
    fn test_to_json_depths() {
        let source = sample_source();

        let bare = source.to_json(FetchDepth::None);
        assert_eq!(bare["id"], 1);
        assert_eq!(bare["title"], "Local");
        assert!(bare.get("feeds").is_none());

        let data = source.to_json(FetchDepth::Data);
        assert_eq!(data["feeds"].as_array().unwrap().len(), 3);
        assert!(data.get("statistics").is_none());

        let full = source.to_json(FetchDepth::Statistics);
        assert_eq!(full["statistics"]["feedCount"], "3");
        assert!(full["feeds"][0].get("statistics").is_some());
    }

    #[test]
    fn test_log_error_sets_last_error() {
        let source = sample_source();
        assert!(source.last_error().is_none());

        source.log_error("persistence unavailable");
        assert_eq!(
            source.last_error().as_deref(),
            Some("persistence unavailable")
        );
        let logs = source.logs();
        assert_eq!(logs.last().unwrap().level, LogLevel::Error);

        source.clear_last_error();
        assert!(source.last_error().is_none());
        // Clearing the marker does not erase the log itself.
        assert_eq!(source.logs().len(), logs.len());
    }

    #[test]
    fn test_operation_gauge_observes_concurrency() {
        let source = Arc::new(Source::new(SourceId::new(9), "Gauge"));
        source.set_operation_latency(Some(Duration::from_millis(30)));

        // Two unserialized operations deliberately overlap.
        let a = {
            let source = Arc::clone(&source);
            std::thread::spawn(move || source.mark_all_as_read())
        };
        let b = {
            let source = Arc::clone(&source);
            std::thread::spawn(move || source.mark_all_as_read())
        };
        a.join().unwrap();
        b.join().unwrap();

        assert_eq!(source.peak_operations_in_flight(), 2);
    }
}
