//! Source registry: the process-wide lookup from source id to live handle.
//!
//! Every task re-resolves its source through the registry at execution time
//! rather than caching a handle at submission time; this is the seam that
//! prevents use-after-removal. A lookup that loses the race with
//! [`SourceRegistry::unregister`] observes `None`, never a dangling handle,
//! because handles are reference-counted and the map is concurrency-safe.
//!
//! The registry is injected (`Arc<SourceRegistry>`) wherever it is needed so
//! tests can run against fake sources without global state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use super::{Source, SourceId};

/// Concurrent map of configured sources.
pub struct SourceRegistry {
    sources: DashMap<SourceId, Arc<Source>>,
    /// Sources registered over the process lifetime.
    registered_total: AtomicU64,
    /// Sources removed over the process lifetime.
    removed_total: AtomicU64,
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sources: DashMap::new(),
            registered_total: AtomicU64::new(0),
            removed_total: AtomicU64::new(0),
        }
    }

    /// Registers a source and returns its shared handle.
    ///
    /// Registering an id that already exists replaces the previous handle;
    /// outstanding clones of the old handle stay alive until dropped but are
    /// no longer resolvable.
    pub fn register(&self, source: Source) -> Arc<Source> {
        let id = source.id();
        let handle = Arc::new(source);

        self.sources.insert(id, Arc::clone(&handle));
        self.registered_total.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(source_id = %id, "Registered source");
        handle
    }

    /// Removes a source. All subsequent lookups by this id return `None`.
    ///
    /// Returns false if the id was not registered.
    pub fn unregister(&self, id: SourceId) -> bool {
        let removed = self.sources.remove(&id).is_some();
        if removed {
            self.removed_total.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(source_id = %id, "Unregistered source");
        }
        removed
    }

    /// Looks up a source by id.
    pub fn get(&self, id: SourceId) -> Option<Arc<Source>> {
        self.sources.get(&id).map(|r| Arc::clone(r.value()))
    }

    /// Returns the number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns true if no sources are registered.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns the ids of all registered sources, unordered.
    pub fn ids(&self) -> Vec<SourceId> {
        self.sources.iter().map(|r| *r.key()).collect()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("len", &self.sources.len())
            .field(
                "registered_total",
                &self.registered_total.load(Ordering::Relaxed),
            )
            .field("removed_total", &self.removed_total.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = SourceRegistry::new();
        let id = SourceId::new(1);

        registry.register(Source::new(id, "Local"));

        let handle = registry.get(id).unwrap();
        assert_eq!(handle.id(), id);
        assert_eq!(handle.title(), "Local");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unregister_invalidates_lookups() {
        let registry = SourceRegistry::new();
        let id = SourceId::new(1);
        registry.register(Source::new(id, "Local"));

        assert!(registry.unregister(id));
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());

        // Removal of an unknown id is a no-op.
        assert!(!registry.unregister(id));
    }

    #[test]
    fn test_reregister_replaces_handle() {
        let registry = SourceRegistry::new();
        let id = SourceId::new(1);

        let old = registry.register(Source::new(id, "Old"));
        registry.register(Source::new(id, "New"));

        assert_eq!(registry.get(id).unwrap().title(), "New");
        // The displaced handle stays usable for whoever still holds it.
        assert_eq!(old.title(), "Old");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_concurrent_lookup_during_removal() {
        let registry = Arc::new(SourceRegistry::new());
        let id = SourceId::new(7);
        registry.register(Source::new(id, "Racy"));

        let lookups = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                let mut observed_some = 0usize;
                for _ in 0..10_000 {
                    // Either a live handle or None; a dangling handle would
                    // crash or return garbage here.
                    if let Some(handle) = registry.get(id) {
                        assert_eq!(handle.id(), id);
                        observed_some += 1;
                    }
                }
                observed_some
            })
        };

        registry.unregister(id);
        let observed_some = lookups.join().unwrap();
        assert!(observed_some <= 10_000);
        assert!(registry.get(id).is_none());
    }
}
