//! Read-through cache over an index backend using moka
//!
//! Two caches sit in front of the backend: records by page id and
//! collision sets by `(namespace, head)`. Misses are cached too, so a page
//! without a record does not hit storage on every lookup. Writes and
//! deletes invalidate every entry they can affect.
//!
//! Every key also carries a write generation. A load only fills the cache
//! when no write to its key happened since the load began, so a read that
//! races a write can never park a stale value behind the invalidation.

use crate::backend::IndexBackend;
use crate::config::CacheConfig;
use crate::error::BackendError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use disambig_core::Entity;
use moka::sync::Cache;
use std::collections::BTreeMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Collision set shared between cache and callers
pub type HeadMatches = Arc<BTreeMap<u64, Entity>>;

/// Key of a cached collision set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadKey {
    /// Namespace identifier
    pub namespace: i32,
    /// Normalized head
    pub head: String,
}

impl HeadKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(namespace: i32, head: impl Into<String>) -> Self {
        Self {
            namespace,
            head: head.into(),
        }
    }
}

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cached id lookups, hits and misses alike
    pub record_entries: u64,
    /// Cached collision sets
    pub head_entries: u64,
}

/// Backend wrapped in id and head caches
#[derive(Debug, Clone)]
pub struct CachedIndex {
    backend: Arc<dyn IndexBackend>,
    by_id: Cache<u64, Option<Arc<Entity>>>,
    by_head: Cache<HeadKey, HeadMatches>,
    id_generations: Arc<DashMap<u64, u64>>,
    head_generations: Arc<DashMap<HeadKey, u64>>,
}

/// Fill `cache` from `load` unless a write to `key` intervened
fn load_guarded<K, V>(
    cache: &Cache<K, V>,
    generations: &DashMap<K, u64>,
    key: K,
    load: impl FnOnce() -> Result<V, BackendError>,
) -> Result<V, BackendError>
where
    K: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static,
    V: Clone + Send + Sync + 'static,
{
    if let Some(cached) = cache.get(&key) {
        return Ok(cached);
    }

    let seen = generations.get(&key).map_or(0, |generation| *generation);
    let loaded = load()?;

    // the entry guard holds the shard lock, so a concurrent bump lands
    // either before the check or after the insert
    let entry = generations.entry(key.clone());
    let current = match &entry {
        Entry::Occupied(occupied) => *occupied.get(),
        Entry::Vacant(_) => 0,
    };
    if current == seen {
        cache.insert(key, loaded.clone());
    } else {
        tracing::trace!(?key, "discarding load raced by a write");
    }
    drop(entry);

    Ok(loaded)
}

fn bump<K: Hash + Eq>(generations: &DashMap<K, u64>, key: K) {
    let mut generation = generations.entry(key).or_insert(0);
    *generation = generation.wrapping_add(1);
}

impl CachedIndex {
    /// Wrap `backend` with caches sized and aged by `config`
    #[must_use]
    pub fn new(backend: Arc<dyn IndexBackend>, config: &CacheConfig) -> Self {
        Self::with_ttl(backend, config.capacity, config.ttl())
    }

    /// Wrap `backend` with explicit capacity and time-to-live
    #[must_use]
    pub fn with_ttl(backend: Arc<dyn IndexBackend>, max_capacity: u64, ttl: Duration) -> Self {
        Self {
            backend,
            by_id: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            by_head: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            id_generations: Arc::new(DashMap::new()),
            head_generations: Arc::new(DashMap::new()),
        }
    }

    /// Underlying backend
    #[inline]
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn IndexBackend> {
        &self.backend
    }

    /// Record for page `id`
    ///
    /// # Errors
    /// Propagates backend failures; failures are not cached.
    pub fn get(&self, id: u64) -> Result<Option<Entity>, BackendError> {
        let record = load_guarded(&self.by_id, &self.id_generations, id, || {
            Ok(self.backend.get(id)?.map(Arc::new))
        })?;
        Ok(record.map(|entity| (*entity).clone()))
    }

    /// Records sharing normalized `head` in `namespace`
    ///
    /// # Errors
    /// Propagates backend failures; failures are not cached.
    pub fn match_by_head(&self, namespace: i32, head: &str) -> Result<HeadMatches, BackendError> {
        let key = HeadKey::new(namespace, head);
        load_guarded(&self.by_head, &self.head_generations, key, || {
            Ok(Arc::new(self.backend.match_by_head(namespace, head)?))
        })
    }

    fn invalidate_id(&self, id: u64) {
        bump(&self.id_generations, id);
        self.by_id.invalidate(&id);
    }

    fn invalidate_head(&self, namespace: i32, head: &str) {
        let key = HeadKey::new(namespace, head);
        bump(&self.head_generations, key.clone());
        self.by_head.invalidate(&key);
    }

    /// Persist `entity`, invalidating its id and both its old and new head
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn write(&self, entity: &Entity) -> Result<(), BackendError> {
        let previous = self.get(entity.id())?;
        self.backend.write(entity)?;

        self.invalidate_id(entity.id());
        if let Some(previous) = previous {
            self.invalidate_head(previous.namespace(), previous.head());
        }
        self.invalidate_head(entity.namespace(), entity.head());
        Ok(())
    }

    /// Remove the record for `id`, invalidating its id and previous head
    ///
    /// Returns the removed record, if there was one.
    ///
    /// # Errors
    /// Propagates backend failures.
    pub fn delete(&self, id: u64) -> Result<Option<Entity>, BackendError> {
        let previous = self.get(id)?;
        self.backend.delete(id)?;

        self.invalidate_id(id);
        if let Some(previous) = &previous {
            self.invalidate_head(previous.namespace(), previous.head());
        }
        Ok(previous)
    }

    /// Drop every cached entry
    pub fn invalidate_all(&self) {
        self.by_id.invalidate_all();
        self.by_head.invalidate_all();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.by_id.run_pending_tasks();
        self.by_head.run_pending_tasks();
        CacheStats {
            record_entries: self.by_id.entry_count(),
            head_entries: self.by_head.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use crate::report::{HeadCount, SameNameGroup};
    use disambig_core::Tags;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::thread;

    /// Backend that parks the first armed read between load and return
    #[derive(Debug)]
    struct GatedBackend {
        inner: MemoryBackend,
        armed: AtomicBool,
        loaded: Barrier,
        resume: Barrier,
    }

    impl GatedBackend {
        fn new() -> Self {
            Self {
                inner: MemoryBackend::new(),
                armed: AtomicBool::new(false),
                loaded: Barrier::new(2),
                resume: Barrier::new(2),
            }
        }

        fn hold(&self) {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.loaded.wait();
                self.resume.wait();
            }
        }
    }

    impl IndexBackend for GatedBackend {
        fn get(&self, id: u64) -> Result<Option<Entity>, BackendError> {
            let loaded = self.inner.get(id);
            self.hold();
            loaded
        }

        fn match_by_head(
            &self,
            namespace: i32,
            head: &str,
        ) -> Result<BTreeMap<u64, Entity>, BackendError> {
            let loaded = self.inner.match_by_head(namespace, head);
            self.hold();
            loaded
        }

        fn write(&self, entity: &Entity) -> Result<(), BackendError> {
            self.inner.write(entity)
        }

        fn delete(&self, id: u64) -> Result<(), BackendError> {
            self.inner.delete(id)
        }

        fn colliding_heads(&self) -> Result<Vec<HeadCount>, BackendError> {
            self.inner.colliding_heads()
        }

        fn same_name_groups(&self) -> Result<Vec<SameNameGroup>, BackendError> {
            self.inner.same_name_groups()
        }
    }

    fn gated() -> (Arc<GatedBackend>, CachedIndex) {
        let backend = Arc::new(GatedBackend::new());
        let index = CachedIndex::new(backend.clone(), &CacheConfig::default());
        (backend, index)
    }

    fn cached() -> (Arc<MemoryBackend>, CachedIndex) {
        let backend = Arc::new(MemoryBackend::new());
        let index = CachedIndex::new(backend.clone(), &CacheConfig::default());
        (backend, index)
    }

    fn record(id: u64, head: &str) -> Entity {
        Entity::new(0, head)
            .with_id(id)
            .with_tags(Tags::parse("planet", '|'))
    }

    #[test]
    fn miss_is_cached() {
        let (backend, index) = cached();
        assert!(index.get(1).unwrap().is_none());

        // bypass the cache: the stale miss is still served
        backend.write(&record(1, "mercury")).unwrap();
        assert!(index.get(1).unwrap().is_none());
    }

    #[test]
    fn write_invalidates_id_entry() {
        let (_, index) = cached();
        assert!(index.get(1).unwrap().is_none());

        index.write(&record(1, "mercury")).unwrap();
        assert_eq!(index.get(1).unwrap().map(|e| e.id()), Some(1));
    }

    #[test]
    fn write_invalidates_old_and_new_heads() {
        let (_, index) = cached();
        index.write(&record(1, "mercury")).unwrap();

        assert_eq!(index.match_by_head(0, "mercury").unwrap().len(), 1);
        assert!(index.match_by_head(0, "venus").unwrap().is_empty());

        index.write(&record(1, "venus")).unwrap();
        assert!(index.match_by_head(0, "mercury").unwrap().is_empty());
        assert_eq!(index.match_by_head(0, "venus").unwrap().len(), 1);
    }

    #[test]
    fn delete_invalidates_previous_head() {
        let (_, index) = cached();
        index.write(&record(1, "mercury")).unwrap();
        assert_eq!(index.match_by_head(0, "mercury").unwrap().len(), 1);

        let removed = index.delete(1).unwrap();
        assert_eq!(removed.map(|e| e.id()), Some(1));
        assert!(index.match_by_head(0, "mercury").unwrap().is_empty());
        assert!(index.get(1).unwrap().is_none());
    }

    #[test]
    fn stats_count_entries() {
        let (_, index) = cached();
        index.get(1).unwrap();
        index.match_by_head(0, "a").unwrap();
        index.match_by_head(0, "b").unwrap();

        let stats = index.stats();
        assert_eq!(stats.record_entries, 1);
        assert_eq!(stats.head_entries, 2);
    }

    #[test]
    fn invalidate_all_drops_stale_misses() {
        let (backend, index) = cached();
        assert!(index.get(1).unwrap().is_none());

        backend.write(&record(1, "mercury")).unwrap();
        index.invalidate_all();
        assert!(index.get(1).unwrap().is_some());
    }

    #[test]
    fn head_load_racing_a_write_is_not_cached() {
        let (backend, index) = gated();
        backend.armed.store(true, Ordering::SeqCst);

        let reader = {
            let index = index.clone();
            thread::spawn(move || index.match_by_head(0, "mercury").unwrap().len())
        };
        backend.loaded.wait();
        index.write(&record(1, "mercury")).unwrap();
        backend.resume.wait();

        // the reader answers from its own snapshot
        assert_eq!(reader.join().unwrap(), 0);
        assert_eq!(index.match_by_head(0, "mercury").unwrap().len(), 1);
    }

    #[test]
    fn id_load_racing_a_write_is_not_cached() {
        let (backend, index) = gated();
        backend.armed.store(true, Ordering::SeqCst);

        let reader = {
            let index = index.clone();
            thread::spawn(move || index.get(1).unwrap().is_some())
        };
        backend.loaded.wait();
        index.write(&record(1, "mercury")).unwrap();
        backend.resume.wait();

        assert!(!reader.join().unwrap());
        assert_eq!(index.get(1).unwrap().map(|e| e.id()), Some(1));
    }

    #[test]
    fn load_racing_a_delete_is_not_cached() {
        let (backend, index) = gated();
        index.write(&record(1, "mercury")).unwrap();
        backend.armed.store(true, Ordering::SeqCst);

        let reader = {
            let index = index.clone();
            thread::spawn(move || index.match_by_head(0, "mercury").unwrap().len())
        };
        backend.loaded.wait();
        index.delete(1).unwrap();
        backend.resume.wait();

        assert_eq!(reader.join().unwrap(), 1);
        assert!(index.match_by_head(0, "mercury").unwrap().is_empty());
    }

    #[test]
    fn unraced_load_is_cached() {
        let (backend, index) = gated();
        index.write(&record(1, "mercury")).unwrap();
        assert_eq!(index.match_by_head(0, "mercury").unwrap().len(), 1);

        // bypass the cache: the cached set is still served
        backend.inner.delete(1).unwrap();
        assert_eq!(index.match_by_head(0, "mercury").unwrap().len(), 1);
    }
}
