//! Cache Store Module
//!
//! Size-bounded LRU object cache shared by every proxy worker thread.
//!
//! Two synchronization domains are kept apart:
//! - the structural `RwLock` serializes insert, unlink, promote and the
//!   eviction scan (lookups take it in shared mode);
//! - each entry's own lock covers only its reader count and timestamp.
//!
//! Eviction unlinks victims under the structural lock, releases it, and only
//! then waits for in-flight readers to drain.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::cache::stats::Counters;
use crate::cache::lru::RecencyList;
use crate::cache::{CacheEntry, CacheStats};
use crate::config::Config;
use crate::error::{Rejected, Result};

// == Linked State ==
/// Everything guarded by the structural lock.
#[derive(Debug, Default)]
struct Linked {
    /// Entries ordered MRU (front) to LRU (back)
    list: RecencyList<Arc<CacheEntry>>,
    /// Key to slot id in `list`
    index: HashMap<String, usize>,
    /// Sum of linked payload sizes
    total_size: usize,
}

impl Linked {
    /// Unlinks entries from the LRU end until `needed` bytes are accounted
    /// for or the list is empty. The entries stay allocated until the caller
    /// drops them.
    fn unlink_lru(&mut self, needed: usize) -> Vec<Arc<CacheEntry>> {
        let mut doomed = Vec::new();
        let mut freed = 0;
        while freed < needed {
            let Some(entry) = self.list.pop_back() else {
                break;
            };
            self.index.remove(entry.key());
            self.total_size -= entry.size();
            freed += entry.size();
            doomed.push(entry);
        }
        doomed
    }

    fn slot_of(&self, entry: &Arc<CacheEntry>) -> Option<usize> {
        let id = *self.index.get(entry.key())?;
        match self.list.get(id) {
            Some(linked) if Arc::ptr_eq(linked, entry) => Some(id),
            _ => None,
        }
    }
}

// == Entry Info ==
/// Read-only description of a linked entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub key: String,
    pub size: usize,
    pub readers: usize,
}

// == Cache Store ==
/// Concurrent LRU cache bounded by total payload bytes.
#[derive(Debug)]
pub struct CacheStore {
    linked: RwLock<Linked>,
    /// Upper bound on `total_size`
    capacity: usize,
    /// Largest payload admission accepts
    per_object_limit: usize,
    counters: Counters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `capacity` - Total byte budget across all entries
    /// * `per_object_limit` - Largest single payload that may be cached
    pub fn new(capacity: usize, per_object_limit: usize) -> Self {
        Self {
            linked: RwLock::new(Linked::default()),
            capacity,
            per_object_limit,
            counters: Counters::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_capacity, config.max_object_size)
    }

    // == Lookup ==
    /// Finds the entry cached under `key` and registers the caller as a reader.
    ///
    /// The reader is registered before the shared lock is dropped, so an
    /// eviction that unlinks the entry afterwards always observes it.
    pub fn lookup(&self, key: &str) -> Option<Handle<'_>> {
        let linked = self.read();
        let entry = linked
            .index
            .get(key)
            .and_then(|&id| linked.list.get(id))
            .map(Arc::clone);

        match entry {
            Some(entry) => {
                entry.begin_read();
                drop(linked);
                self.counters.record_hit();
                Some(Handle {
                    store: self,
                    entry,
                    released: false,
                })
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Touch And Promote ==
    /// Moves the entry cached under `key` to the most-recently-used position.
    ///
    /// Returns false when nothing is linked under `key`.
    pub fn touch_and_promote(&self, key: &str) -> bool {
        let mut linked = self.write();
        let Some(&id) = linked.index.get(key) else {
            return false;
        };
        linked.list.move_to_front(id);
        if let Some(entry) = linked.list.get(id) {
            entry.touch();
        }
        true
    }

    /// Promotes exactly this entry, ignoring a newer entry under the same key.
    fn promote(&self, entry: &Arc<CacheEntry>) -> bool {
        let mut linked = self.write();
        match linked.slot_of(entry) {
            Some(id) => {
                linked.list.move_to_front(id);
                entry.touch();
                true
            }
            None => false,
        }
    }

    // == Admit ==
    /// Copies `payload` into a new entry and offers it for admission.
    ///
    /// Must not be called while the calling thread holds a [`Handle`]: if
    /// that entry is chosen for eviction, the call waits on the thread's own
    /// read and never returns.
    pub fn admit(&self, key: impl Into<String>, payload: &[u8]) -> Result<()> {
        let key = key.into();
        if payload.len() > self.per_object_limit {
            return Err(self
                .reject(
                    &key,
                    Rejected::TooLarge {
                        size: payload.len(),
                        limit: self.per_object_limit,
                    },
                )
                .into());
        }
        let entry = CacheEntry::create(key, payload)?;
        self.admit_entry(entry)?;
        Ok(())
    }

    /// Links `entry` at the most-recently-used end, evicting LRU entries
    /// until it fits.
    ///
    /// Blocks until every evicted entry's readers have finished, so the
    /// calling thread must not hold a [`Handle`] itself. Objects that could
    /// not fit even in an empty cache are rejected before anything is
    /// evicted.
    pub fn admit_entry(&self, entry: CacheEntry) -> std::result::Result<(), Rejected> {
        let size = entry.size();
        if size > self.per_object_limit {
            return Err(self.reject(
                entry.key(),
                Rejected::TooLarge {
                    size,
                    limit: self.per_object_limit,
                },
            ));
        }
        if size > self.capacity {
            return Err(self.reject(
                entry.key(),
                Rejected::ExceedsCapacity {
                    size,
                    capacity: self.capacity,
                },
            ));
        }

        let doomed = {
            let mut linked = self.write();
            if linked.index.contains_key(entry.key()) {
                let key = entry.key().to_string();
                return Err(self.reject(&key, Rejected::AlreadyCached(key.clone())));
            }

            let overflow = (linked.total_size + size).saturating_sub(self.capacity);
            let doomed = linked.unlink_lru(overflow);

            entry.touch();
            let key = entry.key().to_string();
            let id = linked.list.push_front(Arc::new(entry));
            linked.index.insert(key.clone(), id);
            linked.total_size += size;

            debug!(
                key = %key,
                size,
                total_size = linked.total_size,
                evicting = doomed.len(),
                "admitted cache entry"
            );
            doomed
        };

        self.counters.record_admission();
        self.reclaim(doomed);
        Ok(())
    }

    // == Evict ==
    /// Evicts LRU entries until at least `requested` bytes are freed or the
    /// store is empty. Returns the bytes freed.
    ///
    /// Waits for readers of the evicted entries, so the calling thread must
    /// not hold a [`Handle`].
    pub fn evict(&self, requested: usize) -> usize {
        let doomed = self.write().unlink_lru(requested);
        self.reclaim(doomed)
    }

    /// Waits out each unlinked entry's readers, then frees it.
    ///
    /// Must be called without the structural lock held: a reader that is
    /// still streaming will take it to promote once done.
    fn reclaim(&self, doomed: Vec<Arc<CacheEntry>>) -> usize {
        let mut freed = 0;
        for entry in doomed {
            if entry.reader_count() > 0 {
                debug!(key = %entry.key(), "waiting for readers before eviction");
            }
            entry.wait_for_readers();
            freed += entry.size();
            self.counters.record_eviction(entry.size());
            debug!(key = %entry.key(), size = entry.size(), "evicted cache entry");
            drop(entry);
        }
        freed
    }

    fn reject(&self, key: &str, reason: Rejected) -> Rejected {
        self.counters.record_rejection();
        debug!(key = %key, reason = %reason, "cache admission rejected");
        reason
    }

    // == Introspection ==
    pub fn len(&self) -> usize {
        self.read().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().list.is_empty()
    }

    pub fn total_size(&self) -> usize {
        self.read().total_size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn per_object_limit(&self) -> usize {
        self.per_object_limit
    }

    pub fn contains(&self, key: &str) -> bool {
        self.read().index.contains_key(key)
    }

    /// Keys from most to least recently used.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.read()
            .list
            .iter()
            .map(|entry| entry.key().to_string())
            .collect()
    }

    /// Linked entries from most to least recently used.
    pub fn entries(&self) -> Vec<EntryInfo> {
        self.read()
            .list
            .iter()
            .map(|entry| EntryInfo {
                key: entry.key().to_string(),
                size: entry.size(),
                readers: entry.reader_count(),
            })
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.counters.snapshot();
        let linked = self.read();
        stats.total_entries = linked.list.len();
        stats.total_size = linked.total_size;
        stats.capacity = self.capacity;
        stats.per_object_limit = self.per_object_limit;
        stats
    }

    // Structural mutations never panic halfway, so a poisoned lock still
    // guards a consistent list.
    fn read(&self) -> RwLockReadGuard<'_, Linked> {
        self.linked.read().unwrap_or_else(|poisoned| {
            warn!("structural lock poisoned, continuing");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Linked> {
        self.linked.write().unwrap_or_else(|poisoned| {
            warn!("structural lock poisoned, continuing");
            poisoned.into_inner()
        })
    }
}

// == Handle ==
/// A reader's borrow of a cached payload.
///
/// The payload stays valid and unchanged for the handle's whole lifetime,
/// even if the entry is evicted meanwhile. [`release`](Handle::release)
/// ends the read and promotes the entry; dropping the handle ends the read
/// without promoting.
#[derive(Debug)]
pub struct Handle<'a> {
    store: &'a CacheStore,
    entry: Arc<CacheEntry>,
    released: bool,
}

impl Handle<'_> {
    pub fn read(&self) -> &[u8] {
        self.entry.payload()
    }

    pub fn key(&self) -> &str {
        self.entry.key()
    }

    pub fn size(&self) -> usize {
        self.entry.size()
    }

    /// Ends the read, then promotes the entry to most recently used.
    ///
    /// Returns false if the entry was evicted while it was being read.
    pub fn release(mut self) -> bool {
        self.released = true;
        self.entry.end_read();
        self.store.promote(&self.entry)
    }
}

impl Drop for Handle<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.entry.end_read();
        }
    }
}
