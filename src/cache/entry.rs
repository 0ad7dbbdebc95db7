//! Cache Entry Module
//!
//! Defines a cached response body together with its reader accounting.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Instant;

use crate::error::{CacheError, Result};

// == Entry Metadata ==
/// Mutable per-entry state, guarded by the entry's own lock.
#[derive(Debug)]
struct EntryMeta {
    /// Monotonic time of the last promotion, used only for LRU ordering
    last_used: Instant,
    /// Threads currently reading the payload
    readers: usize,
}

// == Cache Entry ==
/// One cached response.
///
/// The payload is written once at creation and never mutated, so it is read
/// without any locking. Only the reader count and timestamp sit behind the
/// entry lock, which is independent of the store's structural lock.
#[derive(Debug)]
pub struct CacheEntry {
    key: String,
    payload: Box<[u8]>,
    meta: Mutex<EntryMeta>,
    drained: Condvar,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry holding a copy of `payload`.
    ///
    /// The buffer is reserved fallibly, so an out-of-memory condition comes
    /// back as [`CacheError::Allocation`] instead of aborting the process.
    pub fn create(key: impl Into<String>, payload: &[u8]) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(payload.len())
            .map_err(|_| CacheError::Allocation {
                size: payload.len(),
            })?;
        buf.extend_from_slice(payload);
        Ok(Self::from_vec(key, buf))
    }

    /// Creates an entry taking ownership of an already buffered body.
    pub fn from_vec(key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            payload: payload.into_boxed_slice(),
            meta: Mutex::new(EntryMeta {
                last_used: Instant::now(),
                readers: 0,
            }),
            drained: Condvar::new(),
        }
    }

    // == Accessors ==
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn reader_count(&self) -> usize {
        self.meta().readers
    }

    pub fn last_used(&self) -> Instant {
        self.meta().last_used
    }

    // == Reader Accounting ==
    /// Registers a reader. Never blocks beyond the short metadata lock.
    pub fn begin_read(&self) {
        self.meta().readers += 1;
    }

    /// Deregisters a reader and wakes any eviction waiting on this entry.
    ///
    /// # Panics
    /// Panics when called without a matching [`begin_read`](Self::begin_read).
    pub fn end_read(&self) {
        let mut meta = self.meta();
        assert!(
            meta.readers > 0,
            "end_read without matching begin_read on {}",
            self.key
        );
        meta.readers -= 1;
        if meta.readers == 0 {
            self.drained.notify_all();
        }
    }

    /// Blocks the calling thread until no reader holds the payload.
    pub fn wait_for_readers(&self) {
        let mut meta = self.meta();
        while meta.readers > 0 {
            meta = self
                .drained
                .wait(meta)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    // == Touch ==
    /// Stamps the entry as used now.
    pub fn touch(&self) {
        self.meta().last_used = Instant::now();
    }

    // A panicking reader must not wedge eviction, so poison is ignored.
    fn meta(&self) -> MutexGuard<'_, EntryMeta> {
        self.meta
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
