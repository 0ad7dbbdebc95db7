//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, admissions, and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that found a cached object
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Objects linked into the cache
    pub admissions: u64,
    /// Objects refused by admission control
    pub rejections: u64,
    /// Objects removed by LRU eviction
    pub evictions: u64,
    /// Bytes reclaimed by LRU eviction
    pub evicted_bytes: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current sum of cached payload sizes
    pub total_size: usize,
    /// Configured byte budget
    pub capacity: usize,
    /// Configured largest cacheable object
    pub per_object_limit: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Lock-free counters updated from the lookup and admission paths.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    admissions: AtomicU64,
    rejections: AtomicU64,
    evictions: AtomicU64,
    evicted_bytes: AtomicU64,
}

impl Counters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admission(&self) {
        self.admissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self, bytes: usize) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.evicted_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Copies the counters into a snapshot; size fields are filled by the store.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            admissions: self.admissions.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            evicted_bytes: self.evicted_bytes.load(Ordering::Relaxed),
            ..CacheStats::default()
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_default() {
        let stats = CacheStats::default();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = Counters::default();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.snapshot().hit_rate(), 0.5);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let counters = Counters::default();
        counters.record_hit();
        counters.record_hit();
        assert_eq!(counters.snapshot().hit_rate(), 1.0);
    }

    #[test]
    fn test_record_eviction_counts_bytes() {
        let counters = Counters::default();
        counters.record_eviction(100);
        counters.record_eviction(50);

        let stats = counters.snapshot();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.evicted_bytes, 150);
    }

    #[test]
    fn test_admission_and_rejection_counters() {
        let counters = Counters::default();
        counters.record_admission();
        counters.record_rejection();
        counters.record_rejection();

        let stats = counters.snapshot();
        assert_eq!(stats.admissions, 1);
        assert_eq!(stats.rejections, 2);
    }
}
