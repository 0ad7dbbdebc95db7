//! Cache Module
//!
//! Concurrent, size-bounded LRU object cache for proxied responses.

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{CacheStore, EntryInfo, Handle};
