//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the size, ordering and admission invariants of the
//! store over arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::CacheStore;
use crate::error::{CacheError, Rejected};

// == Test Configuration ==
const TEST_CAPACITY: usize = 4096;
const TEST_OBJECT_LIMIT: usize = 1024;

// == Strategies ==
/// Generates cache keys shaped like request URIs
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z]{1,6}".prop_map(|s| format!("http://host/{}", s))
}

/// Payload sizes straddling the per-object limit
fn size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        8 => 0usize..=TEST_OBJECT_LIMIT,
        1 => (TEST_OBJECT_LIMIT + 1)..(TEST_OBJECT_LIMIT * 3),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Admit { key: String, size: usize },
    Lookup { key: String },
    Promote { key: String },
    Evict { bytes: usize },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), size_strategy())
            .prop_map(|(key, size)| CacheOp::Admit { key, size }),
        3 => key_strategy().prop_map(|key| CacheOp::Lookup { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Promote { key }),
        1 => (0usize..2048).prop_map(|bytes| CacheOp::Evict { bytes }),
    ]
}

fn assert_size_invariant(store: &CacheStore) -> Result<(), TestCaseError> {
    let entries = store.entries();
    let sum: usize = entries.iter().map(|e| e.size).sum();
    prop_assert_eq!(store.total_size(), sum, "total_size drifted from entries");
    prop_assert!(
        store.total_size() <= store.capacity(),
        "total_size {} exceeds capacity {}",
        store.total_size(),
        store.capacity()
    );
    let unique: HashSet<_> = entries.iter().map(|e| e.key.clone()).collect();
    prop_assert_eq!(unique.len(), entries.len(), "duplicate live keys");
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any operation sequence, total_size equals the sum of live entry
    // sizes and never exceeds capacity.
    #[test]
    fn prop_size_invariant(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let store = CacheStore::new(TEST_CAPACITY, TEST_OBJECT_LIMIT);

        for op in ops {
            match op {
                CacheOp::Admit { key, size } => {
                    let _ = store.admit(key, &vec![0u8; size]);
                }
                CacheOp::Lookup { key } => {
                    if let Some(handle) = store.lookup(&key) {
                        handle.release();
                    }
                }
                CacheOp::Promote { key } => {
                    store.touch_and_promote(&key);
                }
                CacheOp::Evict { bytes } => {
                    store.evict(bytes);
                }
            }
            assert_size_invariant(&store)?;
        }
    }

    // An object larger than the per-object limit is never present after
    // admit returns, whatever the occupancy.
    #[test]
    fn prop_oversized_objects_never_admitted(
        prefill in prop::collection::vec((key_strategy(), 0usize..=TEST_OBJECT_LIMIT), 0..10),
        size in (TEST_OBJECT_LIMIT + 1)..(TEST_OBJECT_LIMIT * 4),
    ) {
        let store = CacheStore::new(TEST_CAPACITY, TEST_OBJECT_LIMIT);
        for (key, len) in prefill {
            let _ = store.admit(key, &vec![1u8; len]);
        }
        let before = store.keys_by_recency();

        let result = store.admit("http://host/oversized", &vec![2u8; size]);

        let is_too_large = matches!(
            result,
            Err(CacheError::Rejected(Rejected::TooLarge { .. }))
        );
        prop_assert!(is_too_large);
        prop_assert!(!store.contains("http://host/oversized"));
        prop_assert_eq!(store.keys_by_recency(), before, "rejection must not evict");
    }

    // Eviction removes entries strictly from the LRU end and frees at least
    // the requested amount unless the store empties.
    #[test]
    fn prop_evict_takes_lru_suffix(
        sizes in prop::collection::vec(1usize..=TEST_OBJECT_LIMIT / 4, 1..16),
        requested in 0usize..TEST_CAPACITY,
    ) {
        let store = CacheStore::new(TEST_CAPACITY, TEST_OBJECT_LIMIT);
        for (i, size) in sizes.iter().enumerate() {
            store.admit(format!("k{}", i), &vec![0u8; *size]).unwrap();
        }
        let before = store.keys_by_recency();
        let total_before = store.total_size();

        let freed = store.evict(requested);
        let after = store.keys_by_recency();

        prop_assert_eq!(&before[..after.len()], &after[..], "survivors must be the MRU prefix");
        prop_assert_eq!(store.total_size(), total_before - freed);
        if after.is_empty() {
            prop_assert_eq!(freed, total_before);
        } else {
            prop_assert!(freed >= requested);
        }
    }

    // After promotion an entry is evicted only once every older entry is gone.
    #[test]
    fn prop_promoted_entry_outlives_older_entries(
        keys in prop::collection::vec(key_strategy(), 3..10),
        pick in 0usize..100,
    ) {
        let unique: Vec<String> = keys
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        prop_assume!(unique.len() >= 3);

        let store = CacheStore::new(TEST_CAPACITY, TEST_OBJECT_LIMIT);
        for key in &unique {
            store.admit(key.clone(), &[0u8; 16]).unwrap();
        }

        let promoted = unique[pick % unique.len()].clone();
        store.lookup(&promoted).unwrap().release();
        prop_assert_eq!(&store.keys_by_recency()[0], &promoted);

        // Evict one entry at a time; the promoted key must be last to go
        for _ in 0..unique.len() - 1 {
            store.evict(1);
            prop_assert!(store.contains(&promoted));
        }
        store.evict(1);
        prop_assert!(store.is_empty());
    }

    // Balanced lookup/release leaves every reader count at zero.
    #[test]
    fn prop_release_restores_reader_count(
        key in key_strategy(),
        readers in 1usize..8,
    ) {
        let store = CacheStore::new(TEST_CAPACITY, TEST_OBJECT_LIMIT);
        store.admit(key.clone(), b"body").unwrap();

        let handles: Vec<_> = (0..readers).map(|_| store.lookup(&key).unwrap()).collect();
        prop_assert_eq!(store.entries()[0].readers, readers);

        for handle in handles {
            handle.release();
        }
        prop_assert_eq!(store.entries()[0].readers, 0);
    }
}
