//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store and key invariants over generated inputs.

use proptest::prelude::*;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{CacheKey, CacheStore};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}"
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}"
}

fn unique_keys(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hit/miss counters and the derived hit rate match the lookups performed.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let store = CacheStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(&CacheKey::from(key), value, None),
                CacheOp::Get { key } => match store.get(&CacheKey::from(key)) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&CacheKey::from(key));
                }
            }
        }

        let stats = store.stats();
        let total = expected_hits + expected_misses;
        let expected_rate = if total == 0 {
            0.0
        } else {
            (100.0 * expected_hits as f64 / total as f64 * 100.0).round_ties_even() / 100.0
        };
        prop_assert_eq!(stats.hit_count, expected_hits);
        prop_assert_eq!(stats.miss_count, expected_misses);
        prop_assert_eq!(stats.total_requests, total);
        prop_assert!((stats.hit_rate - expected_rate).abs() < 1e-9);
        prop_assert_eq!(stats.size, store.len());
    }

    // Storing a pair and reading it back before expiry returns the same value.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let store = CacheStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);
        let key = CacheKey::from(key);

        store.set(&key, value.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value));
    }

    // After a delete, the key reads as absent.
    #[test]
    fn prop_delete_removes_entry(key in valid_key_strategy(), value in valid_value_strategy()) {
        let store = CacheStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);
        let key = CacheKey::from(key);

        store.set(&key, value, None);
        prop_assert!(store.delete(&key));
        prop_assert!(store.get(&key).is_none());
    }

    // A second set on the same key replaces the value without growing the store.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let store = CacheStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);
        let key = CacheKey::from(key);

        store.set(&key, value1, None);
        store.set(&key, value2.clone(), None);

        prop_assert_eq!(store.get(&key), Some(value2));
        prop_assert_eq!(store.len(), 1);
    }

    // The number of entries never exceeds the configured capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_entries = 50;
        let store = CacheStore::new(max_entries, TEST_DEFAULT_TTL);

        for (key, value) in entries {
            store.set(&CacheKey::from(key), value, None);
            prop_assert!(store.len() <= max_entries);
        }
    }

    // Filling to capacity, refreshing every key but one, then inserting a
    // new key evicts exactly the key that was not refreshed.
    #[test]
    fn prop_lru_evicts_least_recently_accessed(
        keys in prop::collection::vec(valid_key_strategy(), 2..10),
        stale_index in 0usize..100,
        new_key in valid_key_strategy(),
    ) {
        let keys = unique_keys(keys);
        prop_assume!(keys.len() >= 2);
        prop_assume!(!keys.contains(&new_key));

        let capacity = keys.len();
        let store = CacheStore::new(capacity, TEST_DEFAULT_TTL);
        for key in &keys {
            store.set(&CacheKey::from(key.as_str()), format!("value_{}", key), None);
        }

        let stale = &keys[stale_index % capacity];
        for key in keys.iter().filter(|k| *k != stale) {
            prop_assert!(store.get(&CacheKey::from(key.as_str())).is_some());
        }

        store.set(&CacheKey::from(new_key.as_str()), "new".to_string(), None);

        prop_assert_eq!(store.len(), capacity);
        prop_assert_eq!(store.stats().evictions, 1);
        prop_assert!(store.get(&CacheKey::from(stale.as_str())).is_none());
        for key in keys.iter().filter(|k| *k != stale) {
            prop_assert!(store.get(&CacheKey::from(key.as_str())).is_some());
        }
    }

    // Mappings with equal content fingerprint equally, whatever the insertion order.
    #[test]
    fn prop_fingerprint_ignores_insertion_order(
        fields in prop::collection::vec((valid_key_strategy(), any::<i64>()), 1..12)
    ) {
        let mut forward = Map::new();
        for (name, value) in &fields {
            forward.insert(name.clone(), Value::from(*value));
        }
        let mut backward = Map::new();
        for (name, _) in fields.iter().rev() {
            // Take the value that won in `forward` so both maps hold the same content
            backward.insert(name.clone(), forward[name].clone());
        }

        prop_assert_eq!(
            CacheKey::Structured(forward).fingerprint(),
            CacheKey::Structured(backward).fingerprint()
        );
    }

    // Distinct text keys never share a fingerprint.
    #[test]
    fn prop_distinct_text_keys_differ(a in valid_key_strategy(), b in valid_key_strategy()) {
        prop_assume!(a != b);
        prop_assert_ne!(CacheKey::from(a).fingerprint(), CacheKey::from(b).fingerprint());
    }
}
