//! Cache Scenario Tests
//!
//! Exercises the session cache with its production limits: 5 minute expiry,
//! 4.5 MiB size limit, 1 Mi character chunks and a 5 MiB storage quota.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use session_cache::cache::{ManualClock, EXPIRY_MS, MAX_CACHE_SIZE};
use session_cache::{CacheConfig, MemoryStorage, SessionCache, Storage, WriteOutcome};

const T0: u64 = 1_700_000_000_000;

fn production_cache(storage: MemoryStorage) -> (SessionCache<MemoryStorage>, ManualClock) {
    let clock = ManualClock::new(T0);
    let cache = SessionCache::with_clock(storage, CacheConfig::default(), Arc::new(clock.clone()));
    (cache, clock)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Employee {
    id: u32,
    name: String,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[test]
fn test_empty_fields_are_stripped() {
    let (mut cache, _) = production_cache(MemoryStorage::default());

    cache.set("emp_list", &json!({"a": [], "b": null, "c": "x"}));
    let entry = cache.get::<Value>("emp_list").unwrap();
    assert_eq!(entry.data, json!({"c": "x"}));
}

#[test]
fn test_typed_payload_tolerates_stripped_fields() {
    let (mut cache, _) = production_cache(MemoryStorage::default());
    let employees = vec![
        Employee {
            id: 1,
            name: "Ada".to_string(),
            department: None,
            tags: Vec::new(),
        },
        Employee {
            id: 2,
            name: "Grace".to_string(),
            department: Some("Engineering".to_string()),
            tags: vec!["flight-risk".to_string()],
        },
    ];

    assert_eq!(cache.set("employees", &employees), WriteOutcome::Direct);

    let raw = cache.storage().get_item("churn_cache_employees").unwrap();
    assert!(!raw.contains("department\":null"));
    assert!(!raw.contains("tags\":[]"));

    let entry = cache.get::<Vec<Employee>>("employees").unwrap();
    assert_eq!(entry.data, employees);
}

#[test]
fn test_entry_expires_after_five_minutes() {
    let (mut cache, clock) = production_cache(MemoryStorage::default());
    cache.set("risk_summary", &json!({"high": 12, "medium": 40}));

    clock.set(T0 + EXPIRY_MS - 1);
    assert!(cache.get::<Value>("risk_summary").is_some());

    clock.set(T0 + EXPIRY_MS);
    assert!(cache.get::<Value>("risk_summary").is_none());
}

#[test]
fn test_quota_pressure_evicts_oldest_megabyte_entries() {
    let (mut cache, clock) = production_cache(MemoryStorage::default());
    let payload = "e".repeat(500_000);

    for i in 0..6 {
        let outcome = cache.set(&format!("page_{}", i), &payload);
        assert_eq!(outcome, WriteOutcome::Direct, "page_{} was not stored", i);
        clock.advance(1_000);
    }

    assert!(cache.get::<String>("page_0").is_none());
    for i in 2..6 {
        assert!(
            cache.get::<String>(&format!("page_{}", i)).is_some(),
            "page_{} should still be cached",
            i
        );
    }
    assert!(cache.stats().evictions >= 1);
}

#[test]
fn test_large_export_is_chunked_and_reassembled() {
    let storage = MemoryStorage::default().with_max_item(2_621_440);
    let (mut cache, _) = production_cache(storage);
    let export = "r".repeat(1_500_000);

    assert_eq!(cache.set("export", &export), WriteOutcome::Chunked { chunks: 2 });
    assert!(cache.storage().get_item("churn_cache_export_chunk_0").is_some());
    assert!(cache.storage().get_item("churn_cache_export_chunk_1").is_some());

    assert_eq!(cache.get::<String>("export").unwrap().data, export);

    cache.storage_mut().remove_item("churn_cache_export_chunk_1");
    assert!(cache.get::<String>("export").is_none());

    // The broken entry is swept as corrupt
    let report = cache.cleanup();
    assert_eq!(report.corrupt, 1);
    assert_eq!(cache.record_count(), 0);
}

#[test]
fn test_payload_over_limit_leaves_store_untouched() {
    let (mut cache, _) = production_cache(MemoryStorage::new(50 * 1024 * 1024));
    cache.set("small", &json!({"v": 1}));
    let usage = cache.usage();

    let too_big = "t".repeat(MAX_CACHE_SIZE / 2 + 1);
    assert!(matches!(cache.set("too_big", &too_big), WriteOutcome::Skipped(_)));

    assert_eq!(cache.usage(), usage);
    assert_eq!(cache.record_count(), 1);
    assert!(cache.get::<String>("too_big").is_none());
}
