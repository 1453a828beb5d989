//! Integration tests for the persistence layer.
//!
//! Covers first-launch seeding, schema migration of legacy documents,
//! fail-open loading of corrupt data, and durable round-trips through the
//! file-backed store.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use taskboard::clock::FixedClock;
use taskboard::storage::{
    DEFAULT_STORAGE_KEY, FileKvStore, InMemoryKvStore, KvError, SEED_TASK_COUNT, StorageError,
    TaskStorage,
};
use taskboard_proto::storage::{CURRENT_SCHEMA_VERSION, StorageDocument};
use taskboard_proto::task::{TaskDraft, TaskId, TaskPriority, TaskStatus};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
}

fn storage(store: &InMemoryKvStore) -> TaskStorage<&InMemoryKvStore, FixedClock> {
    TaskStorage::with_clock(store, FixedClock::new(now()))
}

fn stored_document(store: &InMemoryKvStore) -> Value {
    serde_json::from_str(&store.raw(DEFAULT_STORAGE_KEY).expect("document written")).unwrap()
}

/// A fresh directory under the system temp dir, unique per test.
fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "taskboard-it-{name}-{}-{}",
        std::process::id(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ))
}

fn legacy_task(id: &str) -> Value {
    json!({
        "id": id,
        "title": "Legacy task",
        "description": "Written before timestamps existed",
        "status": "In Progress",
        "priority": "High",
        "assignee": "Jane Smith",
        "tags": ["backend"]
    })
}

// ===========================================================================
// Seeding
// ===========================================================================

#[test]
fn first_load_seeds_and_second_load_is_unchanged() {
    let store = InMemoryKvStore::new();

    let first = storage(&store).load_with_rng(&mut StdRng::seed_from_u64(11));
    assert_eq!(first.tasks.len(), SEED_TASK_COUNT);
    assert!(first.seeded);
    assert!(!first.migrated);
    assert_eq!(stored_document(&store)["schemaVersion"], json!(CURRENT_SCHEMA_VERSION));

    let second = storage(&store).load();
    assert!(!second.seeded);
    assert!(!second.migrated);
    assert_eq!(second.tasks, first.tasks);
}

// ===========================================================================
// Migration
// ===========================================================================

#[test]
fn legacy_document_is_backfilled_and_rewritten() {
    let store = InMemoryKvStore::new();
    let doc = json!({ "tasks": [legacy_task("a"), legacy_task("b")] });
    store.insert_raw(DEFAULT_STORAGE_KEY, &doc.to_string());

    let out = storage(&store).load();
    assert!(out.migrated);
    assert!(!out.seeded);
    assert_eq!(out.tasks.len(), 2);
    for task in &out.tasks {
        assert_eq!(task.created_at, now());
        assert_eq!(task.updated_at, now());
    }
    assert_eq!(out.tasks[0].status, TaskStatus::InProgress);
    assert_eq!(out.tasks[0].priority, TaskPriority::High);

    let stored = stored_document(&store);
    assert_eq!(stored["schemaVersion"], json!(2));
    assert!(stored["tasks"][0]["createdAt"].is_string());
}

#[test]
fn migration_is_idempotent() {
    let store = InMemoryKvStore::new();
    let doc = json!({ "schemaVersion": 1, "tasks": [legacy_task("a")] });
    store.insert_raw(DEFAULT_STORAGE_KEY, &doc.to_string());

    let first = storage(&store).load();
    assert!(first.migrated);

    let later = FixedClock::new(now() + chrono::Duration::days(3));
    let second = TaskStorage::with_clock(&store, later).load();
    assert!(!second.migrated);
    assert_eq!(second.tasks, first.tasks);
}

#[test]
fn zero_schema_version_migrates_and_keeps_tasks() {
    let store = InMemoryKvStore::new();
    let doc = json!({ "schemaVersion": 0, "tasks": [legacy_task("keep-me")] });
    store.insert_raw(DEFAULT_STORAGE_KEY, &doc.to_string());

    let out = storage(&store).load();
    assert!(out.migrated);
    assert!(!out.seeded);
    assert_eq!(out.tasks.len(), 1);
    assert_eq!(out.tasks[0].id, TaskId::from("keep-me"));
    assert_eq!(out.tasks[0].created_at, now());
    assert_eq!(stored_document(&store)["schemaVersion"], json!(CURRENT_SCHEMA_VERSION));
}

#[test]
fn date_only_timestamps_load_without_reseeding() {
    let store = InMemoryKvStore::new();
    let mut task = legacy_task("keep-me");
    task["createdAt"] = json!("2024-01-01");
    task["updatedAt"] = json!("2024-01-05T10:00:00.000Z");
    let doc = json!({ "schemaVersion": CURRENT_SCHEMA_VERSION, "tasks": [task] });
    store.insert_raw(DEFAULT_STORAGE_KEY, &doc.to_string());

    let out = storage(&store).load();
    assert!(!out.seeded);
    assert!(!out.migrated);
    assert_eq!(out.tasks.len(), 1);
    assert_eq!(
        out.tasks[0].created_at,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(
        out.tasks[0].updated_at,
        Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap()
    );
}

#[test]
fn legacy_date_only_timestamps_survive_migration() {
    let store = InMemoryKvStore::new();
    let mut task = legacy_task("a");
    task["createdAt"] = json!("2024-01-01");
    store.insert_raw(DEFAULT_STORAGE_KEY, &json!({ "tasks": [task] }).to_string());

    let out = storage(&store).load();
    assert!(out.migrated);
    assert!(!out.seeded);
    assert_eq!(
        out.tasks[0].created_at,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(out.tasks[0].updated_at, now());
}

#[test]
fn stored_duplicate_tags_are_normalized_on_load() {
    let store = InMemoryKvStore::new();
    let mut task = legacy_task("a");
    task["tags"] = json!(["backend", "api", "backend", " api "]);
    store.insert_raw(DEFAULT_STORAGE_KEY, &json!({ "tasks": [task] }).to_string());

    let out = storage(&store).load();
    assert!(!out.seeded);
    assert_eq!(out.tasks[0].tags, vec!["backend".to_string(), "api".to_string()]);
}

#[test]
fn record_missing_required_field_reseeds() {
    let store = InMemoryKvStore::new();
    let mut task = legacy_task("a");
    task.as_object_mut().unwrap().remove("title");
    store.insert_raw(DEFAULT_STORAGE_KEY, &json!({ "tasks": [task] }).to_string());

    let out = storage(&store).load();
    assert!(out.seeded);
    assert_eq!(out.tasks.len(), SEED_TASK_COUNT);
}

#[test]
fn newer_schema_version_loads_as_is() {
    let store = InMemoryKvStore::new();
    let task = TaskDraft::new("From the future", "d").into_task(TaskId::from("f"), now());
    let doc = json!({ "schemaVersion": 9, "tasks": [task] });
    store.insert_raw(DEFAULT_STORAGE_KEY, &doc.to_string());

    let out = storage(&store).load();
    assert!(!out.migrated);
    assert!(!out.seeded);
    assert_eq!(out.tasks.len(), 1);
}

// ===========================================================================
// Fail-open reads, fail-loud writes
// ===========================================================================

#[test]
fn corrupt_document_reseeds_and_overwrites() {
    let store = InMemoryKvStore::new();
    store.insert_raw(DEFAULT_STORAGE_KEY, "][");

    let out = storage(&store).load();
    assert!(out.seeded);
    let stored: StorageDocument =
        serde_json::from_str(&store.raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
    assert_eq!(stored.tasks, out.tasks);
}

#[test]
fn seed_is_returned_even_when_it_cannot_be_saved() {
    let store = InMemoryKvStore::with_quota(64);
    let out = storage(&store).load();
    assert!(out.seeded);
    assert_eq!(out.tasks.len(), SEED_TASK_COUNT);
    assert!(store.raw(DEFAULT_STORAGE_KEY).is_none());
}

#[test]
fn quota_exceeded_is_write_failure() {
    let store = InMemoryKvStore::with_quota(64);
    let task = TaskDraft::new("Too big", "for the quota").into_task(TaskId::new(), now());
    let err = storage(&store).save(&[task]).unwrap_err();
    assert!(matches!(
        err,
        StorageError::WriteFailure(KvError::QuotaExceeded { limit: 64, .. })
    ));
}

// ===========================================================================
// File-backed store
// ===========================================================================

#[test]
fn file_store_round_trips_between_sessions() {
    let dir = temp_dir("roundtrip");

    let first = TaskStorage::with_clock(FileKvStore::new(&dir), FixedClock::new(now()));
    assert!(first.is_available());
    let seeded = first.load_with_rng(&mut StdRng::seed_from_u64(3));
    assert!(seeded.seeded);
    assert!(dir.join(format!("{DEFAULT_STORAGE_KEY}.json")).exists());

    let second = TaskStorage::with_clock(FileKvStore::new(&dir), FixedClock::new(now()));
    let loaded = second.load();
    assert!(!loaded.seeded);
    assert_eq!(loaded.tasks, seeded.tasks);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn file_store_custom_key_is_isolated() {
    let dir = temp_dir("keys");
    let a = TaskStorage::with_clock(FileKvStore::new(&dir), FixedClock::new(now())).with_key("a");
    let b = TaskStorage::with_clock(FileKvStore::new(&dir), FixedClock::new(now())).with_key("b");

    let task = TaskDraft::new("Only in a", "d").into_task(TaskId::from("x"), now());
    a.save(std::slice::from_ref(&task)).unwrap();
    b.save(&[]).unwrap();

    assert_eq!(a.load().tasks, vec![task]);
    assert!(b.load().tasks.is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}
