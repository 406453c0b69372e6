use std::{fs, sync::Arc};

use tempfile::TempDir;

use warden::{
    FixedClock,
    backend::{CacheStore, TTL_PERSISTENT, database::InMemory},
    identity::IdentityManager,
};

use crate::helpers::{store_identity, test_config, test_store};

#[test]
fn test_in_memory_store_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("store.json");

    let (clock, store) = test_store();
    store.setex("identity:tok", 60, b"{}").unwrap();
    store.lpush("identity:index:u", "tok").unwrap();
    store.save_to_file(&file_path).unwrap();
    assert!(file_path.exists());

    let loaded = InMemory::load_from_file_with_clock(&file_path, clock.clone()).unwrap();
    assert_eq!(loaded.len().unwrap(), 2);
    assert_eq!(loaded.get("identity:tok").unwrap().as_deref(), Some(b"{}".as_slice()));
    assert_eq!(loaded.ttl("identity:tok").unwrap(), 60);
    assert_eq!(loaded.lrange("identity:index:u").unwrap(), vec!["tok"]);
    assert_eq!(loaded.ttl("identity:index:u").unwrap(), TTL_PERSISTENT);
}

#[test]
fn test_expired_keys_are_not_restored() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("store.json");

    let (clock, store) = test_store();
    store.setex("short", 5, b"v").unwrap();
    store.setex("long", 500, b"v").unwrap();
    store.save_to_file(&file_path).unwrap();

    clock.advance_secs(10);
    let loaded = InMemory::load_from_file_with_clock(&file_path, clock).unwrap();
    assert!(loaded.get("short").unwrap().is_none());
    assert!(loaded.get("long").unwrap().is_some());
    assert_eq!(loaded.len().unwrap(), 1);
}

#[test]
fn test_identities_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("identities.json");

    let (clock, store) = test_store();
    let config = test_config(store.clone());
    store_identity(&config, "tok", "user1");
    store.save_to_file(&file_path).unwrap();

    let restored = Arc::new(InMemory::load_from_file_with_clock(&file_path, clock).unwrap());
    let snapshot = IdentityManager::get_identity("tok", restored.clone(), false).unwrap();
    assert_eq!(snapshot.record.user.id, "user1");
    assert_eq!(snapshot.ttl, 60);
    assert_eq!(
        IdentityManager::user_identities(restored.as_ref(), "user1").unwrap(),
        vec!["tok"]
    );
}

#[test]
fn test_load_non_existent_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.json");

    let store = InMemory::load_from_file(&path).unwrap();
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_load_invalid_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("invalid.json");
    fs::write(&path, "{ invalid json }").unwrap();

    let err = InMemory::load_from_file(&path).unwrap_err();
    assert!(err.is_io_error());

    // Snapshot failures surface through the crate error as store errors
    let err: warden::Error = err.into();
    assert_eq!(err.module(), "backend");
    assert!(err.is_io_error());
    assert!(err.is_store_error());
}

#[test]
fn test_load_unknown_format_version() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("future.json");
    fs::write(&path, r#"{"_v": 9, "slots": {}}"#).unwrap();

    let clock = Arc::new(FixedClock::default());
    assert!(InMemory::load_from_file_with_clock(&path, clock).is_err());
}
