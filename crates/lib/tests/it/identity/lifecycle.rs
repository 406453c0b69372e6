//! Identity storage, expiry and removal

use std::sync::Arc;

use warden::{
    auth::AuthError,
    backend::{CacheStore, TTL_MISSING, TTL_PERSISTENT},
    constants::{identity_index_key, identity_key},
    identity::{IdentityConfig, IdentityManager, IdentityRecord, IdentityState, identity_mgr_factory},
};

use crate::helpers::{CountingStore, DownStore, full_grant, store_identity, test_config, test_store};

#[test]
fn test_save_unmodified_only_touches_ttl() {
    let (_, store) = test_store();
    let counting = Arc::new(CountingStore::new(store));
    let config = test_config(counting.clone());
    store_identity(&config, "tok", "user1");

    let mut identity = identity_mgr_factory("tok", &config).unwrap();
    counting.reset();
    identity.save(false).unwrap();

    assert_eq!(counting.writes(), 0);
    assert_eq!(counting.count("expire"), 2);
}

#[test]
fn test_save_modified_writes_record() {
    let (_, store) = test_store();
    let counting = Arc::new(CountingStore::new(store));
    let config = test_config(counting.clone());
    let mut identity = store_identity(&config, "tok", "user1");

    identity.restore_full_perms().unwrap();
    counting.reset();
    identity.save(false).unwrap();
    assert_eq!(counting.count("setex"), 1);
    assert_eq!(counting.count("lpush"), 1);
    assert_eq!(counting.count("expire"), 1);

    // Saved state is clean again
    counting.reset();
    identity.save(false).unwrap();
    assert_eq!(counting.writes(), 0);
}

#[test]
fn test_set_identity_writes_record_and_index() {
    let (clock, store) = test_store();
    let config = test_config(store.clone());
    let identity = store_identity(&config, "tok", "user1");
    assert_eq!(identity.state(), IdentityState::Loaded);

    assert!(store.get(&identity_key("tok")).unwrap().is_some());
    assert_eq!(store.ttl(&identity_key("tok")).unwrap(), 60);
    assert_eq!(store.lrange(&identity_index_key("user1")).unwrap(), vec!["tok"]);
    assert_eq!(store.ttl(&identity_index_key("user1")).unwrap(), 60);

    clock.advance_secs(60);
    let err = identity_mgr_factory("tok", &config).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code(), AuthError::INVALID_CREDENTIALS);
    assert!(store.lrange(&identity_index_key("user1")).unwrap().is_empty());
}

#[test]
fn test_loading_refreshes_lifetime() {
    let (clock, store) = test_store();
    let config = test_config(store.clone());
    store_identity(&config, "tok", "user1");

    for _ in 0..5 {
        clock.advance_secs(45);
        let mut identity = identity_mgr_factory("tok", &config).unwrap();
        identity.save(false).unwrap();
    }
    assert_eq!(store.ttl(&identity_key("tok")).unwrap(), 60);
    assert_eq!(store.ttl(&identity_index_key("user1")).unwrap(), 60);
}

#[test]
fn test_never_expiring_identity() {
    let (clock, store) = test_store();
    let config = test_config(store.clone()).with_never_expire(true);
    let mut identity = store_identity(&config, "tok", "user1");
    assert_eq!(identity.ttl().unwrap(), TTL_PERSISTENT);

    clock.advance_secs(86_400);
    // A plain save keeps the identity permanent
    identity.save(true).unwrap();
    assert_eq!(identity.ttl().unwrap(), TTL_PERSISTENT);

    identity.set_ttl(30).unwrap();
    assert_eq!(identity.ttl().unwrap(), 30);
    assert_eq!(store.ttl(&identity_index_key("user1")).unwrap(), 30);
}

#[test]
fn test_remove_identity() {
    let (_, store) = test_store();
    let config = test_config(store.clone());
    store_identity(&config, "tok1", "user1");
    store_identity(&config, "tok2", "user1");

    let mut identity = identity_mgr_factory("tok1", &config).unwrap();
    identity.remove().unwrap();
    assert_eq!(identity.state(), IdentityState::Removed);

    assert_eq!(identity.ttl().unwrap_err().code(), AuthError::UNDEFINED);
    assert_eq!(store.ttl(&identity_key("tok1")).unwrap(), TTL_MISSING);
    assert_eq!(
        IdentityManager::user_identities(store.as_ref(), "user1").unwrap(),
        vec!["tok2"]
    );
    assert!(identity_mgr_factory("tok1", &config).unwrap_err().is_not_found());
    assert!(identity_mgr_factory("tok2", &config).is_ok());
}

#[test]
fn test_index_holds_uuid_once_across_writes() {
    let (_, store) = test_store();
    let config = test_config(store.clone());
    let mut identity = store_identity(&config, "tok", "user1");
    store_identity(&config, "other", "user1");

    identity.set_perms(vec![full_grant()[3].clone()], true).unwrap();
    identity.restore_full_perms().unwrap();
    identity.save(false).unwrap();
    assert_eq!(
        IdentityManager::user_identities(store.as_ref(), "user1").unwrap(),
        vec!["tok", "other"]
    );

    identity.remove().unwrap();
    assert_eq!(
        IdentityManager::user_identities(store.as_ref(), "user1").unwrap(),
        vec!["other"]
    );
}

#[test]
fn test_listing_identities() {
    let (clock, store) = test_store();
    let config = test_config(store.clone());
    store_identity(&config, "a", "user1");
    clock.advance_secs(10);
    store_identity(&config, "b", "user2");

    let mut snapshots = IdentityManager::get_identities(store.as_ref()).unwrap();
    snapshots.sort_by(|x, y| x.record.uid.cmp(&y.record.uid));
    let summary: Vec<(&str, &str, i64)> = snapshots
        .iter()
        .map(|s| (s.record.uid.as_str(), s.record.user_id(), s.ttl))
        .collect();
    assert_eq!(summary, vec![("a", "user1", 50), ("b", "user2", 60)]);
}

#[test]
fn test_factory_requires_store() {
    let err = identity_mgr_factory("tok", &IdentityConfig::default()).unwrap_err();
    assert!(matches!(err, AuthError::StoreUnavailable));
    assert_eq!(err.code(), AuthError::UNDEFINED);
    assert_eq!(err.info(), "cannot find a cache store connection");
}

#[test]
fn test_store_failures_are_code_ten() {
    let config = test_config(Arc::new(DownStore));

    let err = identity_mgr_factory("tok", &config).unwrap_err();
    assert!(err.is_store_error());
    assert_eq!(err.code(), AuthError::UNDEFINED);
    assert_eq!(err.desc(), "Connection error");

    let record = IdentityRecord::new("user1", &full_grant()).unwrap();
    let err = IdentityManager::set_identity("tok", record, &config).unwrap_err();
    assert!(matches!(err, AuthError::Store { operation: "setex", .. }));

    let err = IdentityManager::get_identities(&DownStore).unwrap_err();
    assert_eq!(err.code(), AuthError::UNDEFINED);
}

#[test]
fn test_crate_error_wraps_identity_errors() {
    let (_, store) = test_store();
    let config = test_config(store);

    let run = || -> warden::Result<bool> {
        let mut identity = identity_mgr_factory("missing", &config)?;
        Ok(identity.can("view", "service", "abc//x", "Svc.Def")?)
    };
    let err = run().unwrap_err();
    assert_eq!(err.module(), "auth");
    assert!(err.is_not_found());
    assert_eq!(err.code(), AuthError::INVALID_CREDENTIALS);
}
