//! In-memory cache store implementation
//!
//! This module provides an in-memory implementation of the [`CacheStore`]
//! trait, suitable for testing, development, or single-process deployments
//! where identities do not need to be shared between hosts.

mod persistence;
mod storage;

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::backend::{CacheStore, StoreResult};
use crate::clock::{Clock, SystemClock};

/// A value held under a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub(crate) enum Value {
    Bytes(Vec<u8>),
    List(VecDeque<String>),
}

impl Value {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Bytes(_) => "string",
            Value::List(_) => "list",
        }
    }
}

/// A stored value plus its absolute expiry deadline in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Slot {
    pub(crate) value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) expires_at: Option<u64>,
}

impl Slot {
    pub(crate) fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    pub(crate) fn is_expired(&self, now_millis: u64) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now_millis)
    }
}

/// A simple in-memory cache store using a `HashMap` for storage.
///
/// Expiry is lazy: expired keys are invisible to every command and are
/// dropped the next time a writer touches them. Time comes from the
/// injected [`Clock`], so tests can expire identities deterministically.
///
/// The whole state can be snapshotted to a JSON file with
/// [`InMemory::save_to_file`] and restored with [`InMemory::load_from_file`].
#[derive(Debug)]
pub struct InMemory {
    /// Keyspace guarded by a read-write lock for concurrent access
    pub(crate) slots: RwLock<HashMap<String, Slot>>,
    /// Time source for expiry deadlines
    pub(crate) clock: Arc<dyn Clock>,
}

impl InMemory {
    /// Creates a new, empty store running on system time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates a new, empty store running on the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.keys_with_prefix("")?.len())
    }

    /// Returns `true` when the store holds no live keys.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Saves every live key to a JSON file.
    ///
    /// # Arguments
    /// * `path` - The path to the file where the state should be saved.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        persistence::save_to_file(self, path)
    }

    /// Loads a store snapshot from a JSON file, running on system time.
    ///
    /// If the file does not exist, a new, empty store is returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        persistence::load_from_file(path, Arc::new(SystemClock))
    }

    /// Loads a store snapshot from a JSON file, running on the given clock.
    ///
    /// Keys whose deadline already passed on that clock are discarded.
    pub fn load_from_file_with_clock<P: AsRef<Path>>(
        path: P,
        clock: Arc<dyn Clock>,
    ) -> StoreResult<Self> {
        persistence::load_from_file(path, clock)
    }
}

impl Default for InMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for InMemory {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        storage::get(self, key)
    }

    fn setex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<()> {
        storage::setex(self, key, ttl_secs, value)
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool> {
        storage::expire(self, key, ttl_secs)
    }

    fn persist(&self, key: &str) -> StoreResult<bool> {
        storage::persist(self, key)
    }

    fn delete(&self, key: &str) -> StoreResult<bool> {
        storage::delete(self, key)
    }

    fn ttl(&self, key: &str) -> StoreResult<i64> {
        storage::ttl(self, key)
    }

    fn lpush(&self, key: &str, value: &str) -> StoreResult<usize> {
        storage::lpush(self, key, value)
    }

    fn lrem(&self, key: &str, count: i64, value: &str) -> StoreResult<usize> {
        storage::lrem(self, key, count, value)
    }

    fn lrange(&self, key: &str) -> StoreResult<Vec<String>> {
        storage::lrange(self, key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        storage::keys_with_prefix(self, prefix)
    }
}
