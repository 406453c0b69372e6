//! Cache store backends for warden identities
//!
//! This module provides the core [`CacheStore`] trait and its implementations
//! organized by category.
//!
//! The trait captures the small Redis-like command set the identity layer
//! relies on: plain values with expiry, and lists used as per-user indexes.
//! It allows the identity logic to stay independent of the concrete store;
//! network clients for real servers live outside this crate and implement
//! the same trait.

use std::fmt::Debug;

pub mod database;
pub mod errors;

pub use errors::StoreError;

/// Result type returned by [`CacheStore`] operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Value returned by [`CacheStore::ttl`] when the key does not exist.
pub const TTL_MISSING: i64 = -2;

/// Value returned by [`CacheStore::ttl`] when the key exists without an expiry.
pub const TTL_PERSISTENT: i64 = -1;

/// Key-value store with expiring keys and list values.
///
/// Every call is a synchronous, blocking round trip to the store. The trait
/// performs no retries; implementations own their timeout and reconnect
/// policy.
///
/// All implementations must be `Send` and `Sync` so a single store handle
/// can be shared by every request handler of a process.
pub trait CacheStore: Send + Sync + Debug {
    /// Fetch a plain value. Returns `None` when the key is missing or expired.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Set a plain value that expires after `ttl_secs` seconds,
    /// replacing whatever the key held before.
    fn setex(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<()>;

    /// Set the expiry of an existing key. Returns `false` if the key does not exist.
    fn expire(&self, key: &str, ttl_secs: u64) -> StoreResult<bool>;

    /// Remove the expiry of a key. Returns `false` if the key does not exist
    /// or had no expiry.
    fn persist(&self, key: &str) -> StoreResult<bool>;

    /// Delete a key of any kind. Returns `true` if something was removed.
    fn delete(&self, key: &str) -> StoreResult<bool>;

    /// Remaining lifetime of a key in seconds.
    ///
    /// Returns [`TTL_MISSING`] for missing keys and [`TTL_PERSISTENT`]
    /// for keys without an expiry.
    fn ttl(&self, key: &str) -> StoreResult<i64>;

    /// Push a value onto the head of a list, creating it when absent.
    /// Returns the new list length.
    fn lpush(&self, key: &str, value: &str) -> StoreResult<usize>;

    /// Remove occurrences of `value` from a list.
    ///
    /// `count > 0` removes up to `count` matches from the head, `count < 0`
    /// up to `|count|` from the tail and `count == 0` removes all of them.
    /// Returns the number of removed elements.
    fn lrem(&self, key: &str, count: i64, value: &str) -> StoreResult<usize>;

    /// Return the full contents of a list, head first. Missing keys yield
    /// an empty list.
    fn lrange(&self, key: &str) -> StoreResult<Vec<String>>;

    /// Return every live key starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;
}
