//! Constants used throughout the warden library.
//!
//! Central definitions for the cache key namespace, permission path syntax,
//! and default identity lifetimes.

/// Key prefix for serialized identity records (`identity:<uuid>`).
pub const IDENTITY_PREFIX: &str = "identity:";

/// Key prefix for the per-user identity index lists (`identity:index:<user_id>`).
pub const IDENTITY_INDEX_PREFIX: &str = "identity:index:";

/// Default identity lifetime in seconds.
pub const DEFAULT_EXPIRE_SECS: u64 = 3600;

/// Separator between object-id path segments.
pub const PATH_SEPARATOR: &str = "//";

/// Wildcard segment/action matching any value at its position.
pub const WILDCARD: &str = "*";

/// Build the store key of an identity record.
pub fn identity_key(uuid: &str) -> String {
    format!("{IDENTITY_PREFIX}{uuid}")
}

/// Build the store key of a user's identity index.
pub fn identity_index_key(user_id: &str) -> String {
    format!("{IDENTITY_INDEX_PREFIX}{user_id}")
}
