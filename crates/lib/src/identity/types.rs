//! Core data types for the identity system

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{AuthError, PermissionTuple, compact_tuples, encode_perms};

/// User section of an identity record.
///
/// `perms` holds the *active* permission list in compressed form
/// (see [`crate::auth::codec`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityUser {
    /// User identifier, also the suffix of the per-user index key
    pub id: String,

    /// Compressed active permission list
    pub perms: String,

    /// Fields written by other producers (name, roles, ...), kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identity record stored under `identity:<uuid>`.
///
/// Records written before permission restriction existed have no
/// `fullperms`; for those the user's `perms` is the full grant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Identity token, equal to the uuid part of the store key
    #[serde(default)]
    pub uid: String,

    /// The user this identity belongs to
    pub user: IdentityUser,

    /// Compressed full permission list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullperms: Option<String>,

    /// Other record fields (timestamp, ip, keys, ...), kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IdentityRecord {
    /// Create a record for `user_id` granting `perms`.
    ///
    /// The grant is stored compacted, see [`compact_tuples`]. The token is
    /// filled in when the record is stored.
    pub fn new(user_id: impl Into<String>, perms: &[PermissionTuple]) -> Result<Self, AuthError> {
        Ok(Self {
            uid: String::new(),
            user: IdentityUser {
                id: user_id.into(),
                perms: encode_perms(&compact_tuples(perms))?,
                extra: Map::new(),
            },
            fullperms: None,
            extra: Map::new(),
        })
    }

    /// Attach an extra top-level field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The owning user's identifier.
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Compressed full permission list, falling back to the active list
    /// for records that were never restricted.
    pub fn full_perms_encoded(&self) -> &str {
        self.fullperms.as_deref().unwrap_or(&self.user.perms)
    }

    /// Parse a stored record.
    pub(crate) fn from_slice(uuid: &str, bytes: &[u8]) -> Result<Self, AuthError> {
        serde_json::from_slice(bytes).map_err(|e| AuthError::MalformedIdentity {
            uuid: uuid.to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize for storage.
    pub(crate) fn to_vec(&self) -> Result<Vec<u8>, AuthError> {
        serde_json::to_vec(self).map_err(|e| AuthError::MalformedIdentity {
            uuid: self.uid.clone(),
            reason: e.to_string(),
        })
    }
}

/// A read-only view of a stored identity together with its lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentitySnapshot {
    /// The stored record
    pub record: IdentityRecord,

    /// Remaining lifetime in seconds, with the store's `-1`/`-2` conventions
    pub ttl: i64,
}

/// Lifecycle state of an [`crate::identity::IdentityManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityState {
    /// Only the token and store handle are known
    Unloaded,
    /// The record has been read from the store
    Loaded,
    /// Permissions changed since the last write
    Modified,
    /// The identity was deleted; the manager is unusable
    Removed,
}
