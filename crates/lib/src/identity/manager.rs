//! Identity manager
//!
//! An [`IdentityManager`] owns one identity record for the duration of a
//! request. The record is read from the cache store on first use, its
//! permission lists are decompressed on first access and cached, and
//! [`IdentityManager::save`] writes the record back only when permissions
//! changed; otherwise it merely refreshes the expiry.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::IdentityConfig;
use super::types::{IdentityRecord, IdentitySnapshot, IdentityState};
use crate::auth::{
    AuthError, PermissionRequest, PermissionTuple, compact_tuples, decode_perms, encode_perms,
    is_granted,
};
use crate::backend::CacheStore;
use crate::constants::{IDENTITY_INDEX_PREFIX, IDENTITY_PREFIX, identity_index_key, identity_key};

/// A loaded record with its lazily decoded permission lists.
#[derive(Debug)]
struct Loaded {
    record: IdentityRecord,
    perms: Option<Vec<PermissionTuple>>,
    full_perms: Option<Vec<PermissionTuple>>,
    modified: bool,
}

impl Loaded {
    fn new(mut record: IdentityRecord, modified: bool) -> Self {
        if record.fullperms.is_none() {
            record.fullperms = Some(record.user.perms.clone());
        }
        Self {
            record,
            perms: None,
            full_perms: None,
            modified,
        }
    }

    fn active(&mut self) -> Result<&[PermissionTuple], AuthError> {
        let perms = match self.perms.take() {
            Some(perms) => perms,
            None => decode_perms(&self.record.user.perms)?,
        };
        Ok(self.perms.insert(perms).as_slice())
    }

    fn full(&mut self) -> Result<&[PermissionTuple], AuthError> {
        let perms = match self.full_perms.take() {
            Some(perms) => perms,
            None => decode_perms(self.record.full_perms_encoded())?,
        };
        Ok(self.full_perms.insert(perms).as_slice())
    }
}

#[derive(Debug)]
enum Inner {
    Unloaded,
    Loaded(Box<Loaded>),
    Removed,
}

/// Authorization and lifecycle operations for one cached identity.
///
/// Operations that need the record load it on demand. After
/// [`IdentityManager::remove`] every operation fails with
/// [`AuthError::IdentityRemoved`].
#[derive(Debug)]
pub struct IdentityManager {
    uuid: String,
    store: Arc<dyn CacheStore>,
    expire_secs: u64,
    update_ttl_on_load: bool,
    inner: Inner,
}

impl IdentityManager {
    /// Create an unloaded manager for the identity `uuid`.
    ///
    /// # Errors
    /// [`AuthError::StoreUnavailable`] when `config` has no store.
    pub fn new(uuid: impl Into<String>, config: &IdentityConfig) -> Result<Self, AuthError> {
        Ok(Self {
            uuid: uuid.into(),
            store: config.store()?,
            expire_secs: config.expire(),
            update_ttl_on_load: config.update_ttl_on_load,
            inner: Inner::Unloaded,
        })
    }

    /// The identity token.
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Lifetime applied when the expiry is refreshed.
    pub fn expire_secs(&self) -> u64 {
        self.expire_secs
    }

    /// Current lifecycle state.
    pub fn state(&self) -> IdentityState {
        match &self.inner {
            Inner::Unloaded => IdentityState::Unloaded,
            Inner::Loaded(loaded) if loaded.modified => IdentityState::Modified,
            Inner::Loaded(_) => IdentityState::Loaded,
            Inner::Removed => IdentityState::Removed,
        }
    }

    /// Read the record from the store, discarding any cached state.
    ///
    /// Refreshes the expiry afterwards when the manager was configured to.
    ///
    /// # Errors
    /// * [`AuthError::IdentityNotFound`] if the key is missing or expired
    /// * [`AuthError::MalformedIdentity`] if the stored value is not a record
    /// * [`AuthError::Store`] on store failures
    pub fn load(&mut self) -> Result<(), AuthError> {
        self.ensure_not_removed()?;

        let key = identity_key(&self.uuid);
        let bytes = self
            .store
            .get(&key)
            .map_err(AuthError::store("get"))?
            .ok_or_else(|| AuthError::IdentityNotFound {
                uuid: self.uuid.clone(),
            })?;
        let record = IdentityRecord::from_slice(&self.uuid, &bytes)?;
        debug!(uuid = %self.uuid, user = %record.user.id, "Loaded identity");

        self.inner = Inner::Loaded(Box::new(Loaded::new(record, false)));
        if self.update_ttl_on_load {
            self.reset_ttl(false)?;
        }
        Ok(())
    }

    /// The identity record, loading it if needed.
    pub fn identity(&mut self) -> Result<&IdentityRecord, AuthError> {
        Ok(&self.loaded()?.record)
    }

    /// The owning user's identifier.
    pub fn user(&mut self) -> Result<&str, AuthError> {
        Ok(self.loaded()?.record.user.id.as_str())
    }

    /// The active permission list.
    pub fn perms(&mut self) -> Result<&[PermissionTuple], AuthError> {
        self.loaded()?.active()
    }

    /// The full permission list granted at authentication.
    pub fn full_perms(&mut self) -> Result<&[PermissionTuple], AuthError> {
        self.loaded()?.full()
    }

    /// Replace the active permission list without checking it against the
    /// full grant. Use [`IdentityManager::set_perms`] for untrusted input.
    ///
    /// The list is compacted first. The change is kept in memory until
    /// [`IdentityManager::save`].
    pub fn set_active_perms(&mut self, perms: Vec<PermissionTuple>) -> Result<(), AuthError> {
        let perms = compact_tuples(&perms);
        let encoded = encode_perms(&perms)?;
        let loaded = self.loaded()?;
        loaded.record.user.perms = encoded;
        loaded.perms = Some(perms);
        loaded.modified = true;
        Ok(())
    }

    /// Restrict the active permissions to `perms`.
    ///
    /// Every tuple must be granted by the full permission list, otherwise
    /// nothing changes and [`AuthError::Forbidden`] names the first
    /// offending tuple. With `store` set the record is written immediately.
    pub fn set_perms(&mut self, perms: Vec<PermissionTuple>, store: bool) -> Result<(), AuthError> {
        let denied = {
            let full = self.loaded()?.full()?;
            perms
                .iter()
                .find(|perm| !is_granted(full, &perm.as_request()))
                .cloned()
        };
        if let Some(perm) = denied {
            warn!(
                uuid = %self.uuid,
                action = %perm.action,
                objtype = %perm.object_type,
                objdef = %perm.object_definition,
                objid = %perm.object_id_path,
                "Rejected permission restriction"
            );
            return Err(AuthError::Forbidden {
                action: perm.action,
                objtype: perm.object_type,
                objdef: perm.object_definition,
                objid: perm.object_id_path,
            });
        }

        self.set_active_perms(perms)?;
        if store {
            self.store_record(false)?;
        }
        Ok(())
    }

    /// Make the full permission list active again.
    ///
    /// The change is kept in memory until [`IdentityManager::save`].
    pub fn restore_full_perms(&mut self) -> Result<(), AuthError> {
        let loaded = self.loaded()?;
        let full = loaded.full()?.to_vec();
        loaded.record.user.perms = loaded.record.full_perms_encoded().to_string();
        loaded.perms = Some(full);
        loaded.modified = true;
        Ok(())
    }

    /// Whether the full permission list grants `action` on the object.
    ///
    /// All arguments are compared case-insensitively. Restricting the
    /// active permissions does not affect the result; see
    /// [`IdentityManager::is_currently_active`] for that.
    pub fn can(
        &mut self,
        action: &str,
        objtype: &str,
        objid: &str,
        objdef: &str,
    ) -> Result<bool, AuthError> {
        let request = PermissionRequest::new(action, objtype, objid, objdef);
        Ok(is_granted(self.full_perms()?, &request))
    }

    /// Alias of [`IdentityManager::can`].
    pub fn is_entitled(
        &mut self,
        action: &str,
        objtype: &str,
        objid: &str,
        objdef: &str,
    ) -> Result<bool, AuthError> {
        self.can(action, objtype, objid, objdef)
    }

    /// Whether the active permission list grants `action` on the object.
    pub fn is_currently_active(
        &mut self,
        action: &str,
        objtype: &str,
        objid: &str,
        objdef: &str,
    ) -> Result<bool, AuthError> {
        let request = PermissionRequest::new(action, objtype, objid, objdef);
        Ok(is_granted(self.perms()?, &request))
    }

    /// Remaining lifetime of the record in seconds.
    pub fn ttl(&self) -> Result<i64, AuthError> {
        self.ensure_not_removed()?;
        self.store
            .ttl(&identity_key(&self.uuid))
            .map_err(AuthError::store("ttl"))
    }

    /// Set the lifetime of the record and the user index.
    pub fn set_ttl(&mut self, expire_secs: u64) -> Result<(), AuthError> {
        let index_key = identity_index_key(self.user()?);
        let key = identity_key(&self.uuid);
        self.store
            .expire(&key, expire_secs)
            .map_err(AuthError::store("expire"))?;
        self.store
            .expire(&index_key, expire_secs)
            .map_err(AuthError::store("expire"))?;
        debug!(uuid = %self.uuid, expire_secs, "Set identity ttl");
        Ok(())
    }

    /// Refresh the lifetime of the record and the user index, or drop
    /// their expiry when `never_expire` is set.
    pub fn reset_ttl(&mut self, never_expire: bool) -> Result<(), AuthError> {
        let index_key = identity_index_key(self.user()?);
        let key = identity_key(&self.uuid);
        if never_expire {
            self.store
                .persist(&key)
                .map_err(AuthError::store("persist"))?;
            self.store
                .persist(&index_key)
                .map_err(AuthError::store("persist"))?;
        } else {
            self.store
                .expire(&key, self.expire_secs)
                .map_err(AuthError::store("expire"))?;
            self.store
                .expire(&index_key, self.expire_secs)
                .map_err(AuthError::store("expire"))?;
        }
        debug!(uuid = %self.uuid, never_expire, "Refreshed identity ttl");
        Ok(())
    }

    /// Write the record if it was modified, otherwise only refresh its
    /// lifetime.
    pub fn save(&mut self, never_expire: bool) -> Result<(), AuthError> {
        if self.loaded()?.modified {
            self.store_record(never_expire)
        } else {
            self.reset_ttl(never_expire)
        }
    }

    /// Delete the record and drop it from the user index.
    ///
    /// The manager is unusable afterwards.
    pub fn remove(&mut self) -> Result<(), AuthError> {
        let user = self.user()?.to_string();
        self.store
            .delete(&identity_key(&self.uuid))
            .map_err(AuthError::store("delete"))?;
        self.store
            .lrem(&identity_index_key(&user), 0, &self.uuid)
            .map_err(AuthError::store("lrem"))?;
        self.inner = Inner::Removed;
        info!(uuid = %self.uuid, user = %user, "Removed identity");
        Ok(())
    }

    /// Consume the manager, returning the loaded record.
    pub fn into_record(mut self) -> Result<IdentityRecord, AuthError> {
        self.loaded()?;
        match self.inner {
            Inner::Loaded(loaded) => Ok(loaded.record),
            _ => Err(AuthError::IdentityNotLoaded { uuid: self.uuid }),
        }
    }

    // === Store-wide helpers ===

    /// Store a freshly authenticated identity under `uuid`.
    ///
    /// The record's `uid` is set to `uuid`. Honours `config.never_expire`.
    pub fn set_identity(
        uuid: impl Into<String>,
        mut record: IdentityRecord,
        config: &IdentityConfig,
    ) -> Result<Self, AuthError> {
        let mut manager = Self::new(uuid, config)?;
        let user = record.user.id.clone();
        record.uid = manager.uuid.clone();
        manager.inner = Inner::Loaded(Box::new(Loaded::new(record, true)));
        manager.store_record(config.never_expire)?;
        info!(uuid = %manager.uuid, user = %user, "Created identity");
        Ok(manager)
    }

    /// Store a freshly authenticated identity under a new random token.
    pub fn issue(record: IdentityRecord, config: &IdentityConfig) -> Result<Self, AuthError> {
        Self::set_identity(uuid::Uuid::new_v4().to_string(), record, config)
    }

    /// Read an identity without keeping a manager around.
    ///
    /// With `update_ttl` the expiry is refreshed to the default lifetime and
    /// reported as the snapshot's TTL; otherwise the store's remaining TTL
    /// is reported.
    pub fn get_identity(
        uuid: &str,
        store: Arc<dyn CacheStore>,
        update_ttl: bool,
    ) -> Result<IdentitySnapshot, AuthError> {
        let config = IdentityConfig::new(store).with_update_ttl_on_load(update_ttl);
        let mut manager = Self::new(uuid, &config)?;
        manager.load()?;
        let ttl = if update_ttl {
            i64::try_from(manager.expire_secs).unwrap_or(i64::MAX)
        } else {
            manager.ttl()?
        };
        Ok(IdentitySnapshot {
            record: manager.into_record()?,
            ttl,
        })
    }

    /// Every readable identity in the store with its remaining TTL.
    ///
    /// Entries that cannot be read or parsed are skipped.
    pub fn get_identities(store: &dyn CacheStore) -> Result<Vec<IdentitySnapshot>, AuthError> {
        let keys = store
            .keys_with_prefix(IDENTITY_PREFIX)
            .map_err(AuthError::store("keys"))?;

        let mut snapshots = Vec::new();
        for key in keys {
            if key.starts_with(IDENTITY_INDEX_PREFIX) {
                continue;
            }
            let uuid = key.strip_prefix(IDENTITY_PREFIX).unwrap_or(&key);
            let bytes = match store.get(&key) {
                Ok(Some(bytes)) => bytes,
                // Expired between listing and reading
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable identity");
                    continue;
                }
            };
            let record = match IdentityRecord::from_slice(uuid, &bytes) {
                Ok(record) => record,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping corrupt identity");
                    continue;
                }
            };
            let ttl = store.ttl(&key).map_err(AuthError::store("ttl"))?;
            snapshots.push(IdentitySnapshot { record, ttl });
        }
        Ok(snapshots)
    }

    /// Tokens listed in a user's identity index, newest first.
    pub fn user_identities(store: &dyn CacheStore, user_id: &str) -> Result<Vec<String>, AuthError> {
        store
            .lrange(&identity_index_key(user_id))
            .map_err(AuthError::store("lrange"))
    }

    // === Internal helpers ===

    fn ensure_not_removed(&self) -> Result<(), AuthError> {
        match self.inner {
            Inner::Removed => Err(AuthError::IdentityRemoved {
                uuid: self.uuid.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn loaded(&mut self) -> Result<&mut Loaded, AuthError> {
        if matches!(self.inner, Inner::Unloaded) {
            self.load()?;
        }
        match &mut self.inner {
            Inner::Loaded(loaded) => Ok(&mut **loaded),
            Inner::Removed => Err(AuthError::IdentityRemoved {
                uuid: self.uuid.clone(),
            }),
            Inner::Unloaded => Err(AuthError::IdentityNotLoaded {
                uuid: self.uuid.clone(),
            }),
        }
    }

    /// Full write: record, index entry, then expiry.
    ///
    /// The index holds each uuid at most once.
    fn store_record(&mut self, never_expire: bool) -> Result<(), AuthError> {
        let (bytes, user) = {
            let loaded = self.loaded()?;
            (loaded.record.to_vec()?, loaded.record.user.id.clone())
        };
        let key = identity_key(&self.uuid);
        let index_key = identity_index_key(&user);

        self.store
            .setex(&key, self.expire_secs, &bytes)
            .map_err(AuthError::store("setex"))?;
        self.store
            .lrem(&index_key, 0, &self.uuid)
            .map_err(AuthError::store("lrem"))?;
        self.store
            .lpush(&index_key, &self.uuid)
            .map_err(AuthError::store("lpush"))?;
        if never_expire {
            self.store
                .persist(&key)
                .map_err(AuthError::store("persist"))?;
            self.store
                .persist(&index_key)
                .map_err(AuthError::store("persist"))?;
        } else {
            self.store
                .expire(&index_key, self.expire_secs)
                .map_err(AuthError::store("expire"))?;
        }

        if let Inner::Loaded(loaded) = &mut self.inner {
            loaded.modified = false;
        }
        debug!(uuid = %self.uuid, user = %user, never_expire, "Stored identity");
        Ok(())
    }
}
