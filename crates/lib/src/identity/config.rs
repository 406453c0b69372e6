//! Identity manager configuration
//!
//! [`IdentityConfig`] is what request handlers hand to
//! [`crate::identity::identity_mgr_factory`]: the cache store handle plus
//! expiry policy. The policy part is also available as the serde-friendly
//! [`IdentitySettings`] so host applications can keep it in their own
//! configuration files.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden::backend::database::InMemory;
//! use warden::identity::{IdentityConfig, IdentitySettings};
//!
//! let settings: IdentitySettings = serde_json::from_str(r#"{"expire_secs": 600}"#).unwrap();
//! let config = IdentityConfig::from_settings(Arc::new(InMemory::new()), &settings);
//! assert_eq!(config.expire(), 600);
//! assert!(config.update_ttl_on_load);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::backend::CacheStore;
use crate::constants::DEFAULT_EXPIRE_SECS;

/// Persistable identity expiry policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// Identity lifetime in seconds; `0` means the default of one hour.
    pub expire_secs: u64,

    /// Store new identities without expiry.
    pub never_expire: bool,

    /// Refresh the expiry whenever an identity is loaded.
    pub update_ttl_on_load: bool,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            expire_secs: DEFAULT_EXPIRE_SECS,
            never_expire: false,
            update_ttl_on_load: true,
        }
    }
}

/// Store handle and expiry policy used to build identity managers.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Cache store holding identity records
    pub store: Option<Arc<dyn CacheStore>>,

    /// Identity lifetime in seconds
    pub expire_secs: u64,

    /// Store new identities without expiry
    pub never_expire: bool,

    /// Refresh the expiry whenever an identity is loaded
    pub update_ttl_on_load: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::from_parts(None, &IdentitySettings::default())
    }
}

impl IdentityConfig {
    /// Create a configuration with default policy for `store`.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::default().with_store(store)
    }

    /// Join a store handle with persisted settings.
    pub fn from_settings(store: Arc<dyn CacheStore>, settings: &IdentitySettings) -> Self {
        Self::from_parts(Some(store), settings)
    }

    fn from_parts(store: Option<Arc<dyn CacheStore>>, settings: &IdentitySettings) -> Self {
        Self {
            store,
            expire_secs: settings.expire_secs,
            never_expire: settings.never_expire,
            update_ttl_on_load: settings.update_ttl_on_load,
        }
    }

    /// Set the cache store handle.
    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the identity lifetime in seconds.
    pub fn with_expire(mut self, expire_secs: u64) -> Self {
        self.expire_secs = expire_secs;
        self
    }

    /// Store new identities without expiry.
    pub fn with_never_expire(mut self, never_expire: bool) -> Self {
        self.never_expire = never_expire;
        self
    }

    /// Choose whether loading an identity refreshes its expiry.
    pub fn with_update_ttl_on_load(mut self, update: bool) -> Self {
        self.update_ttl_on_load = update;
        self
    }

    /// Effective identity lifetime in seconds.
    pub fn expire(&self) -> u64 {
        if self.expire_secs == 0 {
            DEFAULT_EXPIRE_SECS
        } else {
            self.expire_secs
        }
    }

    /// The configured store handle.
    ///
    /// # Errors
    /// [`AuthError::StoreUnavailable`] when no store was configured.
    pub fn store(&self) -> Result<Arc<dyn CacheStore>, AuthError> {
        self.store.clone().ok_or(AuthError::StoreUnavailable)
    }

    /// The persistable part of this configuration.
    pub fn settings(&self) -> IdentitySettings {
        IdentitySettings {
            expire_secs: self.expire_secs,
            never_expire: self.never_expire,
            update_ttl_on_load: self.update_ttl_on_load,
        }
    }
}
