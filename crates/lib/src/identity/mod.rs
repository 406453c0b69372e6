//! Identity system for warden
//!
//! Identities are authorization sessions cached in a [`crate::backend::CacheStore`]
//! under `identity:<uuid>`, with a per-user index list under
//! `identity:index:<user_id>`. Each identity carries the user's full
//! permission grant and a possibly narrower active permission list.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use warden::auth::PermissionTuple;
//! use warden::backend::database::InMemory;
//! use warden::identity::{IdentityConfig, IdentityManager, IdentityRecord, identity_mgr_factory};
//!
//! let config = IdentityConfig::new(Arc::new(InMemory::new()));
//! let perms = vec![PermissionTuple::new("service", "Svc.Def", "abc//*", "view")];
//! let record = IdentityRecord::new("admin@local", &perms).unwrap();
//! let issued = IdentityManager::issue(record, &config).unwrap();
//!
//! let mut identity = identity_mgr_factory(issued.uuid(), &config).unwrap();
//! assert!(identity.can("view", "service", "abc//xyz", "Svc.Def").unwrap());
//! assert!(!identity.can("edit", "service", "abc//xyz", "Svc.Def").unwrap());
//! ```

pub mod config;
pub mod manager;
pub mod types;


pub use config::{IdentityConfig, IdentitySettings};
pub use manager::IdentityManager;
pub use types::*;

use crate::auth::AuthError;

/// Build a manager for `uuid` and load its record.
///
/// # Errors
/// * [`AuthError::StoreUnavailable`] (code 10) when `config` has no store
/// * [`AuthError::IdentityNotFound`] (code 1) when the identity is missing or expired
/// * any other load failure, with code 10
pub fn identity_mgr_factory(uuid: &str, config: &IdentityConfig) -> Result<IdentityManager, AuthError> {
    let mut manager = IdentityManager::new(uuid, config)?;
    manager.load()?;
    Ok(manager)
}
