//!
//! Warden: permission compaction and cached identity authorization.
//! This library provides the core components for deciding what an
//! authenticated session may do.
//!
//! ## Core Concepts
//!
//! Warden is built around several key concepts:
//!
//! * **Permission tuples (`auth::PermissionTuple`)**: One grant of the form `(perm_id, obj_id, type, definition, objid-path, level, action)`. Object-id paths are `//`-separated segment lists where `*` matches any value.
//! * **Compaction (`auth::permission::extract`)**: Reduces a list of permission paths to a minimal covering set; a `*` segment dominates its literal siblings.
//! * **Identities (`identity::IdentityManager`)**: Authorization sessions cached under an opaque token, holding the user's full grant and a possibly narrower active permission list.
//! * **Cache stores (`backend::CacheStore`)**: The Redis-like key-value capability identities live in, with an in-memory implementation (`backend::database::InMemory`).
//! * **Clocks (`Clock`)**: Time sources driving key expiry, so tests can move time by hand.

pub mod auth;
pub mod backend;
pub mod clock;
pub mod constants;
pub mod identity;

/// Re-export the identity entry points for easier access.
pub use identity::{IdentityConfig, IdentityManager, identity_mgr_factory};

/// Re-export the store capability and its in-memory implementation.
pub use backend::{CacheStore, database::InMemory};

/// Re-export time sources.
pub use clock::{Clock, SystemClock};

#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;

/// Result type used throughout the warden library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the warden library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured authorization errors from the auth and identity modules
    #[error(transparent)]
    Auth(auth::AuthError),

    /// Structured cache store errors from the backend module
    #[error(transparent)]
    Store(backend::StoreError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Auth(_) => "auth",
            Error::Store(_) => "backend",
        }
    }

    /// Numeric error code; see [`auth::AuthError::code`].
    pub fn code(&self) -> u16 {
        match self {
            Error::Auth(auth_err) => auth_err.code(),
            _ => auth::AuthError::UNDEFINED,
        }
    }

    /// Check if this error indicates a missing or expired identity.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_permission_denied(),
            _ => false,
        }
    }

    /// Check if this error is cache store related.
    pub fn is_store_error(&self) -> bool {
        match self {
            Error::Store(_) => true,
            Error::Auth(auth_err) => auth_err.is_store_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_io_error(),
            _ => false,
        }
    }
}
