//! Authorization error types for the warden library.
//!
//! Every public identity operation reports failures as an [`AuthError`].
//! Besides its structured variants, an `AuthError` exposes the classic
//! `(info, desc, code)` triple consumed by request handlers:
//!
//! | code | meaning |
//! |------|---------|
//! | [`AuthError::INVALID_CREDENTIALS`] (1) | missing/expired identity or insufficient entitlement |
//! | [`AuthError::UNDEFINED`] (10) | store, decoding or other infrastructure fault |

use thiserror::Error as ThisError;

use crate::Error;
use crate::backend::StoreError;

/// Errors that can occur during authorization operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Field additions/changes require a major version bump
/// - Helper methods like `is_*()` and `code()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum AuthError {
    /// The identity key is missing from the store or has expired.
    #[error("Identity {uuid} does not exist or is expired")]
    IdentityNotFound {
        /// The identity token
        uuid: String,
    },

    /// A requested permission is not covered by the identity's full grant.
    #[error("action {action}, on {objtype} {objdef} {objid} cannot be performed by user")]
    Forbidden {
        /// Requested action
        action: String,
        /// Requested object type
        objtype: String,
        /// Requested object definition
        objdef: String,
        /// Requested object-id path
        objid: String,
    },

    /// A cache store command failed.
    #[error("Store operation {operation} failed: {source}")]
    Store {
        /// The store command that failed
        operation: &'static str,
        /// The underlying store error
        #[source]
        source: StoreError,
    },

    /// A compressed permission list could not be decoded.
    #[error("Cannot decode permission list: {reason}")]
    PermissionDecode {
        /// Description of the decoding failure
        reason: String,
    },

    /// A permission list could not be encoded.
    #[error("Cannot encode permission list: {reason}")]
    PermissionEncode {
        /// Description of the encoding failure
        reason: String,
    },

    /// The stored identity record is not a valid record.
    #[error("Malformed identity {uuid}: {reason}")]
    MalformedIdentity {
        /// The identity token
        uuid: String,
        /// Description of what is wrong with the record
        reason: String,
    },

    /// The operation needs a loaded identity.
    #[error("Identity {uuid} is not loaded")]
    IdentityNotLoaded {
        /// The identity token
        uuid: String,
    },

    /// The identity was removed through this manager.
    #[error("Identity {uuid} was removed")]
    IdentityRemoved {
        /// The identity token
        uuid: String,
    },

    /// No cache store handle was configured.
    #[error("cannot find a cache store connection")]
    StoreUnavailable,

    /// Permission compaction was given no paths.
    #[error("Cannot compact an empty permission list")]
    EmptyPermissionList,

    /// Permission paths passed to compaction have different segment counts.
    #[error("Permission path '{path}' has {found} segments, expected {expected}")]
    SegmentCountMismatch {
        /// The offending path
        path: String,
        /// Segment count of the first path
        expected: usize,
        /// Segment count of the offending path
        found: usize,
    },

    /// A permission tuple does not have the positional wire shape.
    #[error("Invalid permission tuple: {reason}")]
    InvalidPermissionTuple {
        /// Description of the shape problem
        reason: String,
    },
}

impl AuthError {
    /// Code for missing identities and insufficient entitlements.
    pub const INVALID_CREDENTIALS: u16 = 1;

    /// Code for infrastructure and decoding faults.
    pub const UNDEFINED: u16 = 10;

    /// Numeric error code.
    pub fn code(&self) -> u16 {
        match self {
            AuthError::IdentityNotFound { .. } | AuthError::Forbidden { .. } => {
                Self::INVALID_CREDENTIALS
            }
            _ => Self::UNDEFINED,
        }
    }

    /// Detailed error text.
    pub fn info(&self) -> String {
        self.to_string()
    }

    /// Short description of the error category.
    pub fn desc(&self) -> &'static str {
        match self {
            AuthError::IdentityNotFound { .. } => "Identity expired",
            AuthError::Forbidden { .. } => "Forbidden",
            AuthError::Store { .. } | AuthError::StoreUnavailable => "Connection error",
            _ => "Undefined",
        }
    }

    /// Wrap a store error raised by `operation`.
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> AuthError {
        move |source| AuthError::Store { operation, source }
    }

    /// Check if this error indicates the identity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AuthError::IdentityNotFound { .. })
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AuthError::Forbidden { .. })
    }

    /// Check if this error came from the cache store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, AuthError::Store { .. } | AuthError::StoreUnavailable)
    }

    /// Check if this error is about permission list encoding or shape.
    pub fn is_permission_format_error(&self) -> bool {
        matches!(
            self,
            AuthError::PermissionDecode { .. }
                | AuthError::PermissionEncode { .. }
                | AuthError::EmptyPermissionList
                | AuthError::SegmentCountMismatch { .. }
                | AuthError::InvalidPermissionTuple { .. }
        )
    }

    /// Check if this error reports an identity in the wrong lifecycle state.
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            AuthError::IdentityNotLoaded { .. } | AuthError::IdentityRemoved { .. }
        )
    }
}

// Conversion from AuthError to the main Error type
impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Auth(err)
    }
}
