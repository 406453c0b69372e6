//! Cache store error types for the warden backend.
//!
//! Structured errors returned by [`CacheStore`](super::CacheStore)
//! implementations. The identity layer wraps every one of these into an
//! [`AuthError`](crate::auth::AuthError) before it reaches callers.

use thiserror::Error;

/// Errors that can occur during cache store operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key holds a value of a different kind than the operation expects.
    #[error("Wrong value type for key {key}: expected {expected}")]
    WrongType {
        /// The key that was accessed
        key: String,
        /// The value kind the operation required
        expected: &'static str,
    },

    /// A lock guarding store state was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    LockPoisoned,

    /// The store could not be reached or refused the command.
    #[error("Store unavailable: {reason}")]
    Unavailable {
        /// Description of the connection failure
        reason: String,
    },

    /// Snapshot serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Check if this error is a connectivity problem with the store.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }

    /// Check if this error indicates a key held an unexpected value kind.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, StoreError::WrongType { .. })
    }

    /// Check if this error is related to I/O operations.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. }
                | StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
        )
    }

    /// Get the key if this error is about a specific key.
    pub fn key(&self) -> Option<&str> {
        match self {
            StoreError::WrongType { key, .. } => Some(key),
            _ => None,
        }
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
