//! Authorization primitives for warden
//!
//! This module provides permission tuples, permission compaction and
//! matching, and the compressed encoding used to store permission lists
//! inside identity records.

pub mod codec;
pub mod errors;
pub mod permission;
pub mod types;

// Re-export main types for easier access
pub use codec::{decode_perms, encode_perms};
pub use errors::AuthError;
pub use permission::{Node, compact_tuples, extract, is_granted};
pub use types::*;
