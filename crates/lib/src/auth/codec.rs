//! Compressed permission list encoding
//!
//! Permission lists are stored inside identity records as text:
//! JSON array of tuples, zlib-deflated, then base64-encoded. Decoding
//! reverses the steps exactly.

use std::io::{Read, Write};

use base64ct::{Base64, Encoding};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::auth::errors::AuthError;
use crate::auth::types::PermissionTuple;

/// Encode a permission list (JSON -> zlib -> base64).
pub fn encode_perms(perms: &[PermissionTuple]) -> Result<String, AuthError> {
    let json = serde_json::to_vec(perms).map_err(|e| AuthError::PermissionEncode {
        reason: e.to_string(),
    })?;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| AuthError::PermissionEncode {
            reason: e.to_string(),
        })?;
    let compressed = encoder.finish().map_err(|e| AuthError::PermissionEncode {
        reason: e.to_string(),
    })?;

    Ok(Base64::encode_string(&compressed))
}

/// Decode a permission list (base64 -> zlib -> JSON).
///
/// Surrounding whitespace is ignored; some producers terminate the base64
/// text with a newline.
pub fn decode_perms(encoded: &str) -> Result<Vec<PermissionTuple>, AuthError> {
    let compressed =
        Base64::decode_vec(encoded.trim()).map_err(|e| AuthError::PermissionDecode {
            reason: format!("invalid base64: {e}"),
        })?;

    let mut json = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(|e| AuthError::PermissionDecode {
            reason: format!("invalid zlib stream: {e}"),
        })?;

    serde_json::from_slice(&json).map_err(|e| AuthError::PermissionDecode {
        reason: format!("invalid permission list: {e}"),
    })
}
