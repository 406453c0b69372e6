//! Persistence operations for the InMemory cache store
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory keyspace to/from JSON files.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Deserializer, Serialize};

use super::{InMemory, Slot};
use crate::backend::{StoreError, StoreResult};
use crate::clock::Clock;

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// Serializable form of the keyspace. Deadlines are absolute milliseconds.
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    slots: HashMap<String, Slot>,
}

/// Saves every live key to a specified file as JSON.
pub(crate) fn save_to_file<P: AsRef<Path>>(backend: &InMemory, path: P) -> StoreResult<()> {
    let now = backend.clock.now_millis();
    let slots = backend
        .slots
        .read()
        .map_err(|_| StoreError::LockPoisoned)?
        .iter()
        .filter(|(_, slot)| !slot.is_expired(now))
        .map(|(key, slot)| (key.clone(), slot.clone()))
        .collect();

    let serializable = SerializableStore {
        version: PERSISTENCE_VERSION,
        slots,
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|source| StoreError::SerializationFailed { source })?;
    std::fs::write(path, json).map_err(|source| StoreError::FileIo { source })
}

/// Loads a keyspace snapshot from a specified JSON file.
///
/// If the file does not exist, a new, empty store is returned.
pub(crate) fn load_from_file<P: AsRef<Path>>(
    path: P,
    clock: Arc<dyn Clock>,
) -> StoreResult<InMemory> {
    match std::fs::read_to_string(path) {
        Ok(json) => {
            let serializable: SerializableStore = serde_json::from_str(&json)
                .map_err(|source| StoreError::DeserializationFailed { source })?;
            let now = clock.now_millis();
            let slots = serializable
                .slots
                .into_iter()
                .filter(|(_, slot)| !slot.is_expired(now))
                .collect();
            Ok(InMemory {
                slots: RwLock::new(slots),
                clock,
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InMemory::with_clock(clock)),
        Err(source) => Err(StoreError::FileIo { source }),
    }
}
