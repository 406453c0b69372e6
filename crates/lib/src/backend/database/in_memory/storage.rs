//! Command implementations for the InMemory cache store

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use super::{InMemory, Slot, Value};
use crate::backend::{StoreError, StoreResult, TTL_MISSING, TTL_PERSISTENT};

type Slots = HashMap<String, Slot>;

fn read(backend: &InMemory) -> StoreResult<RwLockReadGuard<'_, Slots>> {
    backend.slots.read().map_err(|_| StoreError::LockPoisoned)
}

fn write(backend: &InMemory) -> StoreResult<RwLockWriteGuard<'_, Slots>> {
    backend.slots.write().map_err(|_| StoreError::LockPoisoned)
}

/// Look up a key that has not expired yet.
fn live<'a>(slots: &'a Slots, key: &str, now: u64) -> Option<&'a Slot> {
    slots.get(key).filter(|slot| !slot.is_expired(now))
}

/// Look up a key for mutation, dropping it first if it already expired.
fn live_mut<'a>(slots: &'a mut Slots, key: &str, now: u64) -> Option<&'a mut Slot> {
    if slots.get(key).is_some_and(|slot| slot.is_expired(now)) {
        slots.remove(key);
    }
    slots.get_mut(key)
}

fn deadline(now: u64, ttl_secs: u64) -> u64 {
    now.saturating_add(ttl_secs.saturating_mul(1000))
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

pub(crate) fn get(backend: &InMemory, key: &str) -> StoreResult<Option<Vec<u8>>> {
    let now = backend.clock.now_millis();
    let slots = read(backend)?;
    match live(&slots, key, now).map(|slot| &slot.value) {
        None => Ok(None),
        Some(Value::Bytes(bytes)) => Ok(Some(bytes.clone())),
        Some(Value::List(_)) => Err(wrong_type(key, "string")),
    }
}

pub(crate) fn setex(backend: &InMemory, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<()> {
    let now = backend.clock.now_millis();
    let mut slots = write(backend)?;
    slots.insert(
        key.to_string(),
        Slot {
            value: Value::Bytes(value.to_vec()),
            expires_at: Some(deadline(now, ttl_secs)),
        },
    );
    Ok(())
}

pub(crate) fn expire(backend: &InMemory, key: &str, ttl_secs: u64) -> StoreResult<bool> {
    let now = backend.clock.now_millis();
    let mut slots = write(backend)?;
    if live_mut(&mut slots, key, now).is_none() {
        return Ok(false);
    }
    if ttl_secs == 0 {
        slots.remove(key);
    } else if let Some(slot) = slots.get_mut(key) {
        slot.expires_at = Some(deadline(now, ttl_secs));
    }
    Ok(true)
}

pub(crate) fn persist(backend: &InMemory, key: &str) -> StoreResult<bool> {
    let now = backend.clock.now_millis();
    let mut slots = write(backend)?;
    Ok(live_mut(&mut slots, key, now)
        .and_then(|slot| slot.expires_at.take())
        .is_some())
}

pub(crate) fn delete(backend: &InMemory, key: &str) -> StoreResult<bool> {
    let now = backend.clock.now_millis();
    let mut slots = write(backend)?;
    Ok(slots
        .remove(key)
        .is_some_and(|slot| !slot.is_expired(now)))
}

pub(crate) fn ttl(backend: &InMemory, key: &str) -> StoreResult<i64> {
    let now = backend.clock.now_millis();
    let slots = read(backend)?;
    Ok(match live(&slots, key, now) {
        None => TTL_MISSING,
        Some(Slot {
            expires_at: None, ..
        }) => TTL_PERSISTENT,
        Some(Slot {
            expires_at: Some(deadline),
            ..
        }) => (deadline - now).div_ceil(1000) as i64,
    })
}

pub(crate) fn lpush(backend: &InMemory, key: &str, value: &str) -> StoreResult<usize> {
    let now = backend.clock.now_millis();
    let mut slots = write(backend)?;
    if live_mut(&mut slots, key, now).is_none() {
        slots.insert(key.to_string(), Slot::new(Value::List(VecDeque::new())));
    }
    match slots.get_mut(key).map(|slot| &mut slot.value) {
        Some(Value::List(list)) => {
            list.push_front(value.to_string());
            Ok(list.len())
        }
        _ => Err(wrong_type(key, "list")),
    }
}

pub(crate) fn lrem(backend: &InMemory, key: &str, count: i64, value: &str) -> StoreResult<usize> {
    let now = backend.clock.now_millis();
    let mut slots = write(backend)?;
    let list = match live_mut(&mut slots, key, now).map(|slot| &mut slot.value) {
        None => return Ok(0),
        Some(Value::List(list)) => list,
        Some(other) => {
            tracing::debug!(key, kind = other.kind(), "LREM on non-list value");
            return Err(wrong_type(key, "list"));
        }
    };

    let limit = if count == 0 {
        usize::MAX
    } else {
        count.unsigned_abs() as usize
    };
    let mut removed = 0;
    if count >= 0 {
        list.retain(|item| {
            if removed < limit && item == value {
                removed += 1;
                false
            } else {
                true
            }
        });
    } else {
        let mut idx = list.len();
        while idx > 0 && removed < limit {
            idx -= 1;
            if list[idx] == value {
                list.remove(idx);
                removed += 1;
            }
        }
    }

    if list.is_empty() {
        slots.remove(key);
    }
    Ok(removed)
}

pub(crate) fn lrange(backend: &InMemory, key: &str) -> StoreResult<Vec<String>> {
    let now = backend.clock.now_millis();
    let slots = read(backend)?;
    match live(&slots, key, now).map(|slot| &slot.value) {
        None => Ok(Vec::new()),
        Some(Value::List(list)) => Ok(list.iter().cloned().collect()),
        Some(Value::Bytes(_)) => Err(wrong_type(key, "list")),
    }
}

pub(crate) fn keys_with_prefix(backend: &InMemory, prefix: &str) -> StoreResult<Vec<String>> {
    let now = backend.clock.now_millis();
    let slots = read(backend)?;
    let mut keys: Vec<String> = slots
        .iter()
        .filter(|(key, slot)| key.starts_with(prefix) && !slot.is_expired(now))
        .map(|(key, _)| key.clone())
        .collect();
    keys.sort();
    Ok(keys)
}
