//! Wire conversions for permission tuples
//!
//! Permission tuples travel as positional 7-element arrays. This module
//! provides the serde implementations for that form and conversions from
//! loosely typed JSON rows produced by authentication backends.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::permissions::PermissionTuple;
use crate::auth::errors::AuthError;

/// Positional wire form of a permission tuple.
type WireTuple = (i64, i64, String, String, String, i64, String);

impl From<PermissionTuple> for WireTuple {
    fn from(p: PermissionTuple) -> Self {
        (
            p.perm_id,
            p.obj_numeric_id,
            p.object_type,
            p.object_definition,
            p.object_id_path,
            p.access_level,
            p.action,
        )
    }
}

impl From<WireTuple> for PermissionTuple {
    fn from(w: WireTuple) -> Self {
        PermissionTuple {
            perm_id: w.0,
            obj_numeric_id: w.1,
            object_type: w.2,
            object_definition: w.3,
            object_id_path: w.4,
            access_level: w.5,
            action: w.6,
        }
    }
}

impl Serialize for PermissionTuple {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (
            self.perm_id,
            self.obj_numeric_id,
            &self.object_type,
            &self.object_definition,
            &self.object_id_path,
            self.access_level,
            &self.action,
        )
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PermissionTuple {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        WireTuple::deserialize(deserializer).map(PermissionTuple::from)
    }
}

impl From<&PermissionTuple> for Value {
    fn from(p: &PermissionTuple) -> Self {
        serde_json::json!([
            p.perm_id,
            p.obj_numeric_id,
            p.object_type,
            p.object_definition,
            p.object_id_path,
            p.access_level,
            p.action
        ])
    }
}

impl TryFrom<&Value> for PermissionTuple {
    type Error = AuthError;

    /// Parse a JSON row. Numeric fields may be numbers or numeric strings,
    /// as some directory backends return every column as text.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let row = value
            .as_array()
            .ok_or_else(|| AuthError::InvalidPermissionTuple {
                reason: format!("expected an array, got {value}"),
            })?;
        if row.len() != 7 {
            return Err(AuthError::InvalidPermissionTuple {
                reason: format!("expected 7 fields, got {}", row.len()),
            });
        }

        let int = |idx: usize| -> Result<i64, AuthError> {
            let parsed = match &row[idx] {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            };
            parsed.ok_or_else(|| AuthError::InvalidPermissionTuple {
                reason: format!("field {idx} is not an integer: {}", row[idx]),
            })
        };
        let text = |idx: usize| -> Result<String, AuthError> {
            row[idx]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| AuthError::InvalidPermissionTuple {
                    reason: format!("field {idx} is not a string: {}", row[idx]),
                })
        };

        Ok(PermissionTuple {
            perm_id: int(0)?,
            obj_numeric_id: int(1)?,
            object_type: text(2)?,
            object_definition: text(3)?,
            object_id_path: text(4)?,
            access_level: int(5)?,
            action: text(6)?,
        })
    }
}

impl TryFrom<Value> for PermissionTuple {
    type Error = AuthError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        PermissionTuple::try_from(&value)
    }
}
