//! Permission tuples and authorization requests
//!
//! A [`PermissionTuple`] is one grant of an identity. Only the object type,
//! object definition, object-id path and action take part in matching; the
//! numeric fields are opaque payload carried for the producers of the grant.
//!
//! ```text
//! |0-perm_id|1-obj_id|2-type     |3-definition       |4-objid        |5-level|6-action|
//! |3554420  |444305  |'resource' |'Zabbix.Template'  |'*//*'         |1      |'*'     |
//! |1870777  |233848  |'ssh'      |'SshGroup.SshNode' |'5312d5694c//*'|2      |'view'  |
//! ```

use crate::constants::{PATH_SEPARATOR, WILDCARD};

/// One permission grant.
///
/// Serializes as the positional 7-element array
/// `[perm_id, obj_numeric_id, object_type, object_definition, object_id_path, access_level, action]`
/// so that stored permission lists stay compatible with other producers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionTuple {
    /// Permission identifier (opaque)
    pub perm_id: i64,
    /// Numeric object identifier (opaque)
    pub obj_numeric_id: i64,
    /// Object type, e.g. `service`, `ssh`, `resource`
    pub object_type: String,
    /// Dotted object definition, e.g. `SshGroup.SshNode`
    pub object_definition: String,
    /// `//`-separated object-id path; `*` segments match anything
    pub object_id_path: String,
    /// Access level (opaque)
    pub access_level: i64,
    /// Action, or `*` for every action
    pub action: String,
}

impl PermissionTuple {
    /// Create a tuple with zeroed opaque fields.
    pub fn new(
        object_type: impl Into<String>,
        object_definition: impl Into<String>,
        object_id_path: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            perm_id: 0,
            obj_numeric_id: 0,
            object_type: object_type.into(),
            object_definition: object_definition.into(),
            object_id_path: object_id_path.into(),
            access_level: 0,
            action: action.into(),
        }
    }

    /// Set the opaque numeric fields.
    pub fn with_ids(mut self, perm_id: i64, obj_numeric_id: i64, access_level: i64) -> Self {
        self.perm_id = perm_id;
        self.obj_numeric_id = obj_numeric_id;
        self.access_level = access_level;
        self
    }

    /// Split the object-id path into its segments.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.object_id_path.split(PATH_SEPARATOR)
    }

    /// Whether the tuple grants every action.
    pub fn is_any_action(&self) -> bool {
        self.action == WILDCARD
    }

    /// The request that asks for exactly this grant.
    pub fn as_request(&self) -> PermissionRequest {
        PermissionRequest::new(
            &self.action,
            &self.object_type,
            &self.object_id_path,
            &self.object_definition,
        )
    }
}

/// An authorization query: may `action` be performed on the object
/// identified by `objtype`/`objdef`/`objid`?
///
/// All fields are lowercased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionRequest {
    pub action: String,
    pub objtype: String,
    pub objid: String,
    pub objdef: String,
}

impl PermissionRequest {
    pub fn new(action: &str, objtype: &str, objid: &str, objdef: &str) -> Self {
        Self {
            action: action.to_lowercase(),
            objtype: objtype.to_lowercase(),
            objid: objid.to_lowercase(),
            objdef: objdef.to_lowercase(),
        }
    }

    /// Split the requested object-id into its segments.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.objid.split(PATH_SEPARATOR)
    }
}
