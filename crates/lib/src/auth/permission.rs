//! Permission compaction and matching
//!
//! This module reduces permission path lists to a minimal covering set and
//! decides whether a permission tuple grants a request.
//!
//! # Compaction
//!
//! Paths are `//`-separated segment lists of a fixed length. They are grouped
//! into a tree keyed by segment, one level per position. At every level a
//! `*` key dominates its literal siblings: the wildcard covers every literal
//! value at that position, so only the `*` branch is kept. Without a `*` key
//! the level contributes the union of its compacted children.
//!
//! ```
//! use warden::auth::permission::extract;
//!
//! let perms = ["a//b//c1//*", "a//b//c2//*", "a//b//*//*"];
//! assert_eq!(extract(&perms).unwrap(), vec!["a//b//*//*"]);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::auth::errors::AuthError;
use crate::auth::types::{PermissionRequest, PermissionTuple};
use crate::constants::{PATH_SEPARATOR, WILDCARD};

/// Grouping tree built from permission paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A fully consumed path, re-joined with `//`.
    Leaf(String),
    /// Children keyed by the segment at this depth.
    Group(BTreeMap<String, Node>),
}

/// Reduce permission paths to a non-redundant list.
///
/// Every input path must have the same number of segments. Duplicates
/// collapse, and a path that is `*` at some position subsumes every path
/// that shares its prefix and has a literal at that position.
///
/// # Errors
/// * [`AuthError::EmptyPermissionList`] when `perms` is empty
/// * [`AuthError::SegmentCountMismatch`] when segment counts differ
pub fn extract<S: AsRef<str>>(perms: &[S]) -> Result<Vec<String>, AuthError> {
    let first = perms.first().ok_or(AuthError::EmptyPermissionList)?;
    let expected = first.as_ref().split(PATH_SEPARATOR).count();

    let mut rows = Vec::with_capacity(perms.len());
    for perm in perms {
        let row: Vec<&str> = perm.as_ref().split(PATH_SEPARATOR).collect();
        if row.len() != expected {
            return Err(AuthError::SegmentCountMismatch {
                path: perm.as_ref().to_string(),
                expected,
                found: row.len(),
            });
        }
        rows.push(row);
    }

    Ok(compact(&group(&rows, 0)))
}

/// Group equal-length segment rows by the segment at `pos`, recursing until
/// every segment has been consumed.
pub fn group(rows: &[Vec<&str>], pos: usize) -> Node {
    let depth = rows.first().map_or(0, Vec::len);
    if pos >= depth {
        // Rows reaching this depth are identical; keep one.
        let leaf = rows.first().map(|row| row.join(PATH_SEPARATOR));
        return Node::Leaf(leaf.unwrap_or_default());
    }

    let mut buckets: BTreeMap<&str, Vec<Vec<&str>>> = BTreeMap::new();
    for row in rows {
        buckets.entry(row[pos]).or_default().push(row.clone());
    }
    Node::Group(
        buckets
            .into_iter()
            .map(|(segment, bucket)| (segment.to_string(), group(&bucket, pos + 1)))
            .collect(),
    )
}

/// Flatten a grouping tree into its minimal path list.
pub fn compact(node: &Node) -> Vec<String> {
    match node {
        Node::Leaf(path) => vec![path.clone()],
        Node::Group(children) => match children.get(WILDCARD) {
            Some(wildcard) => explore(wildcard),
            None => children.values().flat_map(compact).collect(),
        },
    }
}

/// Follow the `*` branch down the tree.
///
/// A level below a wildcard that has no `*` of its own is compacted
/// normally.
pub fn explore(node: &Node) -> Vec<String> {
    match node {
        Node::Group(children) => match children.get(WILDCARD) {
            Some(wildcard) => explore(wildcard),
            None => compact(node),
        },
        Node::Leaf(path) => vec![path.clone()],
    }
}

/// Compact a tuple list.
///
/// Tuples are partitioned by object type, object definition, action and
/// path length; within each partition the object-id paths are reduced with
/// [`extract`]. The first tuple carrying each surviving path is kept, in
/// input order. Everything is compared case-insensitively, as in
/// [`matches`], so exact duplicates collapse to their first occurrence.
pub fn compact_tuples(perms: &[PermissionTuple]) -> Vec<PermissionTuple> {
    type Partition = (String, String, String, usize);

    let mut partitions: HashMap<Partition, Vec<String>> = HashMap::new();
    let partition_of = |perm: &PermissionTuple| -> Partition {
        (
            perm.object_type.to_lowercase(),
            perm.object_definition.to_lowercase(),
            perm.action.to_lowercase(),
            perm.path_segments().count(),
        )
    };
    for perm in perms {
        partitions
            .entry(partition_of(perm))
            .or_default()
            .push(perm.object_id_path.to_lowercase());
    }

    let mut survivors: HashSet<(Partition, String)> = HashSet::new();
    for (partition, paths) in partitions {
        // Paths within a partition share a segment count, so extract cannot fail.
        let kept = extract(&paths).unwrap_or_else(|_| paths.clone());
        for path in kept {
            survivors.insert((partition.clone(), path));
        }
    }

    perms
        .iter()
        .filter(|perm| survivors.remove(&(partition_of(*perm), perm.object_id_path.to_lowercase())))
        .cloned()
        .collect()
}

/// Check whether a single tuple grants a request.
///
/// Object type and definition must match exactly, the action must be `*`
/// or equal, and the stored path must have the same number of segments as
/// the requested one with every stored segment `*` or equal. Comparison is
/// case-insensitive; `request` is expected to be lowercased already.
pub fn matches(perm: &PermissionTuple, request: &PermissionRequest) -> bool {
    if perm.object_type.to_lowercase() != request.objtype {
        return false;
    }
    if perm.object_definition.to_lowercase() != request.objdef {
        return false;
    }
    let action = perm.action.to_lowercase();
    if action != WILDCARD && action != request.action {
        return false;
    }

    let path = perm.object_id_path.to_lowercase();
    let stored: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let requested: Vec<&str> = request.path_segments().collect();
    stored.len() == requested.len()
        && stored
            .iter()
            .zip(&requested)
            .all(|(have, want)| *have == WILDCARD || have == want)
}

/// Check whether any tuple of `perms` grants the request.
pub fn is_granted(perms: &[PermissionTuple], request: &PermissionRequest) -> bool {
    perms.iter().any(|perm| matches(perm, request))
}
