//! Permission compaction properties
//!
//! Covers idempotence, wildcard dominance, duplicate collapse and the
//! rejection of malformed input lists.

use std::collections::BTreeSet;

use warden::auth::{
    AuthError, PermissionTuple, compact_tuples, extract,
    permission::{Node, compact, group},
};

fn as_set(paths: Vec<String>) -> BTreeSet<String> {
    paths.into_iter().collect()
}

#[test]
fn test_wildcard_dominates_literal_siblings() {
    let perms = ["a//b//c1//*", "a//b//c2//*", "a//b//*//*"];
    assert_eq!(extract(&perms).unwrap(), vec!["a//b//*//*"]);
}

#[test]
fn test_wildcard_dominance_at_every_depth() {
    let perms = [
        "org1//div1//prj1//*",
        "org1//div1//prj2//*",
        "org1//*//*//*",
        "org2//div1//prj1//*",
        "org2//div2//prj1//*",
    ];
    let result = as_set(extract(&perms).unwrap());
    assert!(result.contains("org1//*//*//*"));
    assert!(!result.contains("org1//div1//prj1//*"));
    assert!(!result.contains("org1//div1//prj2//*"));
    assert!(result.contains("org2//div1//prj1//*"));
    assert!(result.contains("org2//div2//prj1//*"));
    assert_eq!(result.len(), 3);
}

#[test]
fn test_full_wildcard_collapses_everything() {
    let perms = ["a//b//c//d", "x//y//z//w", "*//*//*//*", "a//*//c//d"];
    assert_eq!(extract(&perms).unwrap(), vec!["*//*//*//*"]);
}

#[test]
fn test_duplicates_collapse() {
    let perms = ["a//b//c//d", "a//b//c//d"];
    assert_eq!(extract(&perms).unwrap(), vec!["a//b//c//d"]);
}

#[test]
fn test_literal_only_paths_are_kept() {
    let perms = ["a//b1", "a//b2", "c//b1"];
    assert_eq!(
        as_set(extract(&perms).unwrap()),
        as_set(perms.iter().map(|p| p.to_string()).collect())
    );
}

#[test]
fn test_compaction_is_idempotent() {
    let inputs: Vec<Vec<&str>> = vec![
        vec!["a//b//c1//*", "a//b//c2//*", "a//b//*//*"],
        vec!["a1//b1//c4//*", "a1//b1//c1//*", "a1//*//*//*", "a2//b1//c1//*"],
        vec!["x//1", "x//2", "y//*", "y//3"],
        vec!["single"],
    ];
    for perms in inputs {
        let once = extract(&perms).unwrap();
        let twice = extract(&once).unwrap();
        assert_eq!(as_set(once), as_set(twice), "input {perms:?}");
    }
}

#[test]
fn test_every_input_is_covered() {
    let perms = ["a//b//c1//d", "a//b//c2//*", "a//*//*//*", "b//x//y//z", "b//x//*//z"];
    let result = extract(&perms).unwrap();

    let covers = |kept: &str, path: &str| {
        kept.split("//")
            .zip(path.split("//"))
            .all(|(k, p)| k == "*" || k == p)
    };
    for path in perms {
        assert!(
            result.iter().any(|kept| covers(kept.as_str(), path)),
            "{path} is not covered by {result:?}"
        );
    }
}

#[test]
fn test_wildcard_branch_wins_over_deeper_literals() {
    // The `*` branch represents the whole level even when its own subtree
    // is narrower than a literal sibling's.
    let perms = ["a//b//c1//d", "a//*//c3//*"];
    assert_eq!(extract(&perms).unwrap(), vec!["a//*//c3//*"]);
}

#[test]
fn test_rejects_empty_list() {
    let empty: [&str; 0] = [];
    let err = extract(&empty).unwrap_err();
    assert!(matches!(err, AuthError::EmptyPermissionList));
    assert_eq!(err.code(), AuthError::UNDEFINED);
}

#[test]
fn test_rejects_mixed_segment_counts() {
    let err = extract(&["a//b//c", "a//b"]).unwrap_err();
    match err {
        AuthError::SegmentCountMismatch {
            path,
            expected,
            found,
        } => {
            assert_eq!(path, "a//b");
            assert_eq!(expected, 3);
            assert_eq!(found, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_group_builds_leaves_at_full_depth() {
    let rows = vec![vec!["a", "b"], vec!["a", "*"]];
    let Node::Group(top) = group(&rows, 0) else {
        panic!("expected a group at the root");
    };
    let Some(Node::Group(second)) = top.get("a") else {
        panic!("expected a group under 'a'");
    };
    assert_eq!(second.get("b"), Some(&Node::Leaf("a//b".to_string())));
    assert_eq!(second.get("*"), Some(&Node::Leaf("a//*".to_string())));
    assert_eq!(compact(&Node::Group(top)), vec!["a//*"]);
}

#[test]
fn test_compact_tuples_per_partition() {
    let perms = vec![
        PermissionTuple::new("ssh", "SshGroup.SshNode", "g1//n1", "view").with_ids(1, 10, 2),
        PermissionTuple::new("ssh", "SshGroup.SshNode", "g1//*", "view").with_ids(2, 10, 2),
        // Different action: its own partition
        PermissionTuple::new("ssh", "SshGroup.SshNode", "g1//n1", "use").with_ids(3, 10, 6),
        // Different definition: its own partition
        PermissionTuple::new("ssh", "SshGroup", "g1", "view").with_ids(4, 11, 2),
        // Exact duplicate of the first surviving tuple
        PermissionTuple::new("ssh", "SshGroup.SshNode", "g1//*", "view").with_ids(5, 10, 2),
    ];
    let compacted = compact_tuples(&perms);
    let ids: Vec<i64> = compacted.iter().map(|p| p.perm_id).collect();
    assert_eq!(ids, vec![2, 3, 4]);
}
