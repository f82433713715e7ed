//! Build a configuration tree from a flat map of dotted paths.
//!
//! `("database.url", "pg://")` becomes `{database = {url = "pg://"}}`.
//! Entries are applied in iteration order. If several entries target the same
//! path, the last one wins.

use tracing::debug;

use crate::promote::promote_to_list;
use crate::tree::{ContainerNode, TreeNode};

/// Build an unpromoted tree from `(dotted_path, value)` pairs.
///
/// Every value becomes a plain string leaf. Segments are split on `.` without
/// further interpretation, so `"a..b"` has an empty middle segment.
pub fn build_tree<I, K, V>(entries: I) -> ContainerNode
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let mut root = ContainerNode::new();
    let mut count = 0usize;
    for (path, value) in entries {
        root.set(path.as_ref(), TreeNode::string(value));
        count += 1;
    }
    debug!(entries = count, "built tree from flat map");
    root
}

/// Build a tree from a flat map and run list promotion on it.
pub fn flat_tree<I, K, V>(entries: I) -> TreeNode
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    promote_to_list(build_tree(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{flat_map, single};

    #[test]
    fn flat_key() {
        let root = build_tree([("host", "0.0.0.0")]);
        assert_eq!(root.get("host"), Some(&TreeNode::string("0.0.0.0")));
    }

    #[test]
    fn nested_key() {
        let tree = TreeNode::from(build_tree([("database.url", "pg://")]));
        assert_eq!(tree.get("database.url"), Some(&TreeNode::string("pg://")));
    }

    #[test]
    fn deep_nesting() {
        let tree = TreeNode::from(build_tree([("a.b.c.d", "42")]));
        assert_eq!(tree.get("a.b.c.d"), Some(&TreeNode::string("42")));
    }

    #[test]
    fn builder_leaves_values_unpromoted() {
        let root = build_tree([("a.0", "x,y"), ("a.1", "")]);
        let a = root.get("a").unwrap().as_container().unwrap();
        assert_eq!(a.get("0"), Some(&TreeNode::string("x,y")));
        assert_eq!(a.get("1"), Some(&TreeNode::string("")));
    }

    #[test]
    fn multiple_entries_different_branches() {
        let tree = flat_tree(flat_map(&[
            ("host", "x"),
            ("database.url", "pg://"),
            ("database.pool_size", "20"),
        ]));
        assert_eq!(tree.get("host"), Some(&single("x")));
        assert_eq!(tree.get("database.url"), Some(&single("pg://")));
        assert_eq!(tree.get("database.pool_size"), Some(&single("20")));
    }

    #[test]
    fn empty_map_empty_container() {
        let root = build_tree(Vec::<(String, String)>::new());
        assert!(root.is_empty());
        assert_eq!(flat_tree(Vec::<(String, String)>::new()), TreeNode::from(root));
    }

    #[test]
    fn last_entry_wins_for_same_path() {
        let root = build_tree([("port", "3000"), ("port", "5000")]);
        assert_eq!(root.get("port"), Some(&TreeNode::string("5000")));
    }

    #[test]
    fn empty_segments_are_kept_as_keys() {
        let tree = TreeNode::from(build_tree([("a..b", "x")]));
        let a = tree.get("a").unwrap().as_container().unwrap();
        assert!(a.get("").is_some());
    }
}
