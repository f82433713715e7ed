//! In-memory configuration tree.
//!
//! A tree is made of containers (ordered key → node maps), lists, and scalar
//! values. Two extra variants model values that flat formats cannot tell
//! apart from lists:
//!
//! - [`TreeNode::EmptyString`]: `""` or `[]`.
//! - [`TreeNode::SingleString`]: `"x"` or `["x"]`.
//!
//! Neither variant picks a side. Consumers ask for the view they expect with
//! [`as_value()`](TreeNode::as_value) or [`as_list()`](TreeNode::as_list), and
//! both succeed.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::FlatfigError;

/// Scalar view of [`TreeNode::EmptyString`].
static EMPTY_STRING: Scalar = Scalar::String(String::new());

/// An opaque leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::String(_) => "string",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Boolean(_) => "boolean",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(v) => serializer.serialize_f64(*v),
            Scalar::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Boolean(b)
    }
}

/// A non-empty, comma-free string that also reads as a one-element list.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleString {
    value: Scalar,
    list: Vec<TreeNode>,
}

impl SingleString {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            list: vec![TreeNode::string(value.clone())],
            value: Scalar::String(value),
        }
    }

    pub fn as_str(&self) -> &str {
        self.value.as_str().unwrap_or_default()
    }
}

/// A node in the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Container(ContainerNode),
    List(Vec<TreeNode>),
    Value(Scalar),
    /// The empty string, or an empty list.
    EmptyString,
    /// A single string, or a list holding just that string.
    SingleString(SingleString),
}

impl TreeNode {
    /// A plain string leaf.
    pub fn string(s: impl Into<String>) -> Self {
        TreeNode::Value(Scalar::String(s.into()))
    }

    pub fn single_string(s: impl Into<String>) -> Self {
        TreeNode::SingleString(SingleString::new(s))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TreeNode::Container(_) => "container",
            TreeNode::List(_) => "list",
            TreeNode::Value(scalar) => scalar.type_name(),
            TreeNode::EmptyString => "empty string",
            TreeNode::SingleString(_) => "string",
        }
    }

    pub fn as_container(&self) -> Option<&ContainerNode> {
        match self {
            TreeNode::Container(c) => Some(c),
            _ => None,
        }
    }

    /// Scalar view. Succeeds for plain values and both ambiguous variants.
    pub fn as_value(&self) -> Option<&Scalar> {
        match self {
            TreeNode::Value(scalar) => Some(scalar),
            TreeNode::EmptyString => Some(&EMPTY_STRING),
            TreeNode::SingleString(s) => Some(&s.value),
            _ => None,
        }
    }

    /// List view. Succeeds for lists and both ambiguous variants.
    pub fn as_list(&self) -> Option<&[TreeNode]> {
        match self {
            TreeNode::List(items) => Some(items),
            TreeNode::EmptyString => Some(&[]),
            TreeNode::SingleString(s) => Some(&s.list),
            _ => None,
        }
    }

    /// Child nodes with their keys. List elements are keyed by their index.
    pub fn children(&self) -> Vec<(Cow<'_, str>, &TreeNode)> {
        match self {
            TreeNode::Container(c) => c
                .children
                .iter()
                .map(|(k, v)| (Cow::Borrowed(k.as_str()), v))
                .collect(),
            TreeNode::List(_) | TreeNode::SingleString(_) | TreeNode::EmptyString => self
                .as_list()
                .unwrap_or_default()
                .iter()
                .enumerate()
                .map(|(i, v)| (Cow::Owned(i.to_string()), v))
                .collect(),
            TreeNode::Value(_) => Vec::new(),
        }
    }

    /// Look up a direct child. List elements answer to canonical indices only
    /// (`"1"`, not `"01"` or `"+1"`).
    pub fn child(&self, key: &str) -> Option<&TreeNode> {
        match self {
            TreeNode::Container(c) => c.get(key),
            TreeNode::Value(_) => None,
            _ => {
                let index: usize = key.parse().ok()?;
                if index.to_string() != key {
                    return None;
                }
                self.as_list()?.get(index)
            }
        }
    }

    /// Look up a node by dotted path, e.g. `"servers.0.host"`.
    pub fn get(&self, path: &str) -> Option<&TreeNode> {
        path.split('.').try_fold(self, |node, segment| node.child(segment))
    }

    /// Narrow an integer value to `T`, reporting values outside `T`'s range.
    pub fn to_int<T: TryFrom<i64>>(&self) -> Result<T, FlatfigError> {
        match self.as_value() {
            Some(Scalar::Integer(i)) => T::try_from(*i).map_err(|_| FlatfigError::OutOfRange {
                value: *i,
                target: std::any::type_name::<T>(),
            }),
            _ => Err(FlatfigError::TypeMismatch {
                expected: "integer",
                found: self.kind(),
            }),
        }
    }

    /// Flatten this tree into dotted keys. See [`to_flat_map`](crate::to_flat_map).
    pub fn to_flat_map(&self) -> Result<IndexMap<String, String>, FlatfigError> {
        crate::flatten::to_flat_map(self)
    }
}

impl From<ContainerNode> for TreeNode {
    fn from(container: ContainerNode) -> Self {
        TreeNode::Container(container)
    }
}

impl From<Scalar> for TreeNode {
    fn from(scalar: Scalar) -> Self {
        TreeNode::Value(scalar)
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TreeNode::Container(c) => c.serialize(serializer),
            TreeNode::List(items) => items.serialize(serializer),
            TreeNode::Value(scalar) => scalar.serialize(serializer),
            TreeNode::EmptyString => serializer.serialize_str(""),
            TreeNode::SingleString(s) => s.value.serialize(serializer),
        }
    }
}

/// An ordered mapping from key to child node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerNode {
    children: IndexMap<String, TreeNode>,
}

impl ContainerNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn children(&self) -> &IndexMap<String, TreeNode> {
        &self.children
    }

    pub fn into_children(self) -> IndexMap<String, TreeNode> {
        self.children
    }

    pub fn get(&self, key: &str) -> Option<&TreeNode> {
        self.children.get(key)
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Insert a direct child, returning the node it replaced.
    pub fn insert(&mut self, key: impl Into<String>, node: TreeNode) -> Option<TreeNode> {
        self.children.insert(key.into(), node)
    }

    /// Set the node at a dotted path, creating intermediate containers.
    ///
    /// An existing node at the same path is overwritten. A non-container node
    /// standing where an intermediate container is needed is replaced by an
    /// empty container.
    pub fn set(&mut self, path: &str, node: TreeNode) {
        self.set_at(path, path, node);
    }

    fn set_at(&mut self, path: &str, rest: &str, node: TreeNode) {
        let Some((head, tail)) = rest.split_once('.') else {
            if self.children.insert(rest.to_string(), node).is_some() {
                debug!(path, "overwrote existing value");
            }
            return;
        };

        match self.children.get_mut(head) {
            Some(TreeNode::Container(child)) => child.set_at(path, tail, node),
            existing => {
                if let Some(existing) = existing {
                    warn!(
                        path,
                        found = existing.kind(),
                        "replacing node on path with a container"
                    );
                }
                let mut child = ContainerNode::new();
                child.set_at(path, tail, node);
                self.children.insert(head.to_string(), TreeNode::Container(child));
            }
        }
    }
}

impl FromIterator<(String, TreeNode)> for ContainerNode {
    fn from_iter<I: IntoIterator<Item = (String, TreeNode)>>(iter: I) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ContainerNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.children.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(pairs: Vec<(&str, TreeNode)>) -> ContainerNode {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn set_creates_intermediate_containers() {
        let mut root = ContainerNode::new();
        root.set("a.b.c", TreeNode::string("x"));
        let tree = TreeNode::from(root);
        assert_eq!(tree.get("a.b.c"), Some(&TreeNode::string("x")));
        assert!(tree.get("a.b").unwrap().as_container().is_some());
    }

    #[test]
    fn set_last_write_wins() {
        let mut root = ContainerNode::new();
        root.set("port", TreeNode::string("1000"));
        root.set("port", TreeNode::string("2000"));
        assert_eq!(root.len(), 1);
        assert_eq!(root.get("port"), Some(&TreeNode::string("2000")));
    }

    #[test]
    fn set_replaces_leaf_blocking_the_path() {
        let mut root = ContainerNode::new();
        root.set("a", TreeNode::string("x"));
        root.set("a.b", TreeNode::string("y"));
        let tree = TreeNode::from(root);
        assert_eq!(tree.get("a.b"), Some(&TreeNode::string("y")));
    }

    #[test]
    fn replaced_leaf_keeps_its_position() {
        let mut root = ContainerNode::new();
        root.set("a", TreeNode::string("x"));
        root.set("b", TreeNode::string("y"));
        root.set("a.c.d", TreeNode::string("z"));
        let keys: Vec<&str> = root.children().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(
            TreeNode::from(root).get("a.c.d"),
            Some(&TreeNode::string("z"))
        );
    }

    #[test]
    fn set_preserves_insertion_order() {
        let mut root = ContainerNode::new();
        root.set("zeta", TreeNode::string("1"));
        root.set("alpha", TreeNode::string("2"));
        root.set("mid", TreeNode::string("3"));
        let keys: Vec<&str> = root.children().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn empty_string_has_both_views() {
        let node = TreeNode::EmptyString;
        assert_eq!(node.as_value(), Some(&Scalar::String(String::new())));
        assert!(node.as_list().unwrap().is_empty());
        assert!(node.children().is_empty());
    }

    #[test]
    fn single_string_has_both_views() {
        let node = TreeNode::single_string("x");
        assert_eq!(node.as_value(), Some(&Scalar::from("x")));
        assert_eq!(node.as_list(), Some(&[TreeNode::string("x")][..]));
        assert_eq!(node.child("0"), Some(&TreeNode::string("x")));
        assert_eq!(node.child("1"), None);
    }

    #[test]
    fn list_children_are_keyed_by_index() {
        let node = TreeNode::List(vec![TreeNode::string("a"), TreeNode::string("b")]);
        let children = node.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].0, "0");
        assert_eq!(children[1].0, "1");
        assert_eq!(node.child("1"), Some(&TreeNode::string("b")));
    }

    #[test]
    fn list_child_rejects_non_canonical_index() {
        let node = TreeNode::List(vec![TreeNode::string("a"), TreeNode::string("b")]);
        assert_eq!(node.child("01"), None);
        assert_eq!(node.child("+1"), None);
        assert_eq!(node.child("x"), None);
    }

    #[test]
    fn get_missing_path_is_none() {
        let tree = TreeNode::from(container(vec![("a", TreeNode::string("x"))]));
        assert_eq!(tree.get("b"), None);
        assert_eq!(tree.get("a.b"), None);
    }

    #[test]
    fn plain_value_is_not_a_list() {
        let node = TreeNode::string("x");
        assert!(node.as_list().is_none());
        assert!(node.children().is_empty());
    }

    #[test]
    fn to_int_in_range() {
        let node = TreeNode::Value(Scalar::Integer(8080));
        assert_eq!(node.to_int::<u16>().unwrap(), 8080);
        assert_eq!(node.to_int::<i32>().unwrap(), 8080);
    }

    #[test]
    fn to_int_out_of_range_is_reported() {
        let node = TreeNode::Value(Scalar::Integer(i64::from(i32::MAX) + 1));
        let err = node.to_int::<i32>().unwrap_err();
        match err {
            FlatfigError::OutOfRange { value, target } => {
                assert_eq!(value, 2_147_483_648);
                assert_eq!(target, "i32");
            }
            other => panic!("Expected OutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn to_int_negative_into_unsigned_is_out_of_range() {
        let node = TreeNode::Value(Scalar::Integer(-1));
        assert!(matches!(
            node.to_int::<u32>(),
            Err(FlatfigError::OutOfRange { value: -1, .. })
        ));
    }

    #[test]
    fn to_int_on_string_is_type_mismatch() {
        let node = TreeNode::single_string("8080");
        assert!(matches!(
            node.to_int::<i32>(),
            Err(FlatfigError::TypeMismatch {
                expected: "integer",
                ..
            })
        ));
    }

    #[test]
    fn finished_trees_can_be_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TreeNode>();

        let tree = std::sync::Arc::new(TreeNode::from(container(vec![(
            "a",
            TreeNode::single_string("x"),
        )])));
        let reader = std::sync::Arc::clone(&tree);
        let handle = std::thread::spawn(move || reader.get("a").and_then(TreeNode::as_value).cloned());
        assert_eq!(handle.join().unwrap(), Some(Scalar::from("x")));
    }

    #[test]
    fn scalar_display() {
        assert_eq!(Scalar::from("x").to_string(), "x");
        assert_eq!(Scalar::from(42i64).to_string(), "42");
        assert_eq!(Scalar::from(1.5).to_string(), "1.5");
        assert_eq!(Scalar::from(true).to_string(), "true");
    }
}
