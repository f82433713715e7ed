//! A loaded configuration tree plus metadata about where it came from.

use indexmap::IndexMap;

use crate::error::FlatfigError;
use crate::flat::flat_tree;
use crate::tree::TreeNode;

/// Ordered string metadata describing a source. Always has a `"type"` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    entries: IndexMap<String, String>,
}

impl SourceInfo {
    pub fn new(kind: &str) -> Self {
        let mut entries = IndexMap::new();
        entries.insert("type".to_string(), kind.to_string());
        Self { entries }
    }

    /// The source type, e.g. `"flat"` or `"TOML"`.
    pub fn kind(&self) -> &str {
        self.get("type").unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    info: SourceInfo,
    tree: TreeNode,
}

impl Source {
    pub fn new(tree: TreeNode, kind: &str) -> Self {
        Self {
            info: SourceInfo::new(kind),
            tree,
        }
    }

    /// Build and promote a tree from `(dotted_path, value)` pairs.
    pub fn flat<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self::new(flat_tree(entries), "flat")
    }

    /// Read `{PREFIX}__*` variables from the process environment.
    pub fn from_env(prefix: &str) -> Self {
        crate::env::env_source(prefix, std::env::vars())
    }

    /// Replace the source type. An empty `kind` keeps the current one.
    pub fn with_type(mut self, kind: &str) -> Self {
        if !kind.is_empty() {
            self.info.set("type", kind);
        }
        self
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut SourceInfo {
        &mut self.info
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    pub fn into_tree(self) -> TreeNode {
        self.tree
    }

    /// Look up a node by dotted path.
    pub fn get(&self, path: &str) -> Result<&TreeNode, FlatfigError> {
        self.tree
            .get(path)
            .ok_or_else(|| FlatfigError::KeyNotFound(path.into()))
    }

    pub fn to_flat_map(&self) -> Result<IndexMap<String, String>, FlatfigError> {
        self.tree.to_flat_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{flat_map, single, strings};

    #[test]
    fn flat_source_defaults_to_flat_type() {
        let source = Source::flat(flat_map(&[("a", "x")]));
        assert_eq!(source.info().kind(), "flat");
    }

    #[test]
    fn with_type_replaces_kind() {
        let source = Source::flat(flat_map(&[("a", "x")])).with_type("custom");
        assert_eq!(source.info().kind(), "custom");
    }

    #[test]
    fn with_empty_type_keeps_kind() {
        let source = Source::flat(flat_map(&[("a", "x")])).with_type("");
        assert_eq!(source.info().kind(), "flat");
    }

    #[test]
    fn flat_source_is_promoted() {
        let source = Source::flat(flat_map(&[("a.0", "x"), ("a.1", "y"), ("b", "1,2")]));
        assert_eq!(source.get("a").unwrap(), &strings(&["x", "y"]));
        assert_eq!(source.get("b").unwrap(), &strings(&["1", "2"]));
        assert_eq!(source.get("a.1").unwrap(), &single("y"));
    }

    #[test]
    fn missing_key_is_key_not_found() {
        let source = Source::flat(flat_map(&[("a", "x")]));
        assert!(matches!(
            source.get("b"),
            Err(FlatfigError::KeyNotFound(key)) if key == "b"
        ));
    }

    #[test]
    fn info_keeps_insertion_order() {
        let mut info = SourceInfo::new("flat");
        info.set("path", "/etc/app.properties");
        let entries: Vec<(&str, &str)> = info.iter().collect();
        assert_eq!(
            entries,
            vec![("type", "flat"), ("path", "/etc/app.properties")]
        );
    }

    #[test]
    fn source_flattens_back() {
        let input = flat_map(&[("server.host", "localhost"), ("server.tags", "a,b")]);
        let source = Source::flat(input.clone());
        assert_eq!(source.to_flat_map().unwrap(), input);
    }
}
