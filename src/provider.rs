//! Format providers: turn TOML or JSON text into a [`Source`].
//!
//! Native formats already distinguish lists from maps, so their trees are
//! handed over as-is, without list promotion. Flat formats go through
//! [`Source::flat`] instead (see [`PropertiesProvider`](crate::properties::PropertiesProvider)).

use std::path::Path;

use tracing::debug;

use crate::error::FlatfigError;
use crate::source::Source;
#[cfg(any(feature = "toml", feature = "json"))]
use crate::tree::{Scalar, TreeNode};

/// Parses configuration text of one format into a [`Source`].
pub trait Provider {
    /// Parse `content`. `origin` names the input in error messages.
    fn parse(&self, content: &str, origin: &str) -> Result<Source, FlatfigError>;

    fn load_str(&self, content: &str) -> Result<Source, FlatfigError> {
        self.parse(content, "<string>")
    }

    /// Read and parse a file, recording its path in the source info.
    fn load_path(&self, path: &Path) -> Result<Source, FlatfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| FlatfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let origin = path.display().to_string();
        let mut source = self.parse(&content, &origin)?;
        source.info_mut().set("path", origin);
        Ok(source)
    }
}

#[cfg(feature = "toml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlProvider;

#[cfg(feature = "toml")]
impl Provider for TomlProvider {
    fn parse(&self, content: &str, origin: &str) -> Result<Source, FlatfigError> {
        let table: toml::Table =
            toml::from_str(content).map_err(|e| FlatfigError::TomlError {
                origin: origin.into(),
                source: e,
            })?;
        debug!(origin, keys = table.len(), "loaded TOML source");
        Ok(Source::new(toml_to_tree(toml::Value::Table(table)), "TOML"))
    }
}

#[cfg(feature = "toml")]
fn toml_to_tree(value: toml::Value) -> TreeNode {
    match value {
        toml::Value::String(s) => TreeNode::Value(Scalar::String(s)),
        toml::Value::Integer(i) => TreeNode::Value(Scalar::Integer(i)),
        toml::Value::Float(f) => TreeNode::Value(Scalar::Float(f)),
        toml::Value::Boolean(b) => TreeNode::Value(Scalar::Boolean(b)),
        toml::Value::Datetime(dt) => TreeNode::Value(Scalar::String(dt.to_string())),
        toml::Value::Array(items) => TreeNode::List(items.into_iter().map(toml_to_tree).collect()),
        toml::Value::Table(table) => TreeNode::Container(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_tree(v)))
                .collect(),
        ),
    }
}

#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProvider;

#[cfg(feature = "json")]
impl Provider for JsonProvider {
    fn parse(&self, content: &str, origin: &str) -> Result<Source, FlatfigError> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|e| FlatfigError::JsonError {
                origin: origin.into(),
                source: e,
            })?;
        debug!(origin, "loaded JSON source");
        let tree = json_to_tree(value)
            .unwrap_or_else(|| TreeNode::Container(crate::tree::ContainerNode::new()));
        Ok(Source::new(tree, "JSON"))
    }
}

/// `None` for `null`, which is dropped wherever it appears.
#[cfg(feature = "json")]
fn json_to_tree(value: serde_json::Value) -> Option<TreeNode> {
    use serde_json::Value;

    let node = match value {
        Value::Null => return None,
        Value::Bool(b) => TreeNode::Value(Scalar::Boolean(b)),
        // Integers beyond i64 keep their exact digits as a string.
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => TreeNode::Value(Scalar::Integer(i)),
            (None, Some(f)) if !n.is_u64() => TreeNode::Value(Scalar::Float(f)),
            _ => TreeNode::Value(Scalar::String(n.to_string())),
        },
        Value::String(s) => TreeNode::Value(Scalar::String(s)),
        Value::Array(items) => TreeNode::List(items.into_iter().filter_map(json_to_tree).collect()),
        Value::Object(map) => TreeNode::Container(
            map.into_iter()
                .filter_map(|(k, v)| json_to_tree(v).map(|node| (k, node)))
                .collect(),
        ),
    };
    Some(node)
}
