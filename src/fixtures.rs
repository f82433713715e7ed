#[cfg(test)]
pub mod test {
    use std::collections::BTreeMap;

    use indexmap::IndexMap;
    use serde::{Deserialize, Serialize};

    use crate::tree::TreeNode;

    pub fn flat_map(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// A promoted string leaf.
    pub fn single(s: &str) -> TreeNode {
        TreeNode::single_string(s)
    }

    /// A promoted list of string leaves.
    pub fn strings(items: &[&str]) -> TreeNode {
        TreeNode::List(items.iter().map(|s| single(s)).collect())
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    pub struct ServerConfig {
        pub host: String,
        pub port: u16,
        pub tags: Vec<String>,
        pub proxy: Option<String>,
        pub limits: BTreeMap<String, u32>,
    }
}
