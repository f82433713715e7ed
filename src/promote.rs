//! List promotion: decide which containers are really lists and which string
//! leaves encode lists.
//!
//! Runs post-order. Each child is rewritten first:
//!
//! - containers are promoted recursively,
//! - `"a,b,c"` becomes a list of three leaves,
//! - `""` becomes [`TreeNode::EmptyString`],
//! - any other string becomes [`TreeNode::SingleString`].
//!
//! Then a container whose keys are exactly `"0"..="N-1"` (N ≥ 1, any order)
//! becomes a list in numeric key order. Gaps, a missing `"0"`, or any extra key
//! keep it a container.

use indexmap::IndexMap;
use tracing::trace;

use crate::tree::{ContainerNode, Scalar, SingleString, TreeNode};

/// Promote a container and everything below it.
pub fn promote_to_list(container: ContainerNode) -> TreeNode {
    let children: IndexMap<String, TreeNode> = container
        .into_children()
        .into_iter()
        .map(|(key, child)| (key, promote(child)))
        .collect();

    if !is_index_sequence(&children) {
        return TreeNode::Container(children.into_iter().collect());
    }

    trace!(len = children.len(), "promoting container to list");
    let mut indexed: Vec<(usize, TreeNode)> = children
        .into_iter()
        .filter_map(|(key, child)| key.parse::<usize>().ok().map(|i| (i, child)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);
    TreeNode::List(indexed.into_iter().map(|(_, child)| child).collect())
}

/// Apply promotion to any node. Already-promoted nodes come back unchanged,
/// so promoting twice is the same as promoting once.
pub fn promote(node: TreeNode) -> TreeNode {
    match node {
        TreeNode::Container(container) => promote_to_list(container),
        TreeNode::List(items) => TreeNode::List(items.into_iter().map(promote).collect()),
        TreeNode::Value(Scalar::String(s)) => promote_string(&s),
        other => other,
    }
}

fn promote_string(value: &str) -> TreeNode {
    if value.contains(',') {
        TreeNode::List(value.split(',').map(promote_segment).collect())
    } else {
        promote_segment(value)
    }
}

fn promote_segment(segment: &str) -> TreeNode {
    if segment.is_empty() {
        TreeNode::EmptyString
    } else {
        TreeNode::SingleString(SingleString::new(segment))
    }
}

/// True when the keys are exactly `"0"`, `"1"`, ..., `"N-1"` for some N ≥ 1.
///
/// Keys are unique, so N keys that all hit the range cover it exactly.
fn is_index_sequence(children: &IndexMap<String, TreeNode>) -> bool {
    !children.is_empty() && (0..children.len()).all(|i| children.contains_key(&i.to_string()))
}
