#![forbid(unsafe_code)]

//! Converts a flat, relationally-linked node set into nested parent/child
//! structures.
//!
//! The materializer never touches storage: it resolves every relationship
//! against the supplied set and nothing else. Identifiers the set does not
//! contain stand for nodes the caller was not allowed to see (or filtered
//! out) and are skipped without error.

use std::collections::{HashMap, HashSet};

/// One record of the flat input set.
#[derive(Clone, Debug, PartialEq)]
pub struct FlatNode {
    pub id: i64,
    pub name: String,
    pub cost_code: Option<String>,
    pub writable: bool,
    pub owned: bool,
    /// `None` means the node carried no children relationship at all;
    /// `Some(vec![])` means the relationship existed but resolved to nothing.
    pub children: Option<Vec<i64>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub id: i64,
    pub name: String,
    pub cost_code: Option<String>,
    pub writable: bool,
    pub owned: bool,
    pub expanded: bool,
    pub children: Option<Vec<TreeNode>>,
}

/// Single-pass child -> parent index over the children relationships.
fn child_parent_index(nodes: &[FlatNode]) -> HashMap<i64, i64> {
    let mut parents = HashMap::new();
    for node in nodes {
        if let Some(children) = &node.children {
            for child in children {
                parents.insert(*child, node.id);
            }
        }
    }
    parents
}

/// Nodes no other node in the set lists as a child. The set may be a partial
/// subtree, so a local root is not necessarily the global root.
pub fn local_roots(nodes: &[FlatNode]) -> Vec<i64> {
    let index = child_parent_index(nodes);
    nodes
        .iter()
        .filter(|node| !index.contains_key(&node.id))
        .map(|node| node.id)
        .collect()
}

/// Expands the flat set into nested trees, one per local root, preserving the
/// input order of roots and of each children list.
///
/// A node referenced by more than one parent (which the tree invariant rules
/// out upstream) is emitted once per referencing parent rather than rejected;
/// duplicated output is the detectable symptom of that anomaly.
pub fn materialize(nodes: &[FlatNode], expanded: &HashSet<i64>) -> Vec<TreeNode> {
    let by_id: HashMap<i64, &FlatNode> = nodes.iter().map(|node| (node.id, node)).collect();
    local_roots(nodes)
        .iter()
        .filter_map(|id| by_id.get(id))
        .map(|node| build(node, &by_id, expanded, 0))
        .collect()
}

// Depth guard: corrupt input where a node lists an ancestor as its child
// would otherwise recurse forever.
const MAX_DEPTH: usize = 256;

fn build(
    node: &FlatNode,
    by_id: &HashMap<i64, &FlatNode>,
    expanded: &HashSet<i64>,
    depth: usize,
) -> TreeNode {
    let children = if depth >= MAX_DEPTH {
        node.children.as_ref().map(|_| Vec::new())
    } else {
        node.children.as_ref().map(|ids| {
            ids.iter()
                .filter_map(|id| by_id.get(id))
                .map(|child| build(child, by_id, expanded, depth + 1))
                .collect()
        })
    };
    TreeNode {
        id: node.id,
        name: node.name.clone(),
        cost_code: node.cost_code.clone(),
        writable: node.writable,
        owned: node.owned,
        expanded: expanded.contains(&node.id),
        children,
    }
}

/// Walks from `target` up through the child -> parent index, collecting every
/// ancestor identifier inclusive of the target itself, target first. The
/// result is the expand-set that reveals the target in the rendered tree.
pub fn find_expanded_ids(nodes: &[FlatNode], target: Option<i64>) -> Vec<i64> {
    let Some(mut current) = target else {
        return Vec::new();
    };
    let parents = child_parent_index(nodes);
    let mut expanded = vec![current];
    let mut seen: HashSet<i64> = expanded.iter().copied().collect();
    while let Some(parent) = parents.get(&current) {
        if !seen.insert(*parent) {
            break;
        }
        expanded.push(*parent);
        current = *parent;
    }
    expanded
}
