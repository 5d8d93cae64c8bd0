#![forbid(unsafe_code)]

//! Records which branches of the rendered tree a user has hidden and
//! restores that state onto a later, possibly drifted, snapshot of the tree.
//!
//! The consuming widget distinguishes three hide gestures with distinct
//! redraw semantics: hiding the link above a node, collapsing a node's
//! children, and sliding a node's siblings away. A snapshot is the diff
//! against "everything expanded" expressed as one id list per gesture.

use std::collections::BTreeMap;

/// The four exclusivity markers a hidden node can carry. A node is visible
/// iff none of them are set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slide {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Slide {
    pub fn any(self) -> bool {
        self.up || self.down || self.left || self.right
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChartNode {
    pub id: i64,
    pub parent: Option<i64>,
    pub slide: Slide,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

/// A flat view-state model of the rendered tree. Ordered by id so sibling
/// enumeration is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chart {
    nodes: BTreeMap<i64, ChartNode>,
}

impl Chart {
    pub fn from_edges(edges: &[(i64, Option<i64>)]) -> Self {
        let mut nodes = BTreeMap::new();
        for (id, parent) in edges {
            nodes.insert(
                *id,
                ChartNode {
                    id: *id,
                    parent: *parent,
                    slide: Slide::default(),
                },
            );
        }
        Self { nodes }
    }

    pub fn get(&self, id: i64) -> Option<&ChartNode> {
        self.nodes.get(&id)
    }

    /// Unknown ids are simply not visible.
    pub fn is_visible(&self, id: i64) -> bool {
        self.nodes
            .get(&id)
            .map(|node| !node.slide.any())
            .unwrap_or(false)
    }

    pub fn parent_of(&self, id: i64) -> Option<i64> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    /// Children in ascending id order.
    pub fn children_of(&self, id: i64) -> Vec<i64> {
        self.nodes
            .values()
            .filter(|node| node.parent == Some(id))
            .map(|node| node.id)
            .collect()
    }

    /// Nodes sharing this node's parent, excluding the node itself, in
    /// ascending id order.
    pub fn siblings_of(&self, id: i64) -> Vec<i64> {
        let Some(parent) = self.parent_of(id) else {
            return Vec::new();
        };
        self.nodes
            .values()
            .filter(|node| node.parent == Some(parent) && node.id != id)
            .map(|node| node.id)
            .collect()
    }

    /// The next or previous sibling located by numeric id comparison. The
    /// underlying render order is not guaranteed stable, so positions are
    /// never derived from array indexes.
    pub fn sibling_for(&self, id: i64, direction: Direction) -> Option<i64> {
        let siblings = self.siblings_of(id);
        match direction {
            Direction::Left => siblings.iter().rev().find(|s| **s < id).copied(),
            Direction::Right => siblings.iter().find(|s| **s > id).copied(),
        }
    }

    fn descendants_of(&self, id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut queue = self.children_of(id);
        while let Some(next) = queue.pop() {
            if out.contains(&next) {
                continue;
            }
            out.push(next);
            queue.extend(self.children_of(next));
        }
        out
    }

    /// Hides the structure above this node. The widget folds the whole upper
    /// part level by level: the node's siblings slide away first, then the
    /// parent slides up, then the same repeats from the parent while its own
    /// parent is still visible.
    pub fn hide_parent(&mut self, id: i64) {
        if self
            .siblings_of(id)
            .iter()
            .any(|sibling| self.is_visible(*sibling))
        {
            self.hide_siblings(id);
        }
        let Some(parent) = self.parent_of(id) else {
            return;
        };
        let grandparent_visible = self
            .parent_of(parent)
            .map(|grandparent| self.is_visible(grandparent))
            .unwrap_or(false);
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.slide.up = true;
        }
        if grandparent_visible {
            self.hide_parent(parent);
        }
    }

    /// Collapses this node's branch: every descendant slides down.
    pub fn hide_children(&mut self, id: i64) {
        for descendant in self.descendants_of(id) {
            if let Some(node) = self.nodes.get_mut(&descendant) {
                node.slide.down = true;
            }
        }
    }

    /// Slides this node's siblings away: smaller ids go left, larger ids go
    /// right, and each sibling's subtree slides down with it.
    pub fn hide_siblings(&mut self, id: i64) {
        for sibling in self.siblings_of(id) {
            for descendant in self.descendants_of(sibling) {
                if let Some(node) = self.nodes.get_mut(&descendant) {
                    node.slide.down = true;
                }
            }
            if let Some(node) = self.nodes.get_mut(&sibling) {
                if sibling < id {
                    node.slide.left = true;
                } else {
                    node.slide.right = true;
                }
            }
        }
    }

    fn visible_ids(&self) -> Vec<i64> {
        self.nodes
            .values()
            .filter(|node| !node.slide.any())
            .map(|node| node.id)
            .collect()
    }
}

/// The persisted diff against "everything expanded".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutSnapshot {
    pub hide_parent: Vec<i64>,
    pub hide_children: Vec<i64>,
    pub hide_siblings: Vec<i64>,
}

impl LayoutSnapshot {
    pub fn is_empty(&self) -> bool {
        self.hide_parent.is_empty() && self.hide_children.is_empty() && self.hide_siblings.is_empty()
    }
}

/// Inspects every currently-visible node and records, per hide gesture, the
/// nodes whose corresponding neighbor relation exists but is hidden. Each
/// node appears at most once per category.
pub fn capture(chart: &Chart) -> LayoutSnapshot {
    let mut snapshot = LayoutSnapshot::default();
    for id in chart.visible_ids() {
        if let Some(parent) = chart.parent_of(id) {
            if !chart.is_visible(parent) {
                snapshot.hide_parent.push(id);
            }
        }
        let children = chart.children_of(id);
        if !children.is_empty() && children.iter().all(|child| !chart.is_visible(*child)) {
            snapshot.hide_children.push(id);
        }
        let siblings = chart.siblings_of(id);
        if !siblings.is_empty() && siblings.iter().any(|sibling| !chart.is_visible(*sibling)) {
            snapshot.hide_siblings.push(id);
        }
    }
    snapshot
}

/// Replays a snapshot onto a fresh chart. Identifiers that no longer exist,
/// and nodes some earlier replay step already hid, are skipped silently; that
/// is what lets a stale snapshot apply cleanly to a drifted tree.
pub fn apply(snapshot: &LayoutSnapshot, chart: &mut Chart) {
    for id in &snapshot.hide_parent {
        if chart.is_visible(*id) {
            chart.hide_parent(*id);
        }
    }
    for id in &snapshot.hide_children {
        if chart.is_visible(*id) {
            chart.hide_children(*id);
        }
    }
    for id in &snapshot.hide_siblings {
        if chart.is_visible(*id) {
            chart.hide_siblings(*id);
        }
    }
}
