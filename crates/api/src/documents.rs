#![forbid(unsafe_code)]

use crate::support::ts_ms_to_rfc3339;
use ot_core::layout::LayoutSnapshot;
use ot_core::model::Principal;
use ot_core::model::PermissionKind;
use ot_core::permissions::{self, Action, NodeAccess};
use ot_core::tree::TreeNode;
use ot_storage::{ErrorKind, NodeRecord, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A stored node rendered for the transport layer, with the
/// principal-dependent flags already computed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeDocument {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "cost-code")]
    pub cost_code: Option<String>,
    #[serde(rename = "parent-id")]
    pub parent_id: Option<i64>,
    pub owner: Option<String>,
    pub active: bool,
    pub writable: bool,
    #[serde(rename = "owned-by-current-user")]
    pub owned_by_current_user: bool,
    #[serde(rename = "has-collection")]
    pub has_collection: bool,
    #[serde(rename = "deactivated-by")]
    pub deactivated_by: Option<String>,
    #[serde(rename = "deactivated-at")]
    pub deactivated_at: Option<String>,
}

/// Which consumption shape `render_tree` emits: the box-tree hierarchy or
/// the flat searchable index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeMode {
    Hierarchy,
    Index,
}

/// The persisted per-user layout blob. Absent fields deserialize to empty:
/// "nothing of that kind hidden" is not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDocument {
    #[serde(rename = "hideParent", default)]
    pub hide_parent: Vec<i64>,
    #[serde(rename = "hideChildren", default)]
    pub hide_children: Vec<i64>,
    #[serde(rename = "hideSiblings", default)]
    pub hide_siblings: Vec<i64>,
}

impl From<LayoutSnapshot> for LayoutDocument {
    fn from(snapshot: LayoutSnapshot) -> Self {
        Self {
            hide_parent: snapshot.hide_parent,
            hide_children: snapshot.hide_children,
            hide_siblings: snapshot.hide_siblings,
        }
    }
}

impl From<LayoutDocument> for LayoutSnapshot {
    fn from(document: LayoutDocument) -> Self {
        Self {
            hide_parent: document.hide_parent,
            hide_children: document.hide_children,
            hide_siblings: document.hide_siblings,
        }
    }
}

impl NodeDocument {
    pub fn from_record(record: &NodeRecord, principal: &Principal) -> Self {
        let node = &record.node;
        let mut access = NodeAccess {
            is_root: node.is_root(),
            owner: node.owner.clone(),
            write_grants: Vec::new(),
            spend_grants: Vec::new(),
        };
        for grant in &record.grants {
            match grant.kind {
                PermissionKind::Write => access.write_grants.push(grant.grantee.clone()),
                PermissionKind::Spend => access.spend_grants.push(grant.grantee.clone()),
                PermissionKind::Read => {}
            }
        }
        Self {
            id: node.id,
            name: node.name.clone(),
            description: node.description.clone(),
            cost_code: node.cost_code.clone(),
            parent_id: node.parent_id,
            owner: node.owner.clone(),
            active: node.active,
            writable: permissions::can_perform(principal, Action::Write, &access),
            owned_by_current_user: node.owner.as_deref() == Some(principal.identifier.as_str()),
            has_collection: record.has_collection,
            deactivated_by: node.deactivated_by.clone(),
            deactivated_at: node.deactivated_at_ms.map(ts_ms_to_rfc3339),
        }
    }
}

/// Renders a materialized tree in one of the two labelled shapes. The
/// hierarchy labels fields for box-tree consumption and carries expansion
/// state; the index labels them for flat search and does not.
pub fn render_tree(nodes: &[TreeNode], mode: TreeMode) -> Value {
    Value::Array(nodes.iter().map(|node| render_node(node, mode)).collect())
}

fn render_node(node: &TreeNode, mode: TreeMode) -> Value {
    let class_name = if node.owned {
        "owned-by-current-user"
    } else {
        ""
    };
    let mut doc = match mode {
        TreeMode::Hierarchy => json!({
            "id": node.id,
            "name": node.name,
            "cost_code": node.cost_code,
            "className": class_name,
            "writable": node.writable,
            "href": node.id.to_string(),
            "state": { "expanded": node.expanded },
        }),
        TreeMode::Index => json!({
            "id": node.id,
            "text": node.name,
            "cost_code": node.cost_code,
            "className": class_name,
            "writable": node.writable,
            "href": format!("/nodes/{}", node.id),
        }),
    };
    if let Some(children) = &node.children {
        let key = match mode {
            TreeMode::Hierarchy => "children",
            TreeMode::Index => "nodes",
        };
        let rendered: Vec<Value> = children.iter().map(|child| render_node(child, mode)).collect();
        if let Some(map) = doc.as_object_mut() {
            map.insert(key.to_string(), Value::Array(rendered));
        }
    }
    doc
}

/// The error envelope handed back to the transport layer, with an
/// HTTP-equivalent status so "forbidden" renders apart from "bad request".
pub fn error_document(err: &StoreError) -> Value {
    let (status, title) = match err.kind() {
        ErrorKind::Validation => ("422", "Validation failed"),
        ErrorKind::Structural => ("422", "Structural constraint violated"),
        ErrorKind::Conflict => ("409", "Conflicting state"),
        ErrorKind::Authorization => ("403", "Forbidden"),
        ErrorKind::Internal => ("500", "Internal error"),
    };
    json!({
        "errors": [{
            "status": status,
            "title": title,
            "detail": err.to_string(),
        }]
    })
}
