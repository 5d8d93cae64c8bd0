#![forbid(unsafe_code)]

use ot_core::model::Grant;

/// A stored node, as wide as the `nodes` table.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cost_code: Option<String>,
    pub parent_id: Option<i64>,
    pub owner: Option<String>,
    pub active: bool,
    pub deactivated_by: Option<String>,
    pub deactivated_at_ms: Option<i64>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl NodeRow {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A fetched node together with the related data the materializer needs, so
/// no further queries happen after a fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub node: NodeRow,
    pub grants: Vec<Grant>,
    pub has_collection: bool,
    /// All children ids, regardless of active status; presentation-side
    /// filtering decides which of them resolve.
    pub children: Vec<i64>,
}

#[derive(Clone, Debug)]
pub struct CreateNodeRequest {
    pub parent_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Raw cost code input; blank is stored as absent.
    pub cost_code: String,
    pub grants: Vec<Grant>,
}

/// Edit payload; the outer Option means untouched. `description: Some(None)`
/// clears the field, `None` leaves it alone.
#[derive(Clone, Debug, Default)]
pub struct UpdateNodeRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub cost_code: Option<String>,
    /// When present, fully replaces the node's grants (destroy then
    /// recreate, never a merge).
    pub grants: Option<Vec<Grant>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostCodePresence {
    None,
    NotNone,
}

/// Which grantee must hold which permission for a node to match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PermissionPredicate {
    ReadableBy(ot_core::model::Grantee),
    WritableBy(ot_core::model::Grantee),
    ExecutableBy(ot_core::model::Grantee),
}

/// Fetch filter. Active-only is the default view; `active: Some(false)`
/// selects deactivated nodes and `include_inactive` disables the cut
/// entirely.
#[derive(Clone, Debug, Default)]
pub struct NodeFilter {
    pub cost_code: Option<CostCodePresence>,
    pub active: Option<bool>,
    pub include_inactive: bool,
    pub permission: Option<PermissionPredicate>,
}
