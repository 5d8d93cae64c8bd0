#![forbid(unsafe_code)]

//! Pure permission evaluation over already-loaded node data.
//!
//! The store is responsible for structural escalation (a create-child checks
//! the parent, a reparent checks the node and the destination); this module
//! only answers whether one principal may act on one node.

use crate::model::{Grantee, Principal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    CreateChild,
    Write,
    Delete,
}

/// The slice of a node the engine needs: depth marker, ownership, and the
/// explicit grants attached to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeAccess {
    pub is_root: bool,
    pub owner: Option<String>,
    pub write_grants: Vec<Grantee>,
    pub spend_grants: Vec<Grantee>,
}

/// Rule order: root exemption, ownership, explicit write grant, deny.
///
/// The root is the sole universally-writable anchor of the tree: any
/// authenticated principal may write to it or create children under it.
pub fn can_perform(principal: &Principal, action: Action, node: &NodeAccess) -> bool {
    match action {
        // All three write-class actions share the same per-node rules; they
        // differ only in which nodes the caller must evaluate them against.
        Action::CreateChild | Action::Write | Action::Delete => {
            if node.is_root {
                return true;
            }
            if is_owner(principal, node) {
                return true;
            }
            grants_match(principal, &node.write_grants)
        }
    }
}

/// Spend-class access follows the same ladder against the spend grants.
pub fn can_spend(principal: &Principal, node: &NodeAccess) -> bool {
    if node.is_root || is_owner(principal, node) {
        return true;
    }
    grants_match(principal, &node.spend_grants)
}

fn is_owner(principal: &Principal, node: &NodeAccess) -> bool {
    node.owner.as_deref() == Some(principal.identifier.as_str())
}

fn grants_match(principal: &Principal, grants: &[Grantee]) -> bool {
    grants.iter().any(|grantee| match grantee {
        Grantee::Individual(name) => name == &principal.identifier,
        Grantee::Group(name) => principal.in_group(name),
    })
}
