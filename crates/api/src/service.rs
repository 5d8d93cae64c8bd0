#![forbid(unsafe_code)]

use crate::documents::{LayoutDocument, NodeDocument, TreeMode, render_tree};
use crate::grants::parse_grant_list;
use ot_core::model::{Grant, PermissionKind, Principal};
use ot_core::tree::{self, FlatNode};
use ot_storage::{
    CreateNodeRequest, NodeFilter, NodeRecord, SqliteStore, StoreError, UpdateNodeRequest,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// The create payload as the transport hands it over: attributes plus the
/// four comma-separated permission lists of the original form.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateNodeForm {
    pub parent_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost_code: String,
    #[serde(default)]
    pub user_writers: Option<String>,
    #[serde(default)]
    pub group_writers: Option<String>,
    #[serde(default)]
    pub user_spenders: Option<String>,
    #[serde(default)]
    pub group_spenders: Option<String>,
}

/// The edit payload. Like the original form it carries the full attribute
/// set and the full permission lists; an update always replaces both.
#[derive(Clone, Debug, Deserialize)]
pub struct UpdateNodeForm {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost_code: String,
    #[serde(default)]
    pub user_writers: Option<String>,
    #[serde(default)]
    pub group_writers: Option<String>,
    #[serde(default)]
    pub user_spenders: Option<String>,
    #[serde(default)]
    pub group_spenders: Option<String>,
}

fn collect_grants(
    user_writers: Option<&str>,
    group_writers: Option<&str>,
    user_spenders: Option<&str>,
    group_spenders: Option<&str>,
    owner: Option<&str>,
) -> Vec<Grant> {
    let mut grants = Vec::new();
    grants.extend(parse_grant_list(
        user_writers,
        false,
        PermissionKind::Write,
        owner,
    ));
    grants.extend(parse_grant_list(
        group_writers,
        true,
        PermissionKind::Write,
        owner,
    ));
    grants.extend(parse_grant_list(
        user_spenders,
        false,
        PermissionKind::Spend,
        owner,
    ));
    grants.extend(parse_grant_list(
        group_spenders,
        true,
        PermissionKind::Spend,
        owner,
    ));
    grants
}

/// Facade over the node store for an external transport: every entry point
/// takes the already-authenticated principal and returns either a document
/// or a typed error.
#[derive(Debug)]
pub struct NodeService {
    store: SqliteStore,
}

impl NodeService {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self {
            store: SqliteStore::open(storage_dir)?,
        })
    }

    pub fn init_root(&mut self, name: &str) -> Result<i64, StoreError> {
        Ok(self.store.init_root(name)?.id)
    }

    pub fn root_id(&self) -> Result<Option<i64>, StoreError> {
        Ok(self.store.root()?.map(|node| node.id))
    }

    /// Ancestor ids from the root down to the direct parent; empty exactly
    /// for the root.
    pub fn parents(&self, id: i64) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .store
            .parents(id)?
            .into_iter()
            .map(|node| node.id)
            .collect())
    }

    pub fn fetch(
        &self,
        filter: &NodeFilter,
        principal: &Principal,
    ) -> Result<Vec<NodeDocument>, StoreError> {
        let records = self.store.fetch_nodes(filter)?;
        Ok(records
            .iter()
            .map(|record| NodeDocument::from_record(record, principal))
            .collect())
    }

    pub fn create(
        &mut self,
        form: CreateNodeForm,
        principal: &Principal,
    ) -> Result<NodeDocument, StoreError> {
        let grants = collect_grants(
            form.user_writers.as_deref(),
            form.group_writers.as_deref(),
            form.user_spenders.as_deref(),
            form.group_spenders.as_deref(),
            Some(principal.identifier.as_str()),
        );
        let row = self.store.create_node(
            CreateNodeRequest {
                parent_id: form.parent_id,
                name: form.name,
                description: form.description,
                cost_code: form.cost_code,
                grants,
            },
            principal,
        )?;
        self.document_for(row.id, principal)
    }

    pub fn update(
        &mut self,
        id: i64,
        form: UpdateNodeForm,
        principal: &Principal,
    ) -> Result<NodeDocument, StoreError> {
        let owner = self
            .store
            .get_node(id)?
            .ok_or(StoreError::UnknownNode)?
            .owner;
        let grants = collect_grants(
            form.user_writers.as_deref(),
            form.group_writers.as_deref(),
            form.user_spenders.as_deref(),
            form.group_spenders.as_deref(),
            owner.as_deref(),
        );
        let row = self.store.update_node(
            id,
            UpdateNodeRequest {
                name: Some(form.name),
                description: Some(form.description),
                cost_code: Some(form.cost_code),
                grants: Some(grants),
            },
            principal,
        )?;
        self.document_for(row.id, principal)
    }

    pub fn reparent(
        &mut self,
        id: i64,
        new_parent_id: i64,
        principal: &Principal,
    ) -> Result<NodeDocument, StoreError> {
        let row = self.store.reparent_node(id, new_parent_id, principal)?;
        self.document_for(row.id, principal)
    }

    pub fn deactivate(&mut self, id: i64, principal: &Principal) -> Result<NodeDocument, StoreError> {
        let row = self.store.deactivate_node(id, principal)?;
        self.document_for(row.id, principal)
    }

    /// The active tree in one of the two labelled shapes. In hierarchy mode
    /// the ancestor path of `current` (inclusive) is pre-expanded so the
    /// target is revealed on first render.
    pub fn tree_document(
        &self,
        mode: TreeMode,
        current: Option<i64>,
        principal: &Principal,
    ) -> Result<Value, StoreError> {
        let records = self.store.fetch_nodes(&NodeFilter::default())?;
        let flat: Vec<FlatNode> = records
            .iter()
            .map(|record| {
                let doc = NodeDocument::from_record(record, principal);
                FlatNode {
                    id: record.node.id,
                    name: record.node.name.clone(),
                    cost_code: record.node.cost_code.clone(),
                    writable: doc.writable,
                    owned: doc.owned_by_current_user,
                    children: Some(record.children.clone()),
                }
            })
            .collect();
        let expanded: HashSet<i64> = match mode {
            TreeMode::Hierarchy => tree::find_expanded_ids(&flat, current).into_iter().collect(),
            TreeMode::Index => HashSet::new(),
        };
        let nested = tree::materialize(&flat, &expanded);
        Ok(render_tree(&nested, mode))
    }

    pub fn save_layout(
        &mut self,
        principal: &Principal,
        layout: &LayoutDocument,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string(layout)
            .map_err(|_| StoreError::InvalidInput("layout failed to serialize"))?;
        self.store.save_layout(principal, &json)
    }

    /// A stored blob that no longer parses is treated as stale, not as an
    /// error.
    pub fn load_layout(&self, principal: &Principal) -> Result<Option<LayoutDocument>, StoreError> {
        let Some(raw) = self.store.load_layout(principal)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&raw).ok())
    }

    pub fn delete_layout(&mut self, principal: &Principal) -> Result<bool, StoreError> {
        self.store.delete_layout(principal)
    }

    fn document_for(&self, id: i64, principal: &Principal) -> Result<NodeDocument, StoreError> {
        let node = self.store.get_node(id)?.ok_or(StoreError::UnknownNode)?;
        let record = NodeRecord {
            grants: self.store.node_grants(id)?,
            has_collection: self.store.has_collection(id)?,
            children: self.store.children_of(id)?,
            node,
        };
        Ok(NodeDocument::from_record(&record, principal))
    }
}
