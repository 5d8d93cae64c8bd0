#![forbid(unsafe_code)]

use super::*;

impl SqliteStore {
    /// Creates a node under an existing parent. Validation, the permission
    /// check against the parent, the insert, the grant rows, and the
    /// collection attach for program-depth nodes all commit or roll back
    /// together.
    pub fn create_node(
        &mut self,
        request: CreateNodeRequest,
        principal: &Principal,
    ) -> Result<NodeRow, StoreError> {
        let name = normalize_name(&request.name)?;
        let cost_code = normalize_cost_code(&request.cost_code)?;
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let Some(parent) = node_row_tx(&tx, request.parent_id)? else {
            return Err(StoreError::UnknownParent);
        };
        // Creating under the root needs no grant; anywhere else the acting
        // principal must hold write on the parent.
        if !parent.is_root() {
            ensure_can_perform_tx(
                &tx,
                principal,
                Action::CreateChild,
                &parent,
                "create this node",
            )?;
        }
        ensure_name_free_tx(&tx, &name, None)?;

        tx.execute(
            r#"
            INSERT INTO nodes(name, description, cost_code, parent_id, owner, active, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
            "#,
            params![
                name,
                request.description,
                cost_code,
                parent.id,
                principal.identifier,
                now_ms
            ],
        )?;
        let id = tx.last_insert_rowid();
        replace_grants_tx(&tx, id, Some(principal.identifier.as_str()), &request.grants)?;

        // Direct children of the root own a collection from birth.
        if parent.is_root() {
            attach_collection_tx(&tx, id, now_ms)?;
        }

        let row = node_row_tx(&tx, id)?.ok_or(StoreError::UnknownNode)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn update_node(
        &mut self,
        id: i64,
        request: UpdateNodeRequest,
        principal: &Principal,
    ) -> Result<NodeRow, StoreError> {
        if request.name.is_none()
            && request.description.is_none()
            && request.cost_code.is_none()
            && request.grants.is_none()
        {
            return Err(StoreError::InvalidInput("no fields to edit"));
        }

        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let Some(node) = node_row_tx(&tx, id)? else {
            return Err(StoreError::UnknownNode);
        };
        ensure_can_perform_tx(&tx, principal, Action::Write, &node, "update this node")?;

        let name = match request.name {
            Some(raw) => {
                let name = normalize_name(&raw)?;
                ensure_name_free_tx(&tx, &name, Some(id))?;
                name
            }
            None => node.name.clone(),
        };
        let cost_code = match request.cost_code {
            Some(raw) => normalize_cost_code(&raw)?,
            None => node.cost_code.clone(),
        };
        let description = request.description.unwrap_or(node.description.clone());

        tx.execute(
            r#"
            UPDATE nodes
            SET name = ?2, description = ?3, cost_code = ?4, updated_at_ms = ?5
            WHERE id = ?1
            "#,
            params![id, name, description, cost_code, now_ms],
        )?;

        if let Some(grants) = request.grants {
            replace_grants_tx(&tx, id, node.owner.as_deref(), &grants)?;
        }

        let row = node_row_tx(&tx, id)?.ok_or(StoreError::UnknownNode)?;
        tx.commit()?;
        Ok(row)
    }

    /// Moves a node under a new parent. Requires write on the node and on
    /// the destination (root destination exempt). A move to program depth
    /// attaches a collection when the node has none; a move away never
    /// detaches one.
    pub fn reparent_node(
        &mut self,
        id: i64,
        new_parent_id: i64,
        principal: &Principal,
    ) -> Result<NodeRow, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let Some(node) = node_row_tx(&tx, id)? else {
            return Err(StoreError::UnknownNode);
        };
        if node.is_root() {
            return Err(StoreError::RootImmovable);
        }
        ensure_can_perform_tx(&tx, principal, Action::Write, &node, "move this node")?;

        let Some(destination) = node_row_tx(&tx, new_parent_id)? else {
            return Err(StoreError::UnknownParent);
        };
        if !destination.is_root() {
            ensure_can_perform_tx(
                &tx,
                principal,
                Action::Write,
                &destination,
                "move a node here",
            )?;
        }
        if is_descendant_of_tx(&tx, destination.id, id)? {
            return Err(StoreError::ParentCycle);
        }

        tx.execute(
            "UPDATE nodes SET parent_id = ?2, updated_at_ms = ?3 WHERE id = ?1",
            params![id, destination.id, now_ms],
        )?;

        if destination.is_root() && !has_collection_tx(&tx, id)? {
            attach_collection_tx(&tx, id, now_ms)?;
        }

        let row = node_row_tx(&tx, id)?.ok_or(StoreError::UnknownNode)?;
        tx.commit()?;
        Ok(row)
    }

    /// Soft delete. Blocked while any active child remains; never reversible
    /// through this interface, and never touches the node's collection.
    pub fn deactivate_node(
        &mut self,
        id: i64,
        principal: &Principal,
    ) -> Result<NodeRow, StoreError> {
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let Some(node) = node_row_tx(&tx, id)? else {
            return Err(StoreError::UnknownNode);
        };
        if node.is_root() {
            return Err(StoreError::RootImmovable);
        }
        if !node.active {
            return Err(StoreError::AlreadyDeactivated);
        }
        ensure_can_perform_tx(&tx, principal, Action::Delete, &node, "delete this node")?;

        let active_child: Option<i64> = tx
            .query_row(
                "SELECT id FROM nodes WHERE parent_id = ?1 AND active = 1 LIMIT 1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        if active_child.is_some() {
            return Err(StoreError::HasActiveChildren);
        }

        tx.execute(
            r#"
            UPDATE nodes
            SET active = 0, deactivated_by = ?2, deactivated_at_ms = ?3, updated_at_ms = ?3
            WHERE id = ?1
            "#,
            params![id, principal.identifier, now_ms],
        )?;

        let row = node_row_tx(&tx, id)?.ok_or(StoreError::UnknownNode)?;
        tx.commit()?;
        Ok(row)
    }
}
