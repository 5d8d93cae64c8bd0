#![forbid(unsafe_code)]

use super::*;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

impl SqliteStore {
    /// Filtered flat fetch. Returns each node with its grants, collection
    /// flag and children ids so the materializer can run without further
    /// queries.
    pub fn fetch_nodes(&self, filter: &NodeFilter) -> Result<Vec<NodeRecord>, StoreError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if !filter.include_inactive {
            // Active-only is the default view unless explicitly overridden.
            let active = filter.active.unwrap_or(true);
            clauses.push("active = ?".to_string());
            args.push(Value::Integer(if active { 1 } else { 0 }));
        }

        match filter.cost_code {
            Some(CostCodePresence::None) => clauses.push("cost_code IS NULL".to_string()),
            Some(CostCodePresence::NotNone) => clauses.push("cost_code IS NOT NULL".to_string()),
            None => {}
        }

        if let Some(predicate) = &filter.permission {
            let (kind, grantee) = match predicate {
                PermissionPredicate::ReadableBy(grantee) => (PermissionKind::Read, grantee),
                PermissionPredicate::WritableBy(grantee) => (PermissionKind::Write, grantee),
                PermissionPredicate::ExecutableBy(grantee) => (PermissionKind::Spend, grantee),
            };
            let mut clause = String::from(
                "EXISTS (SELECT 1 FROM permissions p \
                 WHERE p.node_id = nodes.id AND p.kind = ? AND p.permitted = ? AND p.is_group = ?)",
            );
            args.push(Value::Text(kind.as_str().to_string()));
            args.push(Value::Text(grantee.name().to_string()));
            args.push(Value::Integer(if grantee.is_group() { 1 } else { 0 }));
            // Owners hold every permission kind without an explicit row.
            if let Grantee::Individual(name) = grantee {
                clause = format!("({clause} OR owner = ?)");
                args.push(Value::Text(name.clone()));
            }
            clauses.push(clause);
        }

        let mut sql = format!("SELECT {NODE_COLUMNS} FROM nodes");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), node_row_from)?;
        let nodes = rows.collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(nodes.len());
        for node in nodes {
            let grants = self.node_grants(node.id)?;
            let has_collection = self.has_collection(node.id)?;
            let children = self.children_of(node.id)?;
            records.push(NodeRecord {
                node,
                grants,
                has_collection,
                children,
            });
        }
        Ok(records)
    }
}
