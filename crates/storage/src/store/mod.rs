#![forbid(unsafe_code)]

mod error;
mod fetch;
mod layouts;
mod nodes;
mod requests;

pub use error::{ErrorKind, StoreError};
pub use requests::*;

use ot_core::model::{CostCode, Grant, Grantee, NodeName, PermissionKind, Principal};
use ot_core::permissions::{self, Action, NodeAccess};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("orgtree.db");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;

        let store = Self { conn, storage_dir };
        store.migrate()?;
        Ok(store)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS nodes (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              name TEXT NOT NULL,
              description TEXT,
              cost_code TEXT,
              parent_id INTEGER REFERENCES nodes(id),
              owner TEXT,
              active INTEGER NOT NULL DEFAULT 1,
              deactivated_by TEXT,
              deactivated_at_ms INTEGER,
              created_at_ms INTEGER NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_nodes_name ON nodes(lower(name));
            CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id);

            CREATE TABLE IF NOT EXISTS permissions (
              node_id INTEGER NOT NULL REFERENCES nodes(id),
              permitted TEXT NOT NULL,
              is_group INTEGER NOT NULL,
              kind TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_permissions_node ON permissions(node_id);
            CREATE INDEX IF NOT EXISTS idx_permissions_lookup ON permissions(kind, permitted);

            CREATE TABLE IF NOT EXISTS collections (
              node_id INTEGER PRIMARY KEY REFERENCES nodes(id),
              created_at_ms INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tree_layouts (
              principal TEXT PRIMARY KEY,
              layout_json TEXT NOT NULL,
              updated_at_ms INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Seeds the unique root node. Everything else is created as a child of
    /// an existing node; a second root is a structural error.
    pub fn init_root(&mut self, name: &str) -> Result<NodeRow, StoreError> {
        let name = normalize_name(name)?;
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM nodes WHERE parent_id IS NULL",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StoreError::RootAlreadyExists);
        }
        ensure_name_free_tx(&tx, &name, None)?;

        tx.execute(
            r#"
            INSERT INTO nodes(name, parent_id, active, created_at_ms, updated_at_ms)
            VALUES (?1, NULL, 1, ?2, ?2)
            "#,
            params![name, now_ms],
        )?;
        let id = tx.last_insert_rowid();
        let row = node_row_tx(&tx, id)?.ok_or(StoreError::UnknownNode)?;
        tx.commit()?;
        Ok(row)
    }

    pub fn root(&self) -> Result<Option<NodeRow>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE parent_id IS NULL"),
                [],
                node_row_from,
            )
            .optional()?)
    }

    /// Fetch by id regardless of active status; deactivated nodes stay
    /// individually addressable.
    pub fn get_node(&self, id: i64) -> Result<Option<NodeRow>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"),
                params![id],
                node_row_from,
            )
            .optional()?)
    }

    pub fn node_grants(&self, id: i64) -> Result<Vec<Grant>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT permitted, is_group, kind FROM permissions WHERE node_id = ?1 ORDER BY rowid ASC",
        )?;
        let rows = stmt.query_map(params![id], grant_from)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn has_collection(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT 1 FROM collections WHERE node_id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?
            .is_some())
    }

    /// All children ids in ascending id order, regardless of active status.
    pub fn children_of(&self, id: i64) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM nodes WHERE parent_id = ?1 ORDER BY id ASC")?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Ancestor chain from the root down to the node's direct parent; empty
    /// exactly for the root.
    pub fn parents(&self, id: i64) -> Result<Vec<NodeRow>, StoreError> {
        let mut node = self.get_node(id)?.ok_or(StoreError::UnknownNode)?;
        let mut chain = Vec::new();
        let mut seen = vec![id];
        while let Some(parent_id) = node.parent_id {
            if seen.contains(&parent_id) {
                break;
            }
            seen.push(parent_id);
            let Some(parent) = self.get_node(parent_id)? else {
                break;
            };
            chain.push(parent.clone());
            node = parent;
        }
        chain.reverse();
        Ok(chain)
    }
}

const NODE_COLUMNS: &str = "id, name, description, cost_code, parent_id, owner, active, \
                            deactivated_by, deactivated_at_ms, created_at_ms, updated_at_ms";

fn node_row_from(row: &rusqlite::Row<'_>) -> rusqlite::Result<NodeRow> {
    Ok(NodeRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        cost_code: row.get(3)?,
        parent_id: row.get(4)?,
        owner: row.get(5)?,
        active: row.get(6)?,
        deactivated_by: row.get(7)?,
        deactivated_at_ms: row.get(8)?,
        created_at_ms: row.get(9)?,
        updated_at_ms: row.get(10)?,
    })
}

fn grant_from(row: &rusqlite::Row<'_>) -> rusqlite::Result<Grant> {
    let permitted: String = row.get(0)?;
    let is_group: bool = row.get(1)?;
    let kind_raw: String = row.get(2)?;
    let grantee = if is_group {
        Grantee::Group(permitted)
    } else {
        Grantee::Individual(permitted)
    };
    let kind = PermissionKind::parse(&kind_raw).unwrap_or(PermissionKind::Read);
    Ok(Grant { grantee, kind })
}

fn now_ms() -> i64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    now.as_millis() as i64
}

fn normalize_name(raw: &str) -> Result<String, StoreError> {
    match NodeName::try_new(raw) {
        Ok(name) => Ok(name.into_string()),
        Err(ot_core::model::NodeNameError::Empty) => Err(StoreError::NameBlank),
        Err(err) => Err(StoreError::InvalidInput(err.message())),
    }
}

fn normalize_cost_code(raw: &str) -> Result<Option<String>, StoreError> {
    match CostCode::parse(raw) {
        Ok(code) => Ok(code.map(CostCode::into_string)),
        Err(_) => Err(StoreError::InvalidCostCode),
    }
}

fn node_row_tx(tx: &Transaction<'_>, id: i64) -> Result<Option<NodeRow>, StoreError> {
    Ok(tx
        .query_row(
            &format!("SELECT {NODE_COLUMNS} FROM nodes WHERE id = ?1"),
            params![id],
            node_row_from,
        )
        .optional()?)
}

fn grants_tx(tx: &Transaction<'_>, id: i64) -> Result<Vec<Grant>, StoreError> {
    let mut stmt = tx.prepare(
        "SELECT permitted, is_group, kind FROM permissions WHERE node_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![id], grant_from)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn node_access_tx(tx: &Transaction<'_>, node: &NodeRow) -> Result<NodeAccess, StoreError> {
    let grants = grants_tx(tx, node.id)?;
    let mut access = NodeAccess {
        is_root: node.is_root(),
        owner: node.owner.clone(),
        write_grants: Vec::new(),
        spend_grants: Vec::new(),
    };
    for grant in grants {
        match grant.kind {
            PermissionKind::Write => access.write_grants.push(grant.grantee),
            PermissionKind::Spend => access.spend_grants.push(grant.grantee),
            PermissionKind::Read => {}
        }
    }
    Ok(access)
}

fn ensure_can_perform_tx(
    tx: &Transaction<'_>,
    principal: &Principal,
    action: Action,
    node: &NodeRow,
    what: &'static str,
) -> Result<(), StoreError> {
    let access = node_access_tx(tx, node)?;
    if permissions::can_perform(principal, action, &access) {
        Ok(())
    } else {
        Err(StoreError::Forbidden(what))
    }
}

fn ensure_name_free_tx(
    tx: &Transaction<'_>,
    name: &str,
    exclude: Option<i64>,
) -> Result<(), StoreError> {
    let taken: Option<i64> = tx
        .query_row(
            "SELECT id FROM nodes WHERE lower(name) = lower(?1)",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    match taken {
        Some(id) if Some(id) != exclude => Err(StoreError::NameTaken {
            name: name.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Full grant replacement, never a merge. The owner is dropped from every
/// list: ownership already implies every permission kind and duplicating it
/// in the grant rows would only drift.
fn replace_grants_tx(
    tx: &Transaction<'_>,
    node_id: i64,
    owner: Option<&str>,
    grants: &[Grant],
) -> Result<(), StoreError> {
    tx.execute("DELETE FROM permissions WHERE node_id = ?1", params![node_id])?;
    let mut seen: Vec<(&str, bool, PermissionKind)> = Vec::new();
    for grant in grants {
        let name = grant.grantee.name();
        let is_group = grant.grantee.is_group();
        if !is_group && owner == Some(name) {
            continue;
        }
        if seen.contains(&(name, is_group, grant.kind)) {
            continue;
        }
        seen.push((name, is_group, grant.kind));
        tx.execute(
            "INSERT INTO permissions(node_id, permitted, is_group, kind) VALUES (?1, ?2, ?3, ?4)",
            params![node_id, name, is_group, grant.kind.as_str()],
        )?;
    }
    Ok(())
}

fn attach_collection_tx(tx: &Transaction<'_>, node_id: i64, now_ms: i64) -> Result<(), StoreError> {
    tx.execute(
        "INSERT OR IGNORE INTO collections(node_id, created_at_ms) VALUES (?1, ?2)",
        params![node_id, now_ms],
    )?;
    Ok(())
}

fn has_collection_tx(tx: &Transaction<'_>, node_id: i64) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM collections WHERE node_id = ?1",
            params![node_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

/// Walks up from `id`; true when `ancestor` appears in the chain.
fn is_descendant_of_tx(tx: &Transaction<'_>, id: i64, ancestor: i64) -> Result<bool, StoreError> {
    let mut current = Some(id);
    let mut seen = Vec::new();
    while let Some(node_id) = current {
        if node_id == ancestor {
            return Ok(true);
        }
        if seen.contains(&node_id) {
            break;
        }
        seen.push(node_id);
        current = tx
            .query_row(
                "SELECT parent_id FROM nodes WHERE id = ?1",
                params![node_id],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
    }
    Ok(false)
}
