#![forbid(unsafe_code)]

use super::*;

impl SqliteStore {
    /// Upserts the per-user layout blob; one snapshot per principal, no
    /// history. The blob must at least be well-formed JSON.
    pub fn save_layout(
        &mut self,
        principal: &Principal,
        layout_json: &str,
    ) -> Result<(), StoreError> {
        if serde_json::from_str::<serde_json::Value>(layout_json).is_err() {
            return Err(StoreError::InvalidInput("layout must be valid JSON"));
        }
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO tree_layouts(principal, layout_json, updated_at_ms)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(principal) DO UPDATE SET layout_json=excluded.layout_json, updated_at_ms=excluded.updated_at_ms
            "#,
            params![principal.identifier, layout_json, now_ms],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn load_layout(&self, principal: &Principal) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT layout_json FROM tree_layouts WHERE principal = ?1",
                params![principal.identifier],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    pub fn delete_layout(&mut self, principal: &Principal) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM tree_layouts WHERE principal = ?1",
            params![principal.identifier],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }
}
