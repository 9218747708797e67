#![forbid(unsafe_code)]

use super::{CheckpointRow, SqliteStore, StoreError};
use rp_core::entity::EntityType;
use rp_core::ids::Cursor;
use rusqlite::OptionalExtension;
use rusqlite::params;

impl SqliteStore {
    /// Last committed cursor for `entity`, or `Cursor::BEGINNING` if it never synced.
    pub fn checkpoint_get(&self, entity: EntityType) -> Result<Cursor, StoreError> {
        let cursor = self
            .conn
            .query_row(
                "SELECT cursor FROM sync_checkpoints WHERE entity_type=?1",
                params![entity.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(cursor.map(Cursor::new).unwrap_or(Cursor::BEGINNING))
    }

    /// Moves the checkpoint forward to `cursor`. Returns `false` when the stored
    /// cursor is already at or past it; the checkpoint never goes backwards.
    pub fn checkpoint_set(&mut self, entity: EntityType, cursor: Cursor) -> Result<bool, StoreError> {
        if cursor.get() < 0 {
            return Err(StoreError::InvalidInput("cursor must be >= 0"));
        }

        let now_ms = super::now_ms();
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            r#"
            INSERT INTO sync_checkpoints(entity_type, cursor, created_at_ms, updated_at_ms)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(entity_type) DO UPDATE SET
              cursor=excluded.cursor,
              updated_at_ms=excluded.updated_at_ms
            WHERE excluded.cursor > sync_checkpoints.cursor
            "#,
            params![entity.as_str(), cursor.get(), now_ms],
        )?;
        tx.commit()?;

        let advanced = changed > 0;
        if advanced {
            log::debug!("{entity} checkpoint advanced to {cursor}");
        }
        Ok(advanced)
    }

    pub fn checkpoint_list(&self) -> Result<Vec<CheckpointRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT entity_type, cursor, updated_at_ms
            FROM sync_checkpoints
            ORDER BY entity_type ASC
            "#,
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            // Rows written by a newer build for an unknown entity are skipped.
            let Some(entity) = EntityType::parse(&name) else {
                continue;
            };
            out.push(CheckpointRow {
                entity,
                cursor: Cursor::new(row.get(1)?),
                updated_at_ms: row.get(2)?,
            });
        }
        Ok(out)
    }
}
