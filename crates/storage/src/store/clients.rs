#![forbid(unsafe_code)]

use super::{ClientRow, ClientWrite, SqliteStore, StoreError, WriteOutcome, opt_id, surrogate};
use rp_core::ids::SurrogateId;
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Records one observed version of a client.
    ///
    /// Client rows are history: `(code, source_timestamp)` is written once and
    /// a replay of the same version is `Unchanged`. A newer timestamp for the
    /// same code adds a row instead of overwriting the old one.
    pub fn write_client(&mut self, request: &ClientWrite) -> Result<WriteOutcome, StoreError> {
        let code = request.code.trim();
        if code.is_empty() {
            return Err(StoreError::InvalidInput("client code must not be empty"));
        }
        if request.source_timestamp < 0 {
            return Err(StoreError::InvalidInput("client timestamp must be >= 0"));
        }

        let now_ms = super::now_ms();
        let tx = self.conn.transaction()?;
        let inserted = tx
            .query_row(
                r#"
                INSERT INTO clients(
                  code, source_timestamp, active, name_id, address_id, contact_id,
                  territory_id, representative_id, contact_name_id, contact_title_id,
                  note_id, email, account_code, status, tag, created_at_ms
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
                ON CONFLICT(code, source_timestamp) DO NOTHING
                RETURNING id
                "#,
                params![
                    code,
                    request.source_timestamp,
                    if request.active { 1i64 } else { 0i64 },
                    opt_id(request.name_id),
                    opt_id(request.address_id),
                    opt_id(request.contact_id),
                    opt_id(request.territory_id),
                    opt_id(request.representative_id),
                    opt_id(request.contact_name_id),
                    opt_id(request.contact_title_id),
                    opt_id(request.note_id),
                    request.email.as_deref(),
                    request.account_code.as_deref(),
                    request.status.as_deref(),
                    request.tag.as_deref(),
                    now_ms
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        let outcome = match inserted {
            Some(id) => {
                for (ordinal, (field, value)) in request.custom_fields.iter().enumerate() {
                    tx.execute(
                        r#"
                        INSERT INTO client_custom_fields(client_id, ordinal, field, value)
                        VALUES (?1, ?2, ?3, ?4)
                        "#,
                        params![id, super::to_sqlite_i64(ordinal)?, field, value],
                    )?;
                }
                for (ordinal, name) in request.pricelists.iter().enumerate() {
                    tx.execute(
                        r#"
                        INSERT INTO client_pricelists(client_id, ordinal, pricelist_name)
                        VALUES (?1, ?2, ?3)
                        "#,
                        params![id, super::to_sqlite_i64(ordinal)?, name],
                    )?;
                }
                WriteOutcome::Inserted(surrogate(id)?)
            }
            None => {
                let id = tx.query_row(
                    "SELECT id FROM clients WHERE code=?1 AND source_timestamp=?2",
                    params![code, request.source_timestamp],
                    |row| row.get::<_, i64>(0),
                )?;
                WriteOutcome::Unchanged(surrogate(id)?)
            }
        };
        tx.commit()?;
        Ok(outcome)
    }

    /// Latest stored version of the client with `code`.
    pub fn client_get_by_code(&self, code: &str) -> Result<Option<ClientRow>, StoreError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(StoreError::InvalidInput("client code must not be empty"));
        }

        let row = self
            .conn
            .query_row(
                r#"
                SELECT id, code, source_timestamp, active, tag, territory_id, representative_id, address_id
                FROM clients
                WHERE code=?1
                ORDER BY source_timestamp DESC
                LIMIT 1
                "#,
                params![code],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<i64>>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                        row.get::<_, Option<i64>>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, code, source_timestamp, active, tag, territory, representative, address)) =
            row
        else {
            return Ok(None);
        };
        Ok(Some(ClientRow {
            id: surrogate(id)?,
            code,
            source_timestamp,
            active: active != 0,
            tag,
            territory_id: stored_id(territory)?,
            representative_id: stored_id(representative)?,
            address_id: stored_id(address)?,
        }))
    }

    pub fn client_custom_fields(&self, client: SurrogateId) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT field, value
            FROM client_custom_fields
            WHERE client_id=?1
            ORDER BY ordinal ASC
            "#,
        )?;
        let rows = stmt.query_map(params![client.get()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Pricelist names assigned to one client version, in provider order.
    pub fn client_pricelists(&self, client: SurrogateId) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT pricelist_name FROM client_pricelists WHERE client_id=?1 ORDER BY ordinal ASC",
        )?;
        let rows = stmt.query_map(params![client.get()], |row| row.get::<_, String>(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

pub(super) fn stored_id(value: Option<i64>) -> Result<Option<SurrogateId>, StoreError> {
    value.map(surrogate).transpose()
}
