#![forbid(unsafe_code)]

use super::{FormWrite, SqliteStore, StoreError, WriteOutcome, opt_id, surrogate};
use rusqlite::{OptionalExtension, params};

impl SqliteStore {
    /// Stores a submitted form. Submissions are immutable upstream, so the
    /// provider `FormID` is written once and replays are `Unchanged`.
    pub fn write_form(&mut self, request: &FormWrite) -> Result<WriteOutcome, StoreError> {
        if request.external_id <= 0 {
            return Err(StoreError::InvalidInput("form id must be positive"));
        }

        let now_ms = super::now_ms();
        let tx = self.conn.transaction()?;
        let inserted = tx
            .query_row(
                r#"
                INSERT INTO forms(
                  external_id, name_id, client_ref_id, representative_id, address_id,
                  contact_id, territory_id, latitude_id, longitude_id, submitted_at_id,
                  visit_id, visit_external_id, signature_url, email, created_at_ms
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                ON CONFLICT(external_id) DO NOTHING
                RETURNING id
                "#,
                params![
                    request.external_id,
                    request.name_id.get(),
                    opt_id(request.client_ref_id),
                    opt_id(request.representative_id),
                    opt_id(request.address_id),
                    opt_id(request.contact_id),
                    opt_id(request.territory_id),
                    opt_id(request.latitude_id),
                    opt_id(request.longitude_id),
                    opt_id(request.submitted_at_id),
                    opt_id(request.visit_id),
                    request.visit_external_id,
                    request.signature_url.as_deref(),
                    request.email.as_deref(),
                    now_ms
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        let outcome = match inserted {
            Some(id) => {
                for (ordinal, (field, value)) in request.items.iter().enumerate() {
                    tx.execute(
                        r#"
                        INSERT INTO form_items(form_id, ordinal, field, value)
                        VALUES (?1, ?2, ?3, ?4)
                        "#,
                        params![id, super::to_sqlite_i64(ordinal)?, field, value],
                    )?;
                }
                WriteOutcome::Inserted(surrogate(id)?)
            }
            None => {
                let id = tx.query_row(
                    "SELECT id FROM forms WHERE external_id=?1",
                    params![request.external_id],
                    |row| row.get::<_, i64>(0),
                )?;
                WriteOutcome::Unchanged(surrogate(id)?)
            }
        };
        tx.commit()?;
        Ok(outcome)
    }

    /// Question/answer pairs of the form with provider id `external_id`, in
    /// submission order. Empty when the form is unknown.
    pub fn form_items(&self, external_id: i64) -> Result<Vec<(String, String)>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT i.field, i.value
            FROM form_items i
            JOIN forms f ON f.id = i.form_id
            WHERE f.external_id=?1
            ORDER BY i.ordinal ASC
            "#,
        )?;
        let rows = stmt.query_map(params![external_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
