#![forbid(unsafe_code)]

use super::clients::stored_id;
use super::{
    PricelistItemWrite, PricelistRow, PricelistWrite, SqliteStore, StoreError, WriteOutcome,
    opt_id, surrogate,
};
use rusqlite::{OptionalExtension, Transaction, params};

impl SqliteStore {
    /// Upserts a pricelist by name.
    ///
    /// The stored item set is replaced by `request.items` whenever the
    /// pricelist changed; an identical replay is `Unchanged` and touches nothing.
    pub fn write_pricelist(&mut self, request: &PricelistWrite) -> Result<WriteOutcome, StoreError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("pricelist name must not be empty"));
        }
        if request.items.iter().any(|item| !item.price.is_finite()) {
            return Err(StoreError::InvalidInput("pricelist item price must be finite"));
        }

        let now_ms = super::now_ms();
        let tx = self.conn.transaction()?;
        let existing = tx
            .query_row(
                r#"
                SELECT id, external_id, is_default, active, use_prices
                FROM pricelists
                WHERE name=?1
                "#,
                params![name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)? != 0,
                        row.get::<_, i64>(3)? != 0,
                        row.get::<_, i64>(4)? != 0,
                    ))
                },
            )
            .optional()?;

        let outcome = match existing {
            None => {
                let id = tx.query_row(
                    r#"
                    INSERT INTO pricelists(
                      name, external_id, is_default, active, use_prices, created_at_ms, updated_at_ms
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                    RETURNING id
                    "#,
                    params![
                        name,
                        request.external_id,
                        flag(request.is_default),
                        flag(request.active),
                        flag(request.use_prices),
                        now_ms
                    ],
                    |row| row.get::<_, i64>(0),
                )?;
                insert_items_tx(&tx, id, &request.items)?;
                WriteOutcome::Inserted(surrogate(id)?)
            }
            Some((id, external_id, is_default, active, use_prices)) => {
                let same_header = external_id == request.external_id
                    && is_default == request.is_default
                    && active == request.active
                    && use_prices == request.use_prices;
                if same_header && load_items_tx(&tx, id)? == request.items {
                    WriteOutcome::Unchanged(surrogate(id)?)
                } else {
                    tx.execute(
                        r#"
                        UPDATE pricelists
                        SET external_id=?2, is_default=?3, active=?4, use_prices=?5, updated_at_ms=?6
                        WHERE id=?1
                        "#,
                        params![
                            id,
                            request.external_id,
                            flag(request.is_default),
                            flag(request.active),
                            flag(request.use_prices),
                            now_ms
                        ],
                    )?;
                    tx.execute(
                        "DELETE FROM pricelist_items WHERE pricelist_id=?1",
                        params![id],
                    )?;
                    insert_items_tx(&tx, id, &request.items)?;
                    WriteOutcome::Updated(surrogate(id)?)
                }
            }
        };
        tx.commit()?;
        Ok(outcome)
    }

    pub fn pricelist_get_by_name(&self, name: &str) -> Result<Option<PricelistRow>, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("pricelist name must not be empty"));
        }

        let row = self
            .conn
            .query_row(
                r#"
                SELECT p.id, p.name, p.external_id, p.is_default, p.active, p.use_prices,
                       (SELECT COUNT(1) FROM pricelist_items i WHERE i.pricelist_id = p.id)
                FROM pricelists p
                WHERE p.name=?1
                "#,
                params![name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)? != 0,
                        row.get::<_, i64>(4)? != 0,
                        row.get::<_, i64>(5)? != 0,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, external_id, is_default, active, use_prices, item_count)) = row else {
            return Ok(None);
        };
        Ok(Some(PricelistRow {
            id: surrogate(id)?,
            name,
            external_id,
            is_default,
            active,
            use_prices,
            item_count: u64::try_from(item_count).unwrap_or(0),
        }))
    }
}

fn flag(value: bool) -> i64 {
    if value { 1 } else { 0 }
}

fn insert_items_tx(
    tx: &Transaction<'_>,
    pricelist_id: i64,
    items: &[PricelistItemWrite],
) -> Result<(), StoreError> {
    let mut stmt = tx.prepare(
        r#"
        INSERT INTO pricelist_items(
          pricelist_id, ordinal, product_id, price, active, client_ref_id, manufacture_id,
          available_from_id, available_to_id, min_quantity, max_quantity
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )?;
    for (ordinal, item) in items.iter().enumerate() {
        stmt.execute(params![
            pricelist_id,
            super::to_sqlite_i64(ordinal)?,
            item.product_id.get(),
            item.price,
            flag(item.active),
            opt_id(item.client_ref_id),
            item.manufacture_id.as_deref(),
            opt_id(item.available_from_id),
            opt_id(item.available_to_id),
            item.min_quantity,
            item.max_quantity
        ])?;
    }
    Ok(())
}

fn load_items_tx(
    tx: &Transaction<'_>,
    pricelist_id: i64,
) -> Result<Vec<PricelistItemWrite>, StoreError> {
    let mut stmt = tx.prepare(
        r#"
        SELECT product_id, price, active, client_ref_id, manufacture_id,
               available_from_id, available_to_id, min_quantity, max_quantity
        FROM pricelist_items
        WHERE pricelist_id=?1
        ORDER BY ordinal ASC
        "#,
    )?;
    let mut rows = stmt.query(params![pricelist_id])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(PricelistItemWrite {
            product_id: surrogate(row.get(0)?)?,
            price: row.get(1)?,
            active: row.get::<_, i64>(2)? != 0,
            client_ref_id: stored_id(row.get(3)?)?,
            manufacture_id: row.get(4)?,
            available_from_id: stored_id(row.get(5)?)?,
            available_to_id: stored_id(row.get(6)?)?,
            min_quantity: row.get(7)?,
            max_quantity: row.get(8)?,
        });
    }
    Ok(out)
}
