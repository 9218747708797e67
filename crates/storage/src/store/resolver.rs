#![forbid(unsafe_code)]

//! Find-or-create resolution of natural keys into surrogate ids.
//!
//! Every key resolves with the same two statements:
//!
//! 1. `INSERT .. ON CONFLICT(<natural key>) DO NOTHING RETURNING id`
//! 2. if (1) returned nothing, `SELECT id .. WHERE <natural key>`
//!
//! `SqliteStore::resolve` runs both inside one `BEGIN IMMEDIATE` transaction,
//! so concurrent resolvers of the same key serialize on the write lock and all
//! observe the single canonical row. Reference rows are never updated or
//! deleted, so an id once returned stays valid.

use super::{SqliteStore, StoreError, surrogate};
use rp_core::ids::SurrogateId;
use rp_core::keys::{
    AddressKey, ClientRefKey, ContactInfoKey, DateKey, LatitudeKey, LongitudeKey, NameKey,
    NoteKey, ProductKey, RepresentativeKey, TerritoryKey, TimePointKey, VisitKey,
};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

/// A natural key that can be resolved to the surrogate id of its reference row.
pub trait NaturalKey {
    /// Reference table the key lives in.
    fn table(&self) -> &'static str;

    /// Inserts the row if absent and returns its id. Must be called inside a
    /// transaction that already holds the write lock.
    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError>;
}

impl SqliteStore {
    /// Returns the surrogate id for `key`, creating the row on first sight.
    ///
    /// An invalid key fails with `StoreError::InvalidKey` and leaves no row behind.
    pub fn resolve<K: NaturalKey + ?Sized>(&mut self, key: &K) -> Result<SurrogateId, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let id = key.find_or_create(&tx)?;
        tx.commit()?;
        Ok(id)
    }
}

fn find_or_create(
    conn: &Connection,
    table: &'static str,
    insert_sql: &str,
    insert_params: &[&dyn ToSql],
    select_sql: &str,
    select_params: &[&dyn ToSql],
) -> Result<SurrogateId, StoreError> {
    let inserted = conn
        .query_row(insert_sql, insert_params, |row| row.get::<_, i64>(0))
        .optional()?;
    let id = match inserted {
        Some(id) => {
            log::trace!("created {table} row {id}");
            id
        }
        None => conn.query_row(select_sql, select_params, |row| row.get::<_, i64>(0))?,
    };
    surrogate(id)
}

impl NaturalKey for AddressKey {
    fn table(&self) -> &'static str {
        "addresses"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        let values = params![key.street, key.zip, key.zip_ext, key.city, key.state, key.country];
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO addresses(street, zip, zip_ext, city, state, country)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(street, zip, zip_ext, city, state, country) DO NOTHING
            RETURNING id
            "#,
            values,
            r#"
            SELECT id FROM addresses
            WHERE street=?1 AND zip=?2 AND zip_ext=?3 AND city=?4 AND state=?5 AND country=?6
            "#,
            values,
        )
    }
}

impl NaturalKey for ContactInfoKey {
    fn table(&self) -> &'static str {
        "contact_info"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        let values = params![key.phone, key.mobile, key.website];
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO contact_info(phone, mobile, website) VALUES (?1, ?2, ?3)
            ON CONFLICT(phone, mobile, website) DO NOTHING
            RETURNING id
            "#,
            values,
            "SELECT id FROM contact_info WHERE phone=?1 AND mobile=?2 AND website=?3",
            values,
        )
    }
}

impl NaturalKey for TerritoryKey {
    fn table(&self) -> &'static str {
        "territories"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        find_or_create(
            conn,
            self.table(),
            "INSERT INTO territories(name) VALUES (?1) ON CONFLICT(name) DO NOTHING RETURNING id",
            params![key.name],
            "SELECT id FROM territories WHERE name=?1",
            params![key.name],
        )
    }
}

impl NaturalKey for RepresentativeKey {
    fn table(&self) -> &'static str {
        "representatives"
    }

    // Conflicts on code only. A later call with another name neither
    // duplicates the row nor rewrites the stored name.
    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO representatives(code, name) VALUES (?1, ?2)
            ON CONFLICT(code) DO NOTHING
            RETURNING id
            "#,
            params![key.code, key.name],
            "SELECT id FROM representatives WHERE code=?1",
            params![key.code],
        )
    }
}

impl NaturalKey for NameKey {
    fn table(&self) -> &'static str {
        "names"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        find_or_create(
            conn,
            self.table(),
            "INSERT INTO names(full_name) VALUES (?1) ON CONFLICT(full_name) DO NOTHING RETURNING id",
            params![key.full_name],
            "SELECT id FROM names WHERE full_name=?1",
            params![key.full_name],
        )
    }
}

impl NaturalKey for NoteKey {
    fn table(&self) -> &'static str {
        "notes"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        find_or_create(
            conn,
            self.table(),
            "INSERT INTO notes(text) VALUES (?1) ON CONFLICT(text) DO NOTHING RETURNING id",
            params![key.text],
            "SELECT id FROM notes WHERE text=?1",
            params![key.text],
        )
    }
}

impl NaturalKey for DateKey {
    fn table(&self) -> &'static str {
        "dates"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let iso = self.iso()?;
        find_or_create(
            conn,
            self.table(),
            "INSERT INTO dates(date) VALUES (?1) ON CONFLICT(date) DO NOTHING RETURNING id",
            params![iso],
            "SELECT id FROM dates WHERE date=?1",
            params![iso],
        )
    }
}

impl NaturalKey for TimePointKey {
    fn table(&self) -> &'static str {
        "time_points"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let unix_ms = self.unix_ms()?;
        find_or_create(
            conn,
            self.table(),
            "INSERT INTO time_points(unix_ms) VALUES (?1) ON CONFLICT(unix_ms) DO NOTHING RETURNING id",
            params![unix_ms],
            "SELECT id FROM time_points WHERE unix_ms=?1",
            params![unix_ms],
        )
    }
}

impl NaturalKey for LatitudeKey {
    fn table(&self) -> &'static str {
        "latitudes"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let micro = self.micro_degrees()?;
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO latitudes(micro_degrees) VALUES (?1)
            ON CONFLICT(micro_degrees) DO NOTHING
            RETURNING id
            "#,
            params![micro],
            "SELECT id FROM latitudes WHERE micro_degrees=?1",
            params![micro],
        )
    }
}

impl NaturalKey for LongitudeKey {
    fn table(&self) -> &'static str {
        "longitudes"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let micro = self.micro_degrees()?;
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO longitudes(micro_degrees) VALUES (?1)
            ON CONFLICT(micro_degrees) DO NOTHING
            RETURNING id
            "#,
            params![micro],
            "SELECT id FROM longitudes WHERE micro_degrees=?1",
            params![micro],
        )
    }
}

impl NaturalKey for ProductKey {
    fn table(&self) -> &'static str {
        "products"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        let values = params![key.code, key.name];
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO products(code, name) VALUES (?1, ?2)
            ON CONFLICT(code, name) DO NOTHING
            RETURNING id
            "#,
            values,
            "SELECT id FROM products WHERE code=?1 AND name=?2",
            values,
        )
    }
}

impl NaturalKey for ClientRefKey {
    fn table(&self) -> &'static str {
        "client_refs"
    }

    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let key = self.canonical()?;
        let values = params![key.code, key.name];
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO client_refs(code, name) VALUES (?1, ?2)
            ON CONFLICT(code, name) DO NOTHING
            RETURNING id
            "#,
            values,
            "SELECT id FROM client_refs WHERE code=?1 AND name=?2",
            values,
        )
    }
}

impl NaturalKey for VisitKey {
    fn table(&self) -> &'static str {
        "visits"
    }

    // The end time is not part of the key; the first observed one is kept.
    fn find_or_create(&self, conn: &Connection) -> Result<SurrogateId, StoreError> {
        let start = self.start_time.get();
        let end = self.end_time.map(SurrogateId::get);
        let representative = self.representative.get();
        let client = self.client.get();
        find_or_create(
            conn,
            self.table(),
            r#"
            INSERT INTO visits(start_time_id, end_time_id, representative_id, client_ref_id)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(start_time_id, representative_id, client_ref_id) DO NOTHING
            RETURNING id
            "#,
            params![start, end, representative, client],
            r#"
            SELECT id FROM visits
            WHERE start_time_id=?1 AND representative_id=?2 AND client_ref_id=?3
            "#,
            params![start, representative, client],
        )
    }
}
