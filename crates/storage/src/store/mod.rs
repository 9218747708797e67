#![forbid(unsafe_code)]

mod checkpoints;
mod clients;
mod error;
mod forms;
mod pricelists;
mod requests;
mod resolver;
mod support;

pub use error::StoreError;
pub use requests::*;
pub use resolver::NaturalKey;

use rp_core::ids::SurrogateId;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE_NAME: &str = "repsync.db";
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Tables that `count_rows` may be asked about.
const COUNTABLE_TABLES: &[&str] = &[
    "addresses",
    "contact_info",
    "territories",
    "representatives",
    "names",
    "notes",
    "dates",
    "time_points",
    "latitudes",
    "longitudes",
    "products",
    "client_refs",
    "visits",
    "clients",
    "client_custom_fields",
    "client_pricelists",
    "forms",
    "form_items",
    "pricelists",
    "pricelist_items",
    "sync_checkpoints",
];

/// Façade over one SQLite connection.
///
/// Holds no cached rows: every call goes to the database, so several stores
/// (threads, processes) opened on the same directory stay consistent.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join(DB_FILE_NAME);
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        support::migrate_sqlite_schema(&conn)?;
        log::debug!("opened store at {}", storage_dir.display());

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn count_rows(&self, table: &str) -> Result<u64, StoreError> {
        let Some(table) = COUNTABLE_TABLES.iter().find(|known| **known == table) else {
            return Err(StoreError::InvalidInput("unknown table"));
        };
        let count = self.conn.query_row(
            &format!("SELECT COUNT(1) FROM {table}"),
            params![],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

fn surrogate(value: i64) -> Result<SurrogateId, StoreError> {
    SurrogateId::new(value).map_err(|_| StoreError::InvalidId(value))
}

fn opt_id(value: Option<SurrogateId>) -> Option<i64> {
    value.map(SurrogateId::get)
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
