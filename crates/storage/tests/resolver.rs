#![forbid(unsafe_code)]

use rp_core::keys::{
    AddressKey, ClientRefKey, ContactInfoKey, DateKey, KeyError, LatitudeKey, LongitudeKey,
    NameKey, RepresentativeKey, TerritoryKey, TimePointKey, VisitKey,
};
use rp_storage::{SqliteStore, StoreError};
use rusqlite::{Connection, params};
use std::path::PathBuf;
use time::macros::{date, datetime};

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("rp_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn main_street() -> AddressKey {
    AddressKey {
        street: "1 Main St".to_string(),
        zip: "10001".to_string(),
        city: "Springfield".to_string(),
        ..AddressKey::default()
    }
}

#[test]
fn resolving_the_same_key_twice_returns_one_row() {
    let storage_dir = temp_dir("resolving_the_same_key_twice_returns_one_row");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let first = store.resolve(&main_street()).expect("resolve address");
    let second = store.resolve(&main_street()).expect("resolve address again");

    assert_eq!(first, second);
    assert_eq!(store.count_rows("addresses").expect("count"), 1);
}

#[test]
fn distinct_keys_get_distinct_ids() {
    let storage_dir = temp_dir("distinct_keys_get_distinct_ids");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let north = store.resolve(&TerritoryKey::new("North")).expect("north");
    let south = store.resolve(&TerritoryKey::new("South")).expect("south");

    assert_ne!(north, south);
    assert_eq!(store.count_rows("territories").expect("count"), 2);
}

#[test]
fn key_parts_are_trimmed_before_matching() {
    let storage_dir = temp_dir("key_parts_are_trimmed_before_matching");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let plain = store.resolve(&NameKey::new("Acme Corp")).expect("plain");
    let padded = store.resolve(&NameKey::new("  Acme Corp ")).expect("padded");

    assert_eq!(plain, padded);
    assert_eq!(store.count_rows("names").expect("count"), 1);
}

#[test]
fn empty_representative_code_is_rejected_without_a_row() {
    let storage_dir = temp_dir("empty_representative_code_is_rejected_without_a_row");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store
        .resolve(&RepresentativeKey::new("", "Jane Doe"))
        .expect_err("empty code must fail");
    assert!(matches!(err, StoreError::InvalidKey(KeyError::Empty(_))));
    assert!(err.is_invalid_input());
    assert_eq!(store.count_rows("representatives").expect("count"), 0);
}

#[test]
fn representative_keeps_the_first_name_it_was_stored_with() {
    let storage_dir = temp_dir("representative_keeps_the_first_name_it_was_stored_with");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let first = store
        .resolve(&RepresentativeKey::new("R7", "Jane Doe"))
        .expect("first");
    let renamed = store
        .resolve(&RepresentativeKey::new("R7", "Jane Smith"))
        .expect("renamed");
    assert_eq!(first, renamed);
    assert_eq!(store.count_rows("representatives").expect("count"), 1);

    let conn = Connection::open(storage_dir.join("repsync.db")).expect("open db");
    let name: String = conn
        .query_row(
            "SELECT name FROM representatives WHERE code=?1",
            params!["R7"],
            |row| row.get(0),
        )
        .expect("stored name");
    assert_eq!(name, "Jane Doe");
}

#[test]
fn contact_info_requires_at_least_one_channel() {
    let storage_dir = temp_dir("contact_info_requires_at_least_one_channel");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store
        .resolve(&ContactInfoKey::default())
        .expect_err("empty contact");
    assert!(err.is_invalid_input());

    let phone_only = ContactInfoKey {
        phone: "555-0100".to_string(),
        ..ContactInfoKey::default()
    };
    store.resolve(&phone_only).expect("phone only");
    assert_eq!(store.count_rows("contact_info").expect("count"), 1);
}

#[test]
fn coordinates_equal_after_rounding_share_a_row() {
    let storage_dir = temp_dir("coordinates_equal_after_rounding_share_a_row");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let a = store.resolve(&LatitudeKey::new(45.1234567)).expect("a");
    let b = store.resolve(&LatitudeKey::new(45.12345671)).expect("b");
    let c = store.resolve(&LatitudeKey::new(45.123457)).expect("c");
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(store.count_rows("latitudes").expect("count"), 1);

    let err = store
        .resolve(&LongitudeKey::new(181.0))
        .expect_err("out of range");
    assert!(matches!(err, StoreError::InvalidKey(KeyError::OutOfRange(_))));
    assert_eq!(store.count_rows("longitudes").expect("count"), 0);
}

#[test]
fn time_points_and_dates_are_canonical() {
    let storage_dir = temp_dir("time_points_and_dates_are_canonical");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let utc = store
        .resolve(&TimePointKey::new(datetime!(2024-03-07 10:00 UTC)))
        .expect("utc");
    let offset = store
        .resolve(&TimePointKey::new(datetime!(2024-03-07 12:00 +02:00)))
        .expect("offset");
    assert_eq!(utc, offset);
    assert_eq!(store.count_rows("time_points").expect("count"), 1);

    let day = store.resolve(&DateKey::new(date!(2024-03-07))).expect("day");
    let again = store.resolve(&DateKey::new(date!(2024-03-07))).expect("again");
    assert_eq!(day, again);
}

#[test]
fn visits_are_keyed_on_start_representative_and_client() {
    let storage_dir = temp_dir("visits_are_keyed_on_start_representative_and_client");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let start = store
        .resolve(&TimePointKey::new(datetime!(2024-03-07 09:00 UTC)))
        .expect("start");
    let end = store
        .resolve(&TimePointKey::new(datetime!(2024-03-07 09:30 UTC)))
        .expect("end");
    let rep = store
        .resolve(&RepresentativeKey::new("R1", "Rep One"))
        .expect("rep");
    let client = store
        .resolve(&ClientRefKey::new("C1", "Client One"))
        .expect("client");

    let visit = store
        .resolve(&VisitKey {
            start_time: start,
            end_time: Some(end),
            representative: rep,
            client,
        })
        .expect("visit");
    let without_end = store
        .resolve(&VisitKey {
            start_time: start,
            end_time: None,
            representative: rep,
            client,
        })
        .expect("visit again");

    assert_eq!(visit, without_end);
    assert_eq!(store.count_rows("visits").expect("count"), 1);
}

#[test]
fn stores_on_the_same_directory_share_reference_rows() {
    let storage_dir = temp_dir("stores_on_the_same_directory_share_reference_rows");
    let mut first = SqliteStore::open(&storage_dir).expect("open first");
    let mut second = SqliteStore::open(&storage_dir).expect("open second");

    let a = first.resolve(&main_street()).expect("first resolve");
    let b = second.resolve(&main_street()).expect("second resolve");
    assert_eq!(a, b);
}

#[test]
fn concurrent_resolvers_agree_on_one_id() {
    let storage_dir = temp_dir("concurrent_resolvers_agree_on_one_id");
    // Create the schema once so the workers race on data, not on migration.
    drop(SqliteStore::open(&storage_dir).expect("open store"));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dir = storage_dir.clone();
            std::thread::spawn(move || {
                let mut store = SqliteStore::open(&dir).expect("open worker store");
                (0..25)
                    .map(|_| store.resolve(&TerritoryKey::new("North")).expect("resolve"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.extend(handle.join().expect("worker panicked"));
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let store = SqliteStore::open(&storage_dir).expect("reopen");
    assert_eq!(store.count_rows("territories").expect("count"), 1);
}

#[test]
fn count_rows_rejects_unknown_tables() {
    let storage_dir = temp_dir("count_rows_rejects_unknown_tables");
    let store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store
        .count_rows("sqlite_master; DROP TABLE clients")
        .expect_err("unknown table");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}
