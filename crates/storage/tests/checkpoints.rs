#![forbid(unsafe_code)]

use rp_core::entity::EntityType;
use rp_core::ids::Cursor;
use rp_storage::{SqliteStore, StoreError};
use std::path::PathBuf;

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

#[test]
fn unknown_entity_starts_at_the_beginning() {
    let storage_dir = temp_dir("unknown_entity_starts_at_the_beginning");
    let store = SqliteStore::open(&storage_dir).expect("open store");

    assert_eq!(
        store.checkpoint_get(EntityType::Forms).expect("get"),
        Cursor::BEGINNING
    );
    assert!(store.checkpoint_list().expect("list").is_empty());
}

#[test]
fn checkpoint_only_moves_forward() {
    let storage_dir = temp_dir("checkpoint_only_moves_forward");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    assert!(store
        .checkpoint_set(EntityType::Clients, Cursor::new(500))
        .expect("advance"));
    assert!(!store
        .checkpoint_set(EntityType::Clients, Cursor::new(400))
        .expect("regress"));
    assert!(!store
        .checkpoint_set(EntityType::Clients, Cursor::new(500))
        .expect("repeat"));
    assert_eq!(
        store.checkpoint_get(EntityType::Clients).expect("get"),
        Cursor::new(500)
    );

    assert!(store
        .checkpoint_set(EntityType::Clients, Cursor::new(501))
        .expect("advance again"));
    assert_eq!(
        store.checkpoint_get(EntityType::Clients).expect("get"),
        Cursor::new(501)
    );
}

#[test]
fn checkpoints_are_independent_per_entity() {
    let storage_dir = temp_dir("checkpoints_are_independent_per_entity");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    store
        .checkpoint_set(EntityType::Clients, Cursor::new(10))
        .expect("clients");
    store
        .checkpoint_set(EntityType::Pricelists, Cursor::new(3))
        .expect("pricelists");

    let rows = store.checkpoint_list().expect("list");
    let listed: Vec<_> = rows.iter().map(|row| (row.entity, row.cursor)).collect();
    assert_eq!(
        listed,
        vec![
            (EntityType::Clients, Cursor::new(10)),
            (EntityType::Pricelists, Cursor::new(3)),
        ]
    );
    assert_eq!(
        store.checkpoint_get(EntityType::Forms).expect("forms"),
        Cursor::BEGINNING
    );
}

#[test]
fn negative_cursor_is_rejected() {
    let storage_dir = temp_dir("negative_cursor_is_rejected");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store
        .checkpoint_set(EntityType::Forms, Cursor::new(-1))
        .expect_err("negative cursor");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn checkpoint_survives_reopen() {
    let storage_dir = temp_dir("checkpoint_survives_reopen");
    {
        let mut store = SqliteStore::open(&storage_dir).expect("open store");
        store
            .checkpoint_set(EntityType::Forms, Cursor::new(77))
            .expect("set");
    }
    let store = SqliteStore::open(&storage_dir).expect("reopen store");
    assert_eq!(
        store.checkpoint_get(EntityType::Forms).expect("get"),
        Cursor::new(77)
    );
}
