#![forbid(unsafe_code)]

use rp_core::keys::{NameKey, ProductKey, TerritoryKey};
use rp_storage::{
    ClientWrite, FormWrite, PricelistItemWrite, PricelistWrite, SqliteStore, StoreError,
    WriteOutcome,
};
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

fn client(code: &str, source_timestamp: i64) -> ClientWrite {
    ClientWrite {
        code: code.to_string(),
        source_timestamp,
        active: true,
        name_id: None,
        address_id: None,
        contact_id: None,
        territory_id: None,
        representative_id: None,
        contact_name_id: None,
        contact_title_id: None,
        note_id: None,
        email: None,
        account_code: None,
        status: None,
        tag: None,
        custom_fields: Vec::new(),
        pricelists: Vec::new(),
    }
}

#[test]
fn client_versions_are_written_once() {
    let storage_dir = temp_dir("client_versions_are_written_once");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let north = store.resolve(&TerritoryKey::new("North")).expect("north");

    let mut request = client("C1", 1);
    request.territory_id = Some(north);
    request.custom_fields = vec![("Segment".to_string(), "Retail".to_string())];
    request.tag = Some("vip".to_string());
    request.pricelists = vec!["Retail".to_string(), "Wholesale".to_string()];

    let first = store.write_client(&request).expect("first write");
    let replay = store.write_client(&request).expect("replay");
    assert!(matches!(first, WriteOutcome::Inserted(_)));
    assert_eq!(replay, WriteOutcome::Unchanged(first.id()));
    assert_eq!(store.count_rows("clients").expect("count"), 1);
    assert_eq!(store.count_rows("client_custom_fields").expect("count"), 1);
    assert_eq!(store.count_rows("client_pricelists").expect("count"), 2);

    let newer = store.write_client(&client("C1", 2)).expect("newer version");
    assert!(matches!(newer, WriteOutcome::Inserted(_)));
    assert_eq!(store.count_rows("clients").expect("count"), 2);

    let latest = store
        .client_get_by_code("C1")
        .expect("get")
        .expect("client exists");
    assert_eq!(latest.source_timestamp, 2);
    assert_eq!(latest.territory_id, None);

    let fields = store.client_custom_fields(first.id()).expect("fields");
    assert_eq!(fields, vec![("Segment".to_string(), "Retail".to_string())]);
    assert_eq!(
        store.client_pricelists(first.id()).expect("pricelists"),
        vec!["Retail".to_string(), "Wholesale".to_string()]
    );
    assert!(store.client_pricelists(newer.id()).expect("pricelists").is_empty());
    assert_eq!(latest.tag, None);
}

#[test]
fn client_write_rejects_blank_code() {
    let storage_dir = temp_dir("client_write_rejects_blank_code");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store.write_client(&client("  ", 1)).expect_err("blank code");
    assert!(matches!(err, StoreError::InvalidInput(_)));
    assert!(store.client_get_by_code("C1").expect("get").is_none());
}

#[test]
fn forms_are_unique_by_provider_id() {
    let storage_dir = temp_dir("forms_are_unique_by_provider_id");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let name = store.resolve(&NameKey::new("Store Audit")).expect("name");

    let request = FormWrite {
        external_id: 9001,
        name_id: name,
        client_ref_id: None,
        representative_id: None,
        address_id: None,
        contact_id: None,
        territory_id: None,
        latitude_id: None,
        longitude_id: None,
        submitted_at_id: None,
        visit_id: None,
        visit_external_id: Some(44),
        signature_url: None,
        email: None,
        items: vec![
            ("Shelf clean?".to_string(), "Yes".to_string()),
            ("Facings".to_string(), "12".to_string()),
        ],
    };

    let first = store.write_form(&request).expect("first");
    let replay = store.write_form(&request).expect("replay");
    assert!(matches!(first, WriteOutcome::Inserted(_)));
    assert_eq!(replay, WriteOutcome::Unchanged(first.id()));
    assert_eq!(store.count_rows("forms").expect("count"), 1);

    let items = store.form_items(9001).expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].0, "Shelf clean?");
    assert!(store.form_items(1).expect("unknown form").is_empty());
}

#[test]
fn pricelist_upsert_replaces_items() {
    let storage_dir = temp_dir("pricelist_upsert_replaces_items");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");
    let soap = store
        .resolve(&ProductKey::new("P1", "Soap"))
        .expect("soap");
    let brush = store
        .resolve(&ProductKey::new("P2", "Brush"))
        .expect("brush");

    let item = |product_id, price| PricelistItemWrite {
        product_id,
        price,
        active: true,
        client_ref_id: None,
        manufacture_id: None,
        available_from_id: None,
        available_to_id: None,
        min_quantity: None,
        max_quantity: None,
    };

    let mut request = PricelistWrite {
        name: "Retail".to_string(),
        external_id: 3,
        is_default: true,
        active: true,
        use_prices: true,
        items: vec![item(soap, 1.5), item(brush, 4.0)],
    };

    let inserted = store.write_pricelist(&request).expect("insert");
    assert!(matches!(inserted, WriteOutcome::Inserted(_)));
    assert_eq!(
        store.write_pricelist(&request).expect("replay"),
        WriteOutcome::Unchanged(inserted.id())
    );

    request.items = vec![item(soap, 1.75)];
    assert_eq!(
        store.write_pricelist(&request).expect("update"),
        WriteOutcome::Updated(inserted.id())
    );

    let row = store
        .pricelist_get_by_name("Retail")
        .expect("get")
        .expect("pricelist exists");
    assert_eq!(row.id, inserted.id());
    assert_eq!(row.item_count, 1);
    assert_eq!(store.count_rows("pricelists").expect("count"), 1);
    assert_eq!(store.count_rows("pricelist_items").expect("count"), 1);
}
