#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_clients_territory ON clients(territory_id);
        CREATE INDEX IF NOT EXISTS idx_client_pricelists_name ON client_pricelists(pricelist_name);
        CREATE INDEX IF NOT EXISTS idx_forms_client_ref ON forms(client_ref_id);
        CREATE INDEX IF NOT EXISTS idx_pricelist_items_product ON pricelist_items(product_id);
"#;
