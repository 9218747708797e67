#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        -- One row per observed client version: (code, source_timestamp).
        CREATE TABLE IF NOT EXISTS clients (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          code TEXT NOT NULL,
          source_timestamp INTEGER NOT NULL,
          active INTEGER NOT NULL,
          name_id INTEGER REFERENCES names(id),
          address_id INTEGER REFERENCES addresses(id),
          contact_id INTEGER REFERENCES contact_info(id),
          territory_id INTEGER REFERENCES territories(id),
          representative_id INTEGER REFERENCES representatives(id),
          contact_name_id INTEGER REFERENCES names(id),
          contact_title_id INTEGER REFERENCES names(id),
          note_id INTEGER REFERENCES notes(id),
          email TEXT,
          account_code TEXT,
          status TEXT,
          tag TEXT,
          created_at_ms INTEGER NOT NULL,
          UNIQUE (code, source_timestamp)
        );

        CREATE TABLE IF NOT EXISTS client_custom_fields (
          client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
          ordinal INTEGER NOT NULL,
          field TEXT NOT NULL,
          value TEXT NOT NULL,
          PRIMARY KEY (client_id, ordinal)
        );

        -- By name, not id: pricelists are synced independently of clients.
        CREATE TABLE IF NOT EXISTS client_pricelists (
          client_id INTEGER NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
          ordinal INTEGER NOT NULL,
          pricelist_name TEXT NOT NULL,
          PRIMARY KEY (client_id, ordinal)
        );

        CREATE TABLE IF NOT EXISTS forms (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          external_id INTEGER NOT NULL UNIQUE,
          name_id INTEGER NOT NULL REFERENCES names(id),
          client_ref_id INTEGER REFERENCES client_refs(id),
          representative_id INTEGER REFERENCES representatives(id),
          address_id INTEGER REFERENCES addresses(id),
          contact_id INTEGER REFERENCES contact_info(id),
          territory_id INTEGER REFERENCES territories(id),
          latitude_id INTEGER REFERENCES latitudes(id),
          longitude_id INTEGER REFERENCES longitudes(id),
          submitted_at_id INTEGER REFERENCES time_points(id),
          visit_id INTEGER REFERENCES visits(id),
          visit_external_id INTEGER,
          signature_url TEXT,
          email TEXT,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS form_items (
          form_id INTEGER NOT NULL REFERENCES forms(id) ON DELETE CASCADE,
          ordinal INTEGER NOT NULL,
          field TEXT NOT NULL,
          value TEXT NOT NULL,
          PRIMARY KEY (form_id, ordinal)
        );

        -- Upserted by name.
        CREATE TABLE IF NOT EXISTS pricelists (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL UNIQUE,
          external_id INTEGER NOT NULL,
          is_default INTEGER NOT NULL,
          active INTEGER NOT NULL,
          use_prices INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        -- Replaced as a set whenever the owning pricelist is written.
        CREATE TABLE IF NOT EXISTS pricelist_items (
          pricelist_id INTEGER NOT NULL REFERENCES pricelists(id) ON DELETE CASCADE,
          ordinal INTEGER NOT NULL,
          product_id INTEGER NOT NULL REFERENCES products(id),
          price REAL NOT NULL,
          active INTEGER NOT NULL,
          client_ref_id INTEGER REFERENCES client_refs(id),
          manufacture_id TEXT,
          available_from_id INTEGER REFERENCES dates(id),
          available_to_id INTEGER REFERENCES dates(id),
          min_quantity INTEGER,
          max_quantity INTEGER,
          PRIMARY KEY (pricelist_id, ordinal)
        );
"#;
