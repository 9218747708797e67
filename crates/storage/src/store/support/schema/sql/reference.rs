#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        -- Append-only reference data.
        --
        -- Every table carries a UNIQUE constraint over its natural key so that
        -- `INSERT .. ON CONFLICT DO NOTHING` can never produce a second row.
        -- Optional natural-key parts are stored as '' (never NULL): NULLs are
        -- distinct under UNIQUE and would let duplicates through.
        CREATE TABLE IF NOT EXISTS addresses (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          street TEXT NOT NULL,
          zip TEXT NOT NULL,
          zip_ext TEXT NOT NULL,
          city TEXT NOT NULL,
          state TEXT NOT NULL,
          country TEXT NOT NULL,
          UNIQUE (street, zip, zip_ext, city, state, country)
        );

        CREATE TABLE IF NOT EXISTS contact_info (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          phone TEXT NOT NULL,
          mobile TEXT NOT NULL,
          website TEXT NOT NULL,
          UNIQUE (phone, mobile, website)
        );

        CREATE TABLE IF NOT EXISTS territories (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL UNIQUE
        );

        -- Keyed on code alone; the first stored name wins.
        CREATE TABLE IF NOT EXISTS representatives (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          code TEXT NOT NULL UNIQUE,
          name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS names (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          full_name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS notes (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          text TEXT NOT NULL UNIQUE
        );

        -- ISO `YYYY-MM-DD`.
        CREATE TABLE IF NOT EXISTS dates (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          date TEXT NOT NULL UNIQUE
        );

        -- Unix milliseconds, UTC.
        CREATE TABLE IF NOT EXISTS time_points (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          unix_ms INTEGER NOT NULL UNIQUE
        );

        -- Fixed-point coordinates: round(degrees * 1e6).
        CREATE TABLE IF NOT EXISTS latitudes (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          micro_degrees INTEGER NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS longitudes (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          micro_degrees INTEGER NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS products (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          code TEXT NOT NULL,
          name TEXT NOT NULL,
          UNIQUE (code, name)
        );

        CREATE TABLE IF NOT EXISTS client_refs (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          code TEXT NOT NULL,
          name TEXT NOT NULL,
          UNIQUE (code, name)
        );

        CREATE TABLE IF NOT EXISTS visits (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          start_time_id INTEGER NOT NULL REFERENCES time_points(id),
          end_time_id INTEGER REFERENCES time_points(id),
          representative_id INTEGER NOT NULL REFERENCES representatives(id),
          client_ref_id INTEGER NOT NULL REFERENCES client_refs(id),
          UNIQUE (start_time_id, representative_id, client_ref_id)
        );
"#;
