#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        -- Highest cursor successfully processed per entity type.
        -- Only ever moves forward (see checkpoints.rs).
        CREATE TABLE IF NOT EXISTS sync_checkpoints (
          entity_type TEXT PRIMARY KEY,
          cursor INTEGER NOT NULL CHECK(cursor >= 0),
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );
"#;
