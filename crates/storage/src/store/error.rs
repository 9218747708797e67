#![forbid(unsafe_code)]

use rp_core::keys::KeyError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("invalid natural key: {0}")]
    InvalidKey(#[from] KeyError),
    #[error("schema version mismatch (expected={expected}, stored={stored})")]
    SchemaMismatch {
        expected: &'static str,
        stored: String,
    },
    #[error("store returned a non-positive id ({0})")]
    InvalidId(i64),
}

impl StoreError {
    /// Whether the failure is about the input rather than the store itself.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::InvalidKey(_))
    }
}
