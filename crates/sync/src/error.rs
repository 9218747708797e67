#![forbid(unsafe_code)]

use crate::source::SourceError;
use rp_core::entity::EntityType;
use rp_core::mapping::MapError;
use rp_storage::StoreError;

/// Failure of a whole page. The checkpoint is left where it was, so the same
/// page is fetched again on the next round.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("{entity}: fetch failed: {source}")]
    Transport {
        entity: EntityType,
        source: SourceError,
    },
    #[error("{entity}: page could not be decoded: {source}")]
    Decode {
        entity: EntityType,
        source: SourceError,
    },
    #[error("{entity}: checkpoint unavailable: {source}")]
    Checkpoint {
        entity: EntityType,
        source: StoreError,
    },
}

impl PageError {
    pub(crate) fn from_source(entity: EntityType, source: SourceError) -> Self {
        match source {
            SourceError::Decode(_) => Self::Decode { entity, source },
            _ => Self::Transport { entity, source },
        }
    }

    pub fn entity(&self) -> EntityType {
        match self {
            Self::Transport { entity, .. }
            | Self::Decode { entity, .. }
            | Self::Checkpoint { entity, .. } => *entity,
        }
    }
}

/// Failure of a single record. The record is skipped and the page goes on.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed record: {0}")]
    Malformed(#[from] MapError),
    #[error("could not resolve {table}: {source}")]
    Resolution {
        table: &'static str,
        source: StoreError,
    },
    #[error("write failed: {0}")]
    Write(StoreError),
}

#[derive(Debug)]
pub struct RecordFailure {
    /// Position of the record within its page.
    pub index: usize,
    /// Business identifier, or the cursor when the record did not map.
    pub key: String,
    pub error: RecordError,
}
