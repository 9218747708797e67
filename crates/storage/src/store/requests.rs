#![forbid(unsafe_code)]

use rp_core::entity::EntityType;
use rp_core::ids::{Cursor, SurrogateId};

/// What a primary-entity write did. Writes are idempotent, so replaying a
/// record the store already holds yields `Unchanged`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted(SurrogateId),
    Updated(SurrogateId),
    Unchanged(SurrogateId),
}

impl WriteOutcome {
    pub fn id(self) -> SurrogateId {
        match self {
            Self::Inserted(id) | Self::Updated(id) | Self::Unchanged(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckpointRow {
    pub entity: EntityType,
    pub cursor: Cursor,
    pub updated_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientWrite {
    pub code: String,
    pub source_timestamp: i64,
    pub active: bool,
    pub name_id: Option<SurrogateId>,
    pub address_id: Option<SurrogateId>,
    pub contact_id: Option<SurrogateId>,
    pub territory_id: Option<SurrogateId>,
    pub representative_id: Option<SurrogateId>,
    pub contact_name_id: Option<SurrogateId>,
    pub contact_title_id: Option<SurrogateId>,
    pub note_id: Option<SurrogateId>,
    pub email: Option<String>,
    pub account_code: Option<String>,
    pub status: Option<String>,
    pub tag: Option<String>,
    pub custom_fields: Vec<(String, String)>,
    /// Assigned pricelists by name. Names are stored as given, so a client may
    /// reference a pricelist that has not been synced yet.
    pub pricelists: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientRow {
    pub id: SurrogateId,
    pub code: String,
    pub source_timestamp: i64,
    pub active: bool,
    pub tag: Option<String>,
    pub territory_id: Option<SurrogateId>,
    pub representative_id: Option<SurrogateId>,
    pub address_id: Option<SurrogateId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormWrite {
    pub external_id: i64,
    pub name_id: SurrogateId,
    pub client_ref_id: Option<SurrogateId>,
    pub representative_id: Option<SurrogateId>,
    pub address_id: Option<SurrogateId>,
    pub contact_id: Option<SurrogateId>,
    pub territory_id: Option<SurrogateId>,
    pub latitude_id: Option<SurrogateId>,
    pub longitude_id: Option<SurrogateId>,
    pub submitted_at_id: Option<SurrogateId>,
    pub visit_id: Option<SurrogateId>,
    pub visit_external_id: Option<i64>,
    pub signature_url: Option<String>,
    pub email: Option<String>,
    pub items: Vec<(String, String)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricelistItemWrite {
    pub product_id: SurrogateId,
    pub price: f64,
    pub active: bool,
    pub client_ref_id: Option<SurrogateId>,
    pub manufacture_id: Option<String>,
    pub available_from_id: Option<SurrogateId>,
    pub available_to_id: Option<SurrogateId>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricelistWrite {
    pub name: String,
    pub external_id: i64,
    pub is_default: bool,
    pub active: bool,
    pub use_prices: bool,
    pub items: Vec<PricelistItemWrite>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PricelistRow {
    pub id: SurrogateId,
    pub name: String,
    pub external_id: i64,
    pub is_default: bool,
    pub active: bool,
    pub use_prices: bool,
    pub item_count: u64,
}
