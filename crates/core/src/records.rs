#![forbid(unsafe_code)]

use crate::entity::EntityType;
use crate::ids::Cursor;
use crate::keys::{
    AddressKey, ClientRefKey, ContactInfoKey, DateKey, LatitudeKey, LongitudeKey, NameKey,
    NoteKey, ProductKey, RepresentativeKey, TerritoryKey, TimePointKey,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomField {
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClientRecord {
    pub cursor: Cursor,
    pub code: String,
    pub active: bool,
    pub name: Option<NameKey>,
    pub address: Option<AddressKey>,
    pub contact: Option<ContactInfoKey>,
    pub territory: Option<TerritoryKey>,
    pub representative: Option<RepresentativeKey>,
    pub contact_name: Option<NameKey>,
    pub contact_title: Option<NameKey>,
    pub note: Option<NoteKey>,
    pub email: Option<String>,
    pub account_code: Option<String>,
    pub status: Option<String>,
    pub tag: Option<String>,
    pub custom_fields: Vec<CustomField>,
    /// Names of the pricelists assigned to the client, in provider order.
    pub pricelists: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormItem {
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormRecord {
    pub cursor: Cursor,
    pub form_name: NameKey,
    pub client: Option<ClientRefKey>,
    pub representative: Option<RepresentativeKey>,
    pub address: Option<AddressKey>,
    pub contact: Option<ContactInfoKey>,
    pub territory: Option<TerritoryKey>,
    pub latitude: Option<LatitudeKey>,
    pub longitude: Option<LongitudeKey>,
    pub submitted_at: Option<TimePointKey>,
    pub visit_start: Option<TimePointKey>,
    pub visit_end: Option<TimePointKey>,
    pub visit_external_id: Option<i64>,
    pub signature_url: Option<String>,
    pub email: Option<String>,
    pub items: Vec<FormItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricelistItemRecord {
    pub product: ProductKey,
    pub price: f64,
    pub active: bool,
    pub client: Option<ClientRefKey>,
    pub manufacture_id: Option<String>,
    pub available_from: Option<DateKey>,
    pub available_to: Option<DateKey>,
    pub min_quantity: Option<i64>,
    pub max_quantity: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PricelistRecord {
    pub cursor: Cursor,
    pub name: String,
    pub is_default: bool,
    pub active: bool,
    pub use_prices: bool,
    pub items: Vec<PricelistItemRecord>,
}

/// A raw provider record after field mapping, before any reference is resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum MappedRecord {
    Client(ClientRecord),
    Form(FormRecord),
    Pricelist(PricelistRecord),
}

impl MappedRecord {
    pub fn entity(&self) -> EntityType {
        match self {
            Self::Client(_) => EntityType::Clients,
            Self::Form(_) => EntityType::Forms,
            Self::Pricelist(_) => EntityType::Pricelists,
        }
    }

    pub fn cursor(&self) -> Cursor {
        match self {
            Self::Client(record) => record.cursor,
            Self::Form(record) => record.cursor,
            Self::Pricelist(record) => record.cursor,
        }
    }

    /// Business identifier used when reporting a failed record.
    pub fn display_key(&self) -> String {
        match self {
            Self::Client(record) => format!("client {}@{}", record.code, record.cursor),
            Self::Form(record) => format!("form {}", record.cursor),
            Self::Pricelist(record) => format!("pricelist {}", record.name),
        }
    }
}
