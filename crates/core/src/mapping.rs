#![forbid(unsafe_code)]

//! Stateless translation of raw provider records into [`MappedRecord`]s.
//!
//! Absent, `null` and blank optional fields become `None`. Anything that is
//! present but has the wrong shape rejects the whole record.

use crate::entity::EntityType;
use crate::ids::Cursor;
use crate::keys::{
    AddressKey, ClientRefKey, ContactInfoKey, DateKey, LatitudeKey, LongitudeKey, NameKey,
    NoteKey, ProductKey, RepresentativeKey, TerritoryKey, TimePointKey,
};
use crate::records::{
    ClientRecord, CustomField, FormItem, FormRecord, MappedRecord, PricelistItemRecord,
    PricelistRecord,
};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing required field {0}")]
    MissingField(&'static str),
    #[error("field {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

pub fn map_record(entity: EntityType, raw: &Value) -> Result<MappedRecord, MapError> {
    let obj = raw.as_object().ok_or(MapError::NotAnObject)?;
    match entity {
        EntityType::Clients => map_client(obj).map(MappedRecord::Client),
        EntityType::Forms => map_form(obj).map(MappedRecord::Form),
        EntityType::Pricelists => map_pricelist(obj).map(MappedRecord::Pricelist),
    }
}

/// Reads only the cursor of a raw record, for reporting records that fail to map.
pub fn raw_cursor(entity: EntityType, raw: &Value) -> Option<Cursor> {
    let obj = raw.as_object()?;
    cursor_field(obj, entity.cursor_field()).ok()
}

fn map_client(obj: &Map<String, Value>) -> Result<ClientRecord, MapError> {
    Ok(ClientRecord {
        cursor: cursor_field(obj, "TimeStamp")?,
        code: text(obj, "Code")?.ok_or(MapError::MissingField("Code"))?,
        active: flag(obj, "Active"),
        name: text(obj, "Name")?.map(NameKey::new),
        address: address(obj)?,
        contact: contact(obj, true)?,
        territory: text(obj, "Territory")?.map(TerritoryKey::new),
        representative: representative(obj)?,
        contact_name: text(obj, "ContactName")?.map(NameKey::new),
        contact_title: text(obj, "ContactTitle")?.map(NameKey::new),
        note: text(obj, "Note")?.map(NoteKey::new),
        email: text(obj, "Email")?,
        account_code: text(obj, "AccountCode")?,
        status: text(obj, "Status")?,
        tag: text(obj, "Tag")?,
        custom_fields: pairs(obj, "CustomFields")?
            .into_iter()
            .map(|(field, value)| CustomField { field, value })
            .collect(),
        pricelists: names(obj, "PriceLists")?,
    })
}

fn map_form(obj: &Map<String, Value>) -> Result<FormRecord, MapError> {
    let client = match text(obj, "ClientCode")? {
        Some(code) => Some(ClientRefKey::new(
            code,
            text(obj, "ClientName")?.unwrap_or_default(),
        )),
        None => None,
    };
    Ok(FormRecord {
        cursor: cursor_field(obj, "FormID")?,
        form_name: NameKey::new(text(obj, "FormName")?.ok_or(MapError::MissingField("FormName"))?),
        client,
        representative: representative(obj)?,
        address: address(obj)?,
        contact: contact(obj, false)?,
        territory: text(obj, "Territory")?.map(TerritoryKey::new),
        latitude: number(obj, "Latitude")?.map(LatitudeKey::new),
        longitude: number(obj, "Longitude")?.map(LongitudeKey::new),
        submitted_at: timestamp(obj, "DateAndTime")?.map(TimePointKey::new),
        visit_start: timestamp(obj, "VisitStart")?.map(TimePointKey::new),
        visit_end: timestamp(obj, "VisitEnd")?.map(TimePointKey::new),
        visit_external_id: integer(obj, "VisitID")?,
        signature_url: text(obj, "SignatureURL")?,
        email: text(obj, "Email")?,
        items: pairs(obj, "Item")?
            .into_iter()
            .map(|(field, value)| FormItem { field, value })
            .collect(),
    })
}

fn map_pricelist(obj: &Map<String, Value>) -> Result<PricelistRecord, MapError> {
    let mut items = Vec::new();
    match obj.get("Items") {
        None | Some(Value::Null) => {}
        Some(Value::Array(raw_items)) => {
            for raw in raw_items {
                let item = raw.as_object().ok_or(MapError::InvalidField {
                    field: "Items",
                    reason: "entries must be objects",
                })?;
                items.push(map_pricelist_item(item)?);
            }
        }
        Some(_) => {
            return Err(MapError::InvalidField {
                field: "Items",
                reason: "expected an array",
            });
        }
    }

    Ok(PricelistRecord {
        cursor: cursor_field(obj, "ID")?,
        name: text(obj, "Name")?.ok_or(MapError::MissingField("Name"))?,
        is_default: flag(obj, "IsDefault"),
        active: flag(obj, "Active"),
        use_prices: flag(obj, "UsePrices"),
        items,
    })
}

fn map_pricelist_item(obj: &Map<String, Value>) -> Result<PricelistItemRecord, MapError> {
    let code = text(obj, "ProductCode")?.ok_or(MapError::MissingField("Items.ProductCode"))?;
    let client = match text(obj, "ClientCode")? {
        Some(code) => Some(ClientRefKey::new(
            code,
            text(obj, "ClientName")?.unwrap_or_default(),
        )),
        None => None,
    };
    Ok(PricelistItemRecord {
        product: ProductKey::new(code, text(obj, "ProductName")?.unwrap_or_default()),
        price: number(obj, "Price")?.ok_or(MapError::MissingField("Items.Price"))?,
        active: flag(obj, "Active"),
        client,
        manufacture_id: text(obj, "ManufactureID")?,
        available_from: date(obj, "DateAvailableFrom")?.map(DateKey::new),
        available_to: date(obj, "DateAvailableTo")?.map(DateKey::new),
        min_quantity: integer(obj, "MinQuantity")?,
        max_quantity: integer(obj, "MaxQuantity")?,
    })
}

fn address(obj: &Map<String, Value>) -> Result<Option<AddressKey>, MapError> {
    let Some(street) = text(obj, "StreetAddress")? else {
        return Ok(None);
    };
    Ok(Some(AddressKey {
        street,
        zip: text(obj, "ZIP")?.unwrap_or_default(),
        zip_ext: text(obj, "ZIPExt")?.unwrap_or_default(),
        city: text(obj, "City")?.unwrap_or_default(),
        state: text(obj, "State")?.unwrap_or_default(),
        country: text(obj, "Country")?.unwrap_or_default(),
    }))
}

fn contact(obj: &Map<String, Value>, with_website: bool) -> Result<Option<ContactInfoKey>, MapError> {
    let phone = text(obj, "Phone")?;
    let mobile = text(obj, "Mobile")?;
    let website = if with_website {
        text(obj, "Website")?
    } else {
        None
    };
    if phone.is_none() && mobile.is_none() && website.is_none() {
        return Ok(None);
    }
    Ok(Some(ContactInfoKey {
        phone: phone.unwrap_or_default(),
        mobile: mobile.unwrap_or_default(),
        website: website.unwrap_or_default(),
    }))
}

fn representative(obj: &Map<String, Value>) -> Result<Option<RepresentativeKey>, MapError> {
    let Some(code) = text(obj, "RepresentativeCode")? else {
        return Ok(None);
    };
    Ok(Some(RepresentativeKey::new(
        code,
        text(obj, "RepresentativeName")?.unwrap_or_default(),
    )))
}

fn cursor_field(obj: &Map<String, Value>, field: &'static str) -> Result<Cursor, MapError> {
    let value = integer(obj, field)?.ok_or(MapError::MissingField(field))?;
    if value < 0 {
        return Err(MapError::InvalidField {
            field,
            reason: "cursor must be >= 0",
        });
    }
    Ok(Cursor::new(value))
}

fn text(obj: &Map<String, Value>, field: &'static str) -> Result<Option<String>, MapError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let raw = scalar_text(value).ok_or(MapError::InvalidField {
                field,
                reason: "expected a string",
            })?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn flag(obj: &Map<String, Value>, field: &str) -> bool {
    matches!(obj.get(field), Some(Value::Bool(true)))
}

fn integer(obj: &Map<String, Value>, field: &'static str) -> Result<Option<i64>, MapError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole_f64))
            .map(Some)
            .ok_or(MapError::InvalidField {
                field,
                reason: "expected an integer",
            }),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<i64>().map(Some).map_err(|_| {
            MapError::InvalidField {
                field,
                reason: "expected an integer",
            }
        }),
        Some(_) => Err(MapError::InvalidField {
            field,
            reason: "expected an integer",
        }),
    }
}

/// `2.0` is accepted as `2`; fractional or out-of-range values are not.
fn whole_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Some(value as i64)
    } else {
        None
    }
}

fn number(obj: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, MapError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or(MapError::InvalidField {
            field,
            reason: "expected a number",
        }),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            MapError::InvalidField {
                field,
                reason: "expected a number",
            }
        }),
        Some(_) => Err(MapError::InvalidField {
            field,
            reason: "expected a number",
        }),
    }
}

/// `[{"Field": .., "Value": ..}, ..]` in source order; values may be any scalar.
fn pairs(obj: &Map<String, Value>, field: &'static str) -> Result<Vec<(String, String)>, MapError> {
    let entries = match obj.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(MapError::InvalidField {
                field,
                reason: "expected an array",
            });
        }
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry.as_object().ok_or(MapError::InvalidField {
            field,
            reason: "entries must be objects",
        })?;
        let name = text(entry, "Field")?.ok_or(MapError::InvalidField {
            field,
            reason: "entry is missing Field",
        })?;
        let value = match entry.get("Value") {
            None | Some(Value::Null) => String::new(),
            Some(value) => scalar_text(value).ok_or(MapError::InvalidField {
                field,
                reason: "entry Value must be a scalar",
            })?,
        };
        out.push((name, value));
    }
    Ok(out)
}

/// Reads `[{"Name": ...}, ...]`; entries with a blank name are dropped.
fn names(obj: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, MapError> {
    let entries = match obj.get(field) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(MapError::InvalidField {
                field,
                reason: "expected an array",
            });
        }
    };

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let entry = entry.as_object().ok_or(MapError::InvalidField {
            field,
            reason: "entries must be objects",
        })?;
        if let Some(name) = text(entry, "Name")? {
            out.push(name);
        }
    }
    Ok(out)
}

fn timestamp(obj: &Map<String, Value>, field: &'static str) -> Result<Option<OffsetDateTime>, MapError> {
    let invalid = MapError::InvalidField {
        field,
        reason: "expected epoch milliseconds, /Date(ms)/ or RFC 3339",
    };
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            let ms = n.as_i64().ok_or(invalid.clone())?;
            from_unix_ms(ms).map(Some).ok_or(invalid)
        }
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            parse_timestamp(s).map(Some).ok_or(invalid)
        }
        Some(_) => Err(invalid),
    }
}

fn date(obj: &Map<String, Value>, field: &'static str) -> Result<Option<Date>, MapError> {
    let Some(raw) = text(obj, field)? else {
        return Ok(None);
    };
    if let Some(at) = parse_wrapped_ms(&raw) {
        return Ok(Some(at.date()));
    }
    let head = raw.get(..10).unwrap_or(raw.as_str());
    Date::parse(head, format_description!("[year]-[month]-[day]"))
        .map(Some)
        .map_err(|_| MapError::InvalidField {
            field,
            reason: "expected YYYY-MM-DD",
        })
}

fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    if let Some(at) = parse_wrapped_ms(value) {
        return Some(at);
    }
    if let Ok(ms) = value.parse::<i64>() {
        return from_unix_ms(ms);
    }
    OffsetDateTime::parse(value, &Rfc3339).ok()
}

/// Provider form `/Date(1467880000000+0000)/`. The number is already UTC epoch millis.
fn parse_wrapped_ms(value: &str) -> Option<OffsetDateTime> {
    let inner = value.strip_prefix("/Date(")?.strip_suffix(")/")?;
    let digits_end = inner
        .char_indices()
        .find(|(index, ch)| !(ch.is_ascii_digit() || (*index == 0 && *ch == '-')))
        .map(|(index, _)| index)
        .unwrap_or(inner.len());
    let ms = inner[..digits_end].parse::<i64>().ok()?;
    from_unix_ms(ms)
}

fn from_unix_ms(ms: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
}
