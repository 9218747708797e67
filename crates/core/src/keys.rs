#![forbid(unsafe_code)]

//! Natural keys of the append-only reference entities.
//!
//! A key is the business-meaningful tuple that identifies one reference row.
//! `canonical()` trims text, fills absent optional parts with `""` and rejects
//! keys whose required parts are empty, so that the insert path and the lookup
//! path always bind exactly the same values.

use crate::ids::SurrogateId;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const MICRO_DEGREES_PER_DEGREE: f64 = 1_000_000.0;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum KeyError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("{0} is out of range")]
    OutOfRange(&'static str),
    #[error("{0} could not be formatted")]
    Format(&'static str),
}

fn required(value: &str, field: &'static str) -> Result<String, KeyError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(KeyError::Empty(field));
    }
    Ok(value.to_string())
}

fn optional(value: &str) -> String {
    value.trim().to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AddressKey {
    pub street: String,
    pub zip: String,
    pub zip_ext: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

impl AddressKey {
    pub fn canonical(&self) -> Result<Self, KeyError> {
        Ok(Self {
            street: required(&self.street, "address.street")?,
            zip: optional(&self.zip),
            zip_ext: optional(&self.zip_ext),
            city: optional(&self.city),
            state: optional(&self.state),
            country: optional(&self.country),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ContactInfoKey {
    pub phone: String,
    pub mobile: String,
    pub website: String,
}

impl ContactInfoKey {
    pub fn canonical(&self) -> Result<Self, KeyError> {
        let out = Self {
            phone: optional(&self.phone),
            mobile: optional(&self.mobile),
            website: optional(&self.website),
        };
        if out.phone.is_empty() && out.mobile.is_empty() && out.website.is_empty() {
            return Err(KeyError::Empty("contact_info"));
        }
        Ok(out)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerritoryKey {
    pub name: String,
}

impl TerritoryKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn canonical(&self) -> Result<Self, KeyError> {
        Ok(Self {
            name: required(&self.name, "territory.name")?,
        })
    }
}

/// Unique on `code` alone; `name` is stored with the first insert and never rewritten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepresentativeKey {
    pub code: String,
    pub name: String,
}

impl RepresentativeKey {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn canonical(&self) -> Result<Self, KeyError> {
        Ok(Self {
            code: required(&self.code, "representative.code")?,
            name: optional(&self.name),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameKey {
    pub full_name: String,
}

impl NameKey {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
        }
    }

    pub fn canonical(&self) -> Result<Self, KeyError> {
        Ok(Self {
            full_name: required(&self.full_name, "name.full_name")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteKey {
    pub text: String,
}

impl NoteKey {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn canonical(&self) -> Result<Self, KeyError> {
        Ok(Self {
            text: required(&self.text, "note.text")?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateKey {
    pub date: Date,
}

impl DateKey {
    pub fn new(date: Date) -> Self {
        Self { date }
    }

    /// `YYYY-MM-DD`, the only representation ever bound for dates.
    pub fn iso(&self) -> Result<String, KeyError> {
        self.date
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| KeyError::Format("date"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimePointKey {
    pub at: OffsetDateTime,
}

impl TimePointKey {
    pub fn new(at: OffsetDateTime) -> Self {
        Self { at }
    }

    pub fn unix_ms(&self) -> Result<i64, KeyError> {
        i64::try_from(self.at.unix_timestamp_nanos() / 1_000_000)
            .map_err(|_| KeyError::OutOfRange("time_point"))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatitudeKey {
    pub degrees: f64,
}

impl LatitudeKey {
    pub fn new(degrees: f64) -> Self {
        Self { degrees }
    }

    pub fn micro_degrees(&self) -> Result<i64, KeyError> {
        micro_degrees(self.degrees, 90.0, "latitude")
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LongitudeKey {
    pub degrees: f64,
}

impl LongitudeKey {
    pub fn new(degrees: f64) -> Self {
        Self { degrees }
    }

    pub fn micro_degrees(&self) -> Result<i64, KeyError> {
        micro_degrees(self.degrees, 180.0, "longitude")
    }
}

/// Fixed-point coordinate: `round(deg * 1e6)`. Both resolver paths bind this integer.
pub fn micro_degrees(degrees: f64, limit: f64, field: &'static str) -> Result<i64, KeyError> {
    if !degrees.is_finite() || degrees.abs() > limit {
        return Err(KeyError::OutOfRange(field));
    }
    Ok((degrees * MICRO_DEGREES_PER_DEGREE).round() as i64)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductKey {
    pub code: String,
    pub name: String,
}

impl ProductKey {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn canonical(&self) -> Result<Self, KeyError> {
        Ok(Self {
            code: required(&self.code, "product.code")?,
            name: optional(&self.name),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientRefKey {
    pub code: String,
    pub name: String,
}

impl ClientRefKey {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn canonical(&self) -> Result<Self, KeyError> {
        Ok(Self {
            code: required(&self.code, "client_ref.code")?,
            name: optional(&self.name),
        })
    }
}

/// A visit is identified by when it started, who made it and where.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisitKey {
    pub start_time: SurrogateId,
    pub end_time: Option<SurrogateId>,
    pub representative: SurrogateId,
    pub client: SurrogateId,
}
