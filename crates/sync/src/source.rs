#![forbid(unsafe_code)]

use rp_core::entity::EntityType;
use rp_core::ids::Cursor;
use serde_json::Value;

/// One batch of raw provider records, in ascending cursor order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("{entity} page returned HTTP {status}")]
    Status { entity: EntityType, status: u16 },
    #[error("decode: {0}")]
    Decode(String),
    #[error("invalid source configuration: {0}")]
    Config(String),
}

/// Where pages of raw records come from.
pub trait DataSource {
    /// Records of `entity` whose cursor is strictly greater than `after`.
    fn fetch_page(&self, entity: EntityType, after: Cursor) -> Result<Page, SourceError>;
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn fetch_page(&self, entity: EntityType, after: Cursor) -> Result<Page, SourceError> {
        (**self).fetch_page(entity, after)
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn fetch_page(&self, entity: EntityType, after: Cursor) -> Result<Page, SourceError> {
        (**self).fetch_page(entity, after)
    }
}

/// Decodes a page envelope: a JSON object whose entity-specific field
/// (`Clients`, `Forms`, `Pricelists`) is the array of records.
pub fn decode_page(entity: EntityType, body: &[u8]) -> Result<Page, SourceError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| SourceError::Decode(err.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(SourceError::Decode(
            "page envelope is not a JSON object".to_string(),
        ));
    };

    let field = entity.envelope_field();
    match envelope.remove(field) {
        Some(Value::Array(records)) => Ok(Page { records }),
        Some(_) => Err(SourceError::Decode(format!("{field} is not an array"))),
        None => Err(SourceError::Decode(format!("envelope has no {field} field"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_records_from_the_entity_field() {
        let body = br#"{
            "MetaCollectionResult": {"TotalCount": 2, "LastTimeStamp": 9},
            "Clients": [{"TimeStamp": 8, "Code": "A"}, {"TimeStamp": 9, "Code": "B"}]
        }"#;
        let page = decode_page(EntityType::Clients, body).expect("decode");
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[1]["Code"], "B");
    }

    #[test]
    fn empty_array_is_an_empty_page() {
        let page = decode_page(EntityType::Forms, br#"{"Forms": []}"#).expect("decode");
        assert!(page.is_empty());
    }

    #[test]
    fn rejects_malformed_envelopes() {
        let bodies: [&[u8]; 4] = [
            b"not json",
            br#"[1, 2, 3]"#,
            br#"{"Clients": []}"#,
            br#"{"Pricelists": {"ID": 1}}"#,
        ];
        for body in bodies {
            let err = decode_page(EntityType::Pricelists, body).expect_err("malformed");
            assert!(matches!(err, SourceError::Decode(_)), "{err}");
        }
    }
}
