//! Generic document store boundary.
//!
//! The catalog lives in two collections (base products and variants) linked by
//! a soft foreign key. The store offers single-document writes only: no
//! multi-document transactions and no referential constraints. Every document
//! carries a version that is bumped on each write, which callers use for
//! optimistic concurrency via [`stockroom_core::ExpectedVersion`].

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryCollectionGateway;
pub use postgres::PostgresCollectionGateway;
pub use r#trait::{CollectionGateway, GatewayError};

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// Field name that addresses the document identity in queries.
pub const ID_FIELD: &str = "id";

/// The two document sets the catalog is stored in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    BaseProducts,
    Variants,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::BaseProducts => "base_products",
            Collection::Variants => "variants",
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document: identity, version, and a JSON object body.
///
/// The body never contains the `id` field; it is injected on decode.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub body: JsonValue,
}

impl Document {
    /// Field lookup that also answers for the identity field.
    pub fn field(&self, field: &str) -> JsonValue {
        if field == ID_FIELD {
            return JsonValue::String(self.id.clone());
        }
        self.body.get(field).cloned().unwrap_or(JsonValue::Null)
    }

    /// Decode the document into a typed model (body + injected `id`).
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        let mut body = self.body.clone();
        match body.as_object_mut() {
            Some(map) => {
                map.insert(ID_FIELD.to_string(), JsonValue::String(self.id.clone()));
            }
            None => {
                return Err(GatewayError::Decode(format!(
                    "document {} is not a JSON object",
                    self.id
                )));
            }
        }

        serde_json::from_value(body)
            .map_err(|e| GatewayError::Decode(format!("document {}: {e}", self.id)))
    }
}

/// One bucket of a `count_grouped_by` aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupCount {
    /// The grouped field value (`Null` when the field is missing).
    pub value: JsonValue,
    pub count: u64,
}

/// Split a serializable model into `(id, body)` for storage.
pub(crate) fn split_id(value: JsonValue) -> Result<(String, JsonValue), GatewayError> {
    let JsonValue::Object(mut map) = value else {
        return Err(GatewayError::InvalidRequest(
            "document must serialize to a JSON object".to_string(),
        ));
    };

    match map.remove(ID_FIELD) {
        Some(JsonValue::String(id)) if !id.is_empty() => Ok((id, JsonValue::Object(map))),
        _ => Err(GatewayError::InvalidRequest(
            "document must carry a non-empty string id".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decode_injects_the_identity() {
        #[derive(serde::Deserialize)]
        struct Named {
            id: String,
            name: String,
        }

        let doc = Document {
            id: "b1".into(),
            version: 1,
            body: json!({"name": "Leche X"}),
        };
        let named: Named = doc.decode().unwrap();
        assert_eq!(named.id, "b1");
        assert_eq!(named.name, "Leche X");
        assert_eq!(doc.field(ID_FIELD), json!("b1"));
        assert_eq!(doc.field("missing"), JsonValue::Null);
    }

    #[test]
    fn split_id_requires_an_object_with_id() {
        let (id, body) = split_id(json!({"id": "v1", "ean": "1"})).unwrap();
        assert_eq!(id, "v1");
        assert_eq!(body, json!({"ean": "1"}));

        assert!(split_id(json!(["v1"])).is_err());
        assert!(split_id(json!({"ean": "1"})).is_err());
    }
}
