use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{BaseProductId, Entity, VariantId};

use crate::ean::Ean;
use crate::size::{lenient_unit, parse_size, Unit};

/// A purchasable SKU of a base product, identified by its barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    /// Soft foreign key; the store does not guarantee it resolves.
    pub base_product_id: BaseProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<Ean>,
    pub full_name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_volume: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_unit",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit: Option<Unit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Variant {
    pub fn new(
        id: VariantId,
        base_product_id: BaseProductId,
        full_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            base_product_id,
            ean: None,
            full_name: full_name.into(),
            kind: None,
            size: None,
            parsed_volume: None,
            unit: None,
            flavor: None,
            image: None,
            created_at,
        }
    }

    pub fn with_ean(mut self, ean: impl Into<Ean>) -> Self {
        self.ean = Some(ean.into());
        self
    }

    pub fn with_flavor(mut self, flavor: impl Into<String>) -> Self {
        self.flavor = Some(flavor.into());
        self
    }

    /// Set the size text and re-derive `parsed_volume` / `unit` from it.
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        let size = size.into();
        let parsed = parse_size(&size);
        self.parsed_volume = parsed.map(|v| v.amount);
        self.unit = parsed.map(|v| v.unit);
        self.size = Some(size);
        self
    }

    /// The barcode used as duplicate-grouping key, if present and non-blank.
    pub fn business_key(&self) -> Option<&Ean> {
        self.ean.as_ref().filter(|e| !e.is_blank())
    }

    pub fn belongs_to(&self, base_product_id: &BaseProductId) -> bool {
        &self.base_product_id == base_product_id
    }
}

impl Entity for Variant {
    type Id = VariantId;

    const KIND: &'static str = "variant";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant() -> Variant {
        Variant::new(
            VariantId::parse("v1").unwrap(),
            BaseProductId::parse("b1").unwrap(),
            "Leche X Entera 1L",
            Utc::now(),
        )
    }

    #[test]
    fn size_derives_volume_and_unit() {
        let v = variant().with_size("1 L");
        assert_eq!(v.parsed_volume, Some(1.0));
        assert_eq!(v.unit, Some(Unit::Liter));

        let v = v.with_size("familiar");
        assert_eq!(v.parsed_volume, None);
        assert_eq!(v.unit, None);
        assert_eq!(v.size.as_deref(), Some("familiar"));
    }

    #[test]
    fn blank_ean_is_not_a_business_key() {
        assert!(variant().business_key().is_none());
        assert!(variant().with_ean("   ").business_key().is_none());
        assert_eq!(
            variant().with_ean("7501234567890").business_key(),
            Some(&Ean::new("7501234567890"))
        );
    }

    #[test]
    fn decodes_store_documents() {
        let doc = serde_json::json!({
            "id": "v9",
            "baseProductId": "b2",
            "ean": "7501234567890",
            "fullName": "Leche X Deslactosada",
            "type": "deslactosada",
            "size": "1.5 lt",
            "parsedVolume": 1.5,
            "unit": "l",
            "createdAt": "2024-03-01T10:00:00Z",
        });

        let v: Variant = serde_json::from_value(doc).unwrap();
        assert_eq!(v.base_product_id.as_str(), "b2");
        assert_eq!(v.kind.as_deref(), Some("deslactosada"));
        assert_eq!(v.unit, Some(Unit::Liter));
        assert!(v.belongs_to(&BaseProductId::parse("b2").unwrap()));
    }

    #[test]
    fn serializes_kind_as_type() {
        let mut v = variant();
        v.kind = Some("entera".into());
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "entera");
        assert_eq!(json["baseProductId"], "b1");
    }
}
