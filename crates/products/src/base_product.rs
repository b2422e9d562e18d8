use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{BaseProductId, Entity};

/// Canonical catalog entry that variants point at.
///
/// A base product does not list its variants; ownership lives on
/// [`crate::Variant::base_product_id`] only, so deleting a base product never
/// cascades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseProduct {
    pub id: BaseProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BaseProduct {
    pub fn new(id: BaseProductId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            brand: None,
            category: None,
            image: None,
            created_at,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl Entity for BaseProduct {
    type Id = BaseProductId;

    const KIND: &'static str = "base product";

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
