//! Orphan variant check: variants whose soft foreign key points at a base
//! product that does not exist.

use std::collections::HashSet;

use serde::Serialize;

use stockroom_core::{BaseProductId, VariantId};
use stockroom_infra::{CatalogStore, CollectionGateway, GatewayError};
use stockroom_products::Variant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrphanVariant {
    pub id: VariantId,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    pub base_product_id: BaseProductId,
}

impl From<Variant> for OrphanVariant {
    fn from(variant: Variant) -> Self {
        Self {
            ean: variant.business_key().map(|e| e.as_str().to_string()),
            id: variant.id,
            full_name: variant.full_name,
            base_product_id: variant.base_product_id,
        }
    }
}

/// List variants referencing a missing base product, ordered by the
/// dangling id and then by variant id.
pub async fn find_orphan_variants<G: CollectionGateway>(
    store: &CatalogStore<G>,
) -> Result<Vec<OrphanVariant>, GatewayError> {
    let referenced: Vec<BaseProductId> = store
        .base_product_reference_counts()
        .await?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    if referenced.is_empty() {
        return Ok(Vec::new());
    }

    let live: HashSet<BaseProductId> = store
        .base_products_in(&referenced)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    let missing: Vec<BaseProductId> = referenced
        .into_iter()
        .filter(|id| !live.contains(id))
        .collect();
    if missing.is_empty() {
        return Ok(Vec::new());
    }

    let mut orphans: Vec<OrphanVariant> = store
        .variants_of_any(&missing)
        .await?
        .into_iter()
        .map(OrphanVariant::from)
        .collect();
    orphans.sort_by(|a, b| {
        a.base_product_id
            .cmp(&b.base_product_id)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(orphans)
}
