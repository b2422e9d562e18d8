//! Duplicate barcode detection.
//!
//! The store does not enforce EAN uniqueness across variants. This is the
//! read-side check that finds the collisions so they can be merged or
//! reassigned.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use stockroom_core::{BaseProductId, VariantId};
use stockroom_infra::{CatalogStore, CollectionGateway, GatewayError};
use stockroom_products::{Ean, Variant};

/// One variant sharing a duplicated EAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMember {
    pub id: VariantId,
    pub full_name: String,
    pub base_product_id: BaseProductId,
    /// Absent when `base_product_id` does not resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_product_name: Option<String>,
}

/// Variants sharing one EAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub ean: String,
    pub count: usize,
    /// Whether the EAN carries a valid GS1 check digit.
    pub checksum_valid: bool,
    pub variants: Vec<DuplicateMember>,
}

/// Find every EAN carried by more than one variant.
///
/// Groups are ordered by size (largest first), then by EAN. Members are
/// ordered by creation time, then id. Blank EANs are not a business key and
/// never form a group. Stored values that differ only by surrounding
/// whitespace are the same EAN.
pub async fn find_duplicate_eans<G: CollectionGateway>(
    store: &CatalogStore<G>,
) -> Result<Vec<DuplicateGroup>, GatewayError> {
    let mut per_key: HashMap<Ean, (u64, Vec<String>)> = HashMap::new();
    for (raw, count) in store.ean_counts().await? {
        let entry = per_key.entry(Ean::new(&raw)).or_default();
        entry.0 += count;
        entry.1.push(raw);
    }

    let raw_values: Vec<String> = per_key
        .into_values()
        .filter(|(count, _)| *count > 1)
        .flat_map(|(_, raws)| raws)
        .collect();
    if raw_values.is_empty() {
        return Ok(Vec::new());
    }

    let variants = store.variants_with_eans(&raw_values).await?;

    let mut base_ids: Vec<BaseProductId> =
        variants.iter().map(|v| v.base_product_id.clone()).collect();
    base_ids.sort();
    base_ids.dedup();
    let names: HashMap<BaseProductId, String> = store
        .base_products_in(&base_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let mut by_ean: BTreeMap<Ean, Vec<Variant>> = BTreeMap::new();
    for variant in variants {
        if let Some(key) = variant.business_key().cloned() {
            by_ean.entry(key).or_default().push(variant);
        }
    }

    let mut groups: Vec<DuplicateGroup> = by_ean
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(ean, mut members)| {
            members.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            DuplicateGroup {
                checksum_valid: ean.has_valid_check_digit(),
                count: members.len(),
                variants: members
                    .into_iter()
                    .map(|v| DuplicateMember {
                        base_product_name: names.get(&v.base_product_id).cloned(),
                        id: v.id,
                        full_name: v.full_name,
                        base_product_id: v.base_product_id,
                    })
                    .collect(),
                ean: ean.as_str().to_string(),
            }
        })
        .collect();

    // Stable sort keeps the EAN order from the map for equal counts.
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(groups)
}
