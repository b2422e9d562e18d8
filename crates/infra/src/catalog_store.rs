//! Typed catalog access over a [`CollectionGateway`].
//!
//! Converts between store documents and the `stockroom-products` models, and
//! pins down the field names the catalog uses in its documents.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use stockroom_core::{BaseProductId, Entity, ExpectedVersion, VariantId};
use stockroom_products::{BaseProduct, Variant};

use crate::gateway::{Collection, CollectionGateway, Document, GatewayError, ID_FIELD};

/// Document field names used by catalog queries.
pub mod fields {
    pub const BASE_PRODUCT_ID: &str = "baseProductId";
    pub const EAN: &str = "ean";
}

/// A decoded document together with the store version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Stored<T> {
    /// Expect the document to still be at the version it was read at.
    pub fn expected_version(&self) -> ExpectedVersion {
        ExpectedVersion::Exact(self.version)
    }
}

impl<T: Entity> Stored<T> {
    pub fn id(&self) -> &T::Id {
        self.value.id()
    }
}

fn decode<T: DeserializeOwned>(doc: &Document) -> Result<Stored<T>, GatewayError> {
    Ok(Stored {
        version: doc.version,
        value: doc.decode()?,
    })
}

/// Documents read in bulk, split by whether they decode into the model.
///
/// One inconsistent document must not hide the rest, so bulk reads never fail
/// on decode. Callers that act on every matching document (a merge deleting
/// the owner, say) account for `undecodable` themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan<T> {
    pub decoded: Vec<Stored<T>>,
    /// Ids of matching documents that did not decode.
    pub undecodable: Vec<String>,
}

impl<T> Scan<T> {
    /// Matching documents, decodable or not.
    pub fn len(&self) -> usize {
        self.decoded.len() + self.undecodable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_values(self) -> Vec<T> {
        self.decoded.into_iter().map(|s| s.value).collect()
    }
}

fn decode_each<T: Entity + DeserializeOwned>(docs: &[Document]) -> Scan<T> {
    let mut scan = Scan {
        decoded: Vec::with_capacity(docs.len()),
        undecodable: Vec::new(),
    };
    for doc in docs {
        match decode(doc) {
            Ok(stored) => scan.decoded.push(stored),
            Err(err) => {
                warn!(kind = T::KIND, id = %doc.id, error = %err, "skipping undecodable document");
                scan.undecodable.push(doc.id.clone());
            }
        }
    }
    scan
}

/// Typed catalog view over a document gateway.
#[derive(Debug, Clone)]
pub struct CatalogStore<G> {
    gateway: G,
}

impl<G: CollectionGateway> CatalogStore<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub async fn base_product(
        &self,
        id: &BaseProductId,
    ) -> Result<Option<Stored<BaseProduct>>, GatewayError> {
        self.get(Collection::BaseProducts, id).await
    }

    pub async fn variant(&self, id: &VariantId) -> Result<Option<Stored<Variant>>, GatewayError> {
        self.get(Collection::Variants, id).await
    }

    async fn get<T>(&self, collection: Collection, id: &T::Id) -> Result<Option<Stored<T>>, GatewayError>
    where
        T: Entity + DeserializeOwned,
    {
        let Some(doc) = self.gateway.get_by_id(collection, &id.to_string()).await? else {
            debug!(kind = T::KIND, id = %id, "document not found");
            return Ok(None);
        };

        match decode(&doc) {
            Err(GatewayError::Decode(msg)) => {
                Err(GatewayError::Decode(format!("{} {id}: {msg}", T::KIND)))
            }
            other => other.map(Some),
        }
    }

    /// All variants whose soft foreign key points at `base_product_id`,
    /// including the ones that fail to decode.
    pub async fn variants_of(
        &self,
        base_product_id: &BaseProductId,
    ) -> Result<Scan<Variant>, GatewayError> {
        let docs = self
            .gateway
            .find_by_field(
                Collection::Variants,
                fields::BASE_PRODUCT_ID,
                &JsonValue::String(base_product_id.to_string()),
            )
            .await?;
        Ok(decode_each(&docs))
    }

    /// Variants whose `baseProductId` is any of `base_product_ids`.
    /// Undecodable documents are skipped.
    pub async fn variants_of_any(
        &self,
        base_product_ids: &[BaseProductId],
    ) -> Result<Vec<Variant>, GatewayError> {
        let values: Vec<JsonValue> = base_product_ids
            .iter()
            .map(|id| JsonValue::String(id.to_string()))
            .collect();
        let docs = self
            .gateway
            .find_many_by_field_in(Collection::Variants, fields::BASE_PRODUCT_ID, &values)
            .await?;
        Ok(decode_each(&docs).into_values())
    }

    /// Variants whose stored `ean` value is one of `raw_eans` (exact match).
    /// Undecodable documents are skipped.
    pub async fn variants_with_eans(&self, raw_eans: &[String]) -> Result<Vec<Variant>, GatewayError> {
        let values: Vec<JsonValue> = raw_eans.iter().cloned().map(JsonValue::String).collect();
        let docs = self
            .gateway
            .find_many_by_field_in(Collection::Variants, fields::EAN, &values)
            .await?;
        Ok(decode_each(&docs).into_values())
    }

    /// Base products among `ids` that exist. Missing ids and undecodable
    /// documents are simply absent.
    pub async fn base_products_in(
        &self,
        ids: &[BaseProductId],
    ) -> Result<Vec<BaseProduct>, GatewayError> {
        let values: Vec<JsonValue> = ids.iter().map(|id| JsonValue::String(id.to_string())).collect();
        let docs = self
            .gateway
            .find_many_by_field_in(Collection::BaseProducts, ID_FIELD, &values)
            .await?;
        Ok(decode_each(&docs).into_values())
    }

    /// Variant counts per stored `ean` string value.
    ///
    /// Missing, null, non-string, and blank values are skipped: they are not a
    /// business key.
    pub async fn ean_counts(&self) -> Result<Vec<(String, u64)>, GatewayError> {
        let groups = self
            .gateway
            .count_grouped_by(Collection::Variants, fields::EAN)
            .await?;

        Ok(groups
            .into_iter()
            .filter_map(|g| match g.value {
                JsonValue::String(raw) if !raw.trim().is_empty() => Some((raw, g.count)),
                _ => None,
            })
            .collect())
    }

    /// Variant counts per referenced base product id.
    ///
    /// References that are not well-formed ids are skipped.
    pub async fn base_product_reference_counts(
        &self,
    ) -> Result<Vec<(BaseProductId, u64)>, GatewayError> {
        let groups = self
            .gateway
            .count_grouped_by(Collection::Variants, fields::BASE_PRODUCT_ID)
            .await?;

        Ok(groups
            .into_iter()
            .filter_map(|g| {
                let id = g.value.as_str().and_then(|raw| BaseProductId::parse(raw).ok())?;
                Some((id, g.count))
            })
            .collect())
    }

    /// Point a variant at a new base product, guarded by the version it was read at.
    ///
    /// Only `baseProductId` is written. Returns the variant's new version.
    pub async fn set_variant_base_product(
        &self,
        variant: &Stored<Variant>,
        target: &BaseProductId,
    ) -> Result<u64, GatewayError> {
        self.gateway
            .update_field(
                Collection::Variants,
                variant.id().as_str(),
                fields::BASE_PRODUCT_ID,
                JsonValue::String(target.to_string()),
                variant.expected_version(),
            )
            .await
    }

    /// Delete a base product, guarded by the version it was read at.
    pub async fn delete_base_product(
        &self,
        product: &Stored<BaseProduct>,
    ) -> Result<(), GatewayError> {
        self.gateway
            .delete_by_id(
                Collection::BaseProducts,
                product.id().as_str(),
                product.expected_version(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryCollectionGateway;
    use chrono::Utc;
    use std::sync::Arc;

    fn bp(id: &str) -> BaseProductId {
        BaseProductId::parse(id).unwrap()
    }

    fn seeded() -> CatalogStore<Arc<InMemoryCollectionGateway>> {
        let gw = Arc::new(InMemoryCollectionGateway::new());
        gw.insert(
            Collection::BaseProducts,
            &BaseProduct::new(bp("b1"), "Leche X", Utc::now()),
        )
        .unwrap();
        for (id, base, ean) in [("v1", "b1", "111"), ("v2", "b1", " "), ("v3", "gone", "111")] {
            let v = Variant::new(VariantId::parse(id).unwrap(), bp(base), id, Utc::now())
                .with_ean(ean);
            gw.insert(Collection::Variants, &v).unwrap();
        }
        CatalogStore::new(gw)
    }

    #[tokio::test]
    async fn reads_typed_documents() {
        let store = seeded();
        let product = store.base_product(&bp("b1")).await.unwrap().unwrap();
        assert_eq!(product.value.name, "Leche X");
        assert_eq!(product.version, 1);

        assert!(store.base_product(&bp("zz")).await.unwrap().is_none());
        assert_eq!(store.variants_of(&bp("b1")).await.unwrap().len(), 2);
        assert_eq!(store.base_products_in(&[bp("b1"), bp("gone")]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bulk_reads_skip_undecodable_documents() {
        let store = seeded();
        let gw = store.gateway();
        gw.insert(
            Collection::Variants,
            &serde_json::json!({"id": "v4", "baseProductId": "b1", "fullName": 7}),
        )
        .unwrap();
        gw.insert(
            Collection::BaseProducts,
            &serde_json::json!({"id": "b2", "name": "Sin fecha"}),
        )
        .unwrap();

        let of_b1 = store.variants_of(&bp("b1")).await.unwrap();
        assert_eq!(of_b1.decoded.len(), 2);
        assert_eq!(of_b1.undecodable, vec!["v4".to_string()]);
        assert_eq!(of_b1.len(), 3);

        assert_eq!(store.variants_of_any(&[bp("b1")]).await.unwrap().len(), 2);
        let products = store.base_products_in(&[bp("b1"), bp("b2")]).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, bp("b1"));
    }

    #[tokio::test]
    async fn ean_counts_skip_blank_values() {
        let store = seeded();
        let counts = store.ean_counts().await.unwrap();
        assert_eq!(counts, vec![("111".to_string(), 2)]);
    }

    #[tokio::test]
    async fn reassignment_writes_only_the_foreign_key() {
        let store = seeded();
        let v1 = store.variant(&VariantId::parse("v1").unwrap()).await.unwrap().unwrap();

        let version = store.set_variant_base_product(&v1, &bp("b9")).await.unwrap();
        let after = store.variant(&v1.value.id).await.unwrap().unwrap();

        assert_eq!(version, v1.version + 1);
        assert_eq!(after.value.base_product_id, bp("b9"));
        assert_eq!(after.value.ean, v1.value.ean);
        assert_eq!(after.value.full_name, v1.value.full_name);

        // The stale copy can no longer be written.
        assert!(matches!(
            store.set_variant_base_product(&v1, &bp("b1")).await,
            Err(GatewayError::Conflict { .. })
        ));
    }
}
