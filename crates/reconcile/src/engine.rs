//! Engine facade: one entry point per reconciliation operation.

use tracing::instrument;

use stockroom_infra::{CatalogStore, CollectionGateway};

use crate::config::EngineConfig;
use crate::duplicates::{self, DuplicateGroup};
use crate::error::EngineResult;
use crate::merge::{self, MergePreview, MergeReport};
use crate::orphans::{self, OrphanVariant};
use crate::reassign::{self, ReassignManyReport, ReassignOneResult};

/// Catalog reconciliation over any collection gateway.
///
/// Cheap to share behind an `Arc`; holds no per-call state.
#[derive(Debug)]
pub struct ReconciliationEngine<G> {
    store: CatalogStore<G>,
    config: EngineConfig,
}

impl<G: CollectionGateway> ReconciliationEngine<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_config(gateway, EngineConfig::default())
    }

    pub fn with_config(gateway: G, config: EngineConfig) -> Self {
        Self {
            store: CatalogStore::new(gateway),
            config,
        }
    }

    pub fn store(&self) -> &CatalogStore<G> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[instrument(skip(self), err)]
    pub async fn find_duplicate_eans(&self) -> EngineResult<Vec<DuplicateGroup>> {
        Ok(duplicates::find_duplicate_eans(&self.store).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn find_orphan_variants(&self) -> EngineResult<Vec<OrphanVariant>> {
        Ok(orphans::find_orphan_variants(&self.store).await?)
    }

    #[instrument(skip(self, source_ids), fields(sources = source_ids.len()), err)]
    pub async fn preview_merge(
        &self,
        target_id: &str,
        source_ids: &[String],
    ) -> EngineResult<MergePreview> {
        merge::preview_merge(&self.store, target_id, source_ids).await
    }

    #[instrument(skip(self, source_ids), fields(sources = source_ids.len()), err)]
    pub async fn merge_products(
        &self,
        target_id: &str,
        source_ids: &[String],
    ) -> EngineResult<MergeReport> {
        merge::merge_products(&self.store, &self.config, target_id, source_ids).await
    }

    #[instrument(skip(self), err)]
    pub async fn reassign_one(
        &self,
        variant_id: &str,
        new_base_product_id: &str,
    ) -> EngineResult<ReassignOneResult> {
        reassign::reassign_one(&self.store, variant_id, new_base_product_id).await
    }

    #[instrument(skip(self, variant_ids), fields(variants = variant_ids.len()), err)]
    pub async fn reassign_many(
        &self,
        variant_ids: &[String],
        new_base_product_id: &str,
    ) -> EngineResult<ReassignManyReport> {
        reassign::reassign_many(&self.store, &self.config, variant_ids, new_base_product_id).await
    }
}
