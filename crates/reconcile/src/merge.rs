//! Base product merge and merge preview.
//!
//! A merge runs a two-phase protocol per source: reassign every variant of
//! the source to the target, then delete the source. A source is deleted only
//! when all of its variants moved and none were attached in the meantime;
//! otherwise it is kept (and reported) so the inconsistency stays visible and
//! a re-run of the same merge can finish the job.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use stockroom_core::{BaseProductId, DomainError};
use stockroom_infra::{CatalogStore, CollectionGateway, GatewayError};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::outcome::Status;
use crate::reassign::{move_all, VariantError};

/// Progress of one source within a merge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum SourceState {
    Pending,
    Reassigning,
    DeletingSource,
    Done,
    Skipped { reason: String },
}

impl SourceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SourceState::Done | SourceState::Skipped { .. })
    }
}

/// Per-source outcome of a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub id: String,
    #[serde(flatten)]
    pub state: SourceState,
    pub variants_reassigned: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variant_errors: Vec<VariantError>,
}

impl SourceReport {
    fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: SourceState::Pending,
            variants_reassigned: 0,
            variant_errors: Vec::new(),
        }
    }

    /// Move to `next`. A terminal state is final.
    fn advance(&mut self, next: SourceState) {
        if self.state.is_terminal() {
            warn!(source = %self.id, state = ?self.state, to = ?next, "ignoring transition out of a terminal state");
            return;
        }
        debug!(source = %self.id, from = ?self.state, to = ?next, "merge source transition");
        self.state = next;
    }

    fn skip(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!(source = %self.id, reason = %reason, "merge source skipped");
        self.advance(SourceState::Skipped { reason });
        self
    }

    pub fn is_done(&self) -> bool {
        self.state == SourceState::Done
    }

    /// Error line for a skipped source.
    pub fn error(&self) -> Option<String> {
        match &self.state {
            SourceState::Skipped { reason } => Some(format!("source {} {}", self.id, reason)),
            _ => None,
        }
    }
}

/// Result of `merge_products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// `false` only when the target is missing or every source failed.
    pub success: bool,
    pub status: Status,
    #[serde(rename = "variantsReasignadas")]
    pub variants_reassigned: usize,
    #[serde(rename = "productosEliminados")]
    pub products_deleted: usize,
    pub errors: Vec<String>,
    pub sources: Vec<SourceReport>,
}

impl MergeReport {
    fn target_missing(target: &BaseProductId) -> Self {
        Self {
            success: false,
            status: Status::Failed,
            variants_reassigned: 0,
            products_deleted: 0,
            errors: vec![format!("target {target} not found")],
            sources: Vec::new(),
        }
    }

    fn from_sources(sources: Vec<SourceReport>) -> Self {
        let products_deleted = sources.iter().filter(|s| s.is_done()).count();
        let status = Status::from_counts(products_deleted, sources.len() - products_deleted);

        Self {
            success: status.is_success(),
            status,
            variants_reassigned: sources.iter().map(|s| s.variants_reassigned).sum(),
            products_deleted,
            errors: sources.iter().filter_map(SourceReport::error).collect(),
            sources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSummary {
    pub id: BaseProductId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePreview {
    pub id: BaseProductId,
    pub name: String,
    pub variant_count: usize,
}

/// Result of `preview_merge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePreview {
    pub target: TargetSummary,
    pub sources: Vec<SourcePreview>,
    pub total_variants_to_reassign: usize,
    pub warnings: Vec<String>,
}

/// A requested source after local checks.
#[derive(Debug, PartialEq, Eq)]
enum SourceEntry<'a> {
    Valid(BaseProductId),
    Rejected { raw: &'a str, reason: &'static str },
}

/// Dedupe (first occurrence wins), shape-check, and reject self-merge.
fn plan_sources<'a>(source_ids: &'a [String], target: &BaseProductId) -> Vec<SourceEntry<'a>> {
    let mut seen = HashSet::new();
    source_ids
        .iter()
        .map(String::as_str)
        .filter(|raw| seen.insert(*raw))
        .map(|raw| match BaseProductId::parse(raw) {
            Ok(id) if &id == target => SourceEntry::Rejected {
                raw,
                reason: "is the merge target",
            },
            Ok(id) => SourceEntry::Valid(id),
            Err(_) => SourceEntry::Rejected {
                raw,
                reason: "is not a valid id",
            },
        })
        .collect()
}

fn require_sources(source_ids: &[String]) -> Result<(), DomainError> {
    if source_ids.is_empty() {
        return Err(DomainError::validation("sourceIds must not be empty"));
    }
    Ok(())
}

/// Report what a merge would do. Never writes.
///
/// A missing target aborts the preview; missing or rejected sources become
/// warnings.
pub async fn preview_merge<G: CollectionGateway>(
    store: &CatalogStore<G>,
    target_id: &str,
    source_ids: &[String],
) -> EngineResult<MergePreview> {
    require_sources(source_ids)?;
    let target_id = BaseProductId::parse(target_id)?;

    let target = store
        .base_product(&target_id)
        .await?
        .ok_or_else(|| EngineError::TargetNotFound(target_id.to_string()))?
        .value;

    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    for entry in plan_sources(source_ids, &target_id) {
        let id = match entry {
            SourceEntry::Valid(id) => id,
            SourceEntry::Rejected { raw, reason } => {
                warnings.push(format!("source {raw} {reason}, skipped"));
                continue;
            }
        };

        let Some(source) = store.base_product(&id).await? else {
            warnings.push(format!("source {id} not found, skipped"));
            continue;
        };

        let variant_count = store.variants_of(&id).await?.len();
        sources.push(SourcePreview {
            id,
            name: source.value.name,
            variant_count,
        });
    }

    Ok(MergePreview {
        target: TargetSummary {
            id: target.id,
            name: target.name,
        },
        total_variants_to_reassign: sources.iter().map(|s| s.variant_count).sum(),
        sources,
        warnings,
    })
}

/// Merge each source base product into the target.
///
/// Sources are processed one after another; variants within a source are
/// moved concurrently up to the configured bound. There is no rollback:
/// variants that moved stay moved even when their source is kept.
pub async fn merge_products<G: CollectionGateway>(
    store: &CatalogStore<G>,
    config: &EngineConfig,
    target_id: &str,
    source_ids: &[String],
) -> EngineResult<MergeReport> {
    require_sources(source_ids)?;
    let target = BaseProductId::parse(target_id)?;

    if store.base_product(&target).await?.is_none() {
        warn!(target = %target, "merge target not found");
        return Ok(MergeReport::target_missing(&target));
    }

    let mut reports = Vec::with_capacity(source_ids.len());
    for entry in plan_sources(source_ids, &target) {
        let report = match entry {
            SourceEntry::Valid(source) => merge_source(store, config, &target, source).await?,
            SourceEntry::Rejected { raw, reason } => SourceReport::new(raw).skip(reason),
        };
        reports.push(report);
    }

    let report = MergeReport::from_sources(reports);
    info!(
        target = %target,
        status = ?report.status,
        variants_reassigned = report.variants_reassigned,
        products_deleted = report.products_deleted,
        "merge finished"
    );
    Ok(report)
}

async fn merge_source<G: CollectionGateway>(
    store: &CatalogStore<G>,
    config: &EngineConfig,
    target: &BaseProductId,
    source_id: BaseProductId,
) -> EngineResult<SourceReport> {
    let mut report = SourceReport::new(source_id.as_str());

    let source = match store.base_product(&source_id).await {
        Ok(Some(source)) => source,
        Ok(None) => return Ok(report.skip("not found")),
        Err(GatewayError::Decode(reason)) => {
            debug!(source = %source_id, reason = %reason, "merge source not decodable");
            return Ok(report.skip("kept: it could not be decoded"));
        }
        Err(err) => return Err(err.into()),
    };

    report.advance(SourceState::Reassigning);
    let variants = store.variants_of(&source_id).await?;
    let total = variants.len();
    let tally = move_all(store, config, variants, target).await?;
    report.variants_reassigned = tally.succeeded;
    report.variant_errors = tally.errors;

    if !report.variant_errors.is_empty() {
        let failed = report.variant_errors.len();
        return Ok(report.skip(format!(
            "kept: {failed} of {total} variants failed to reassign"
        )));
    }

    report.advance(SourceState::DeletingSource);

    // Variants attached after the reassign phase would be orphaned by the delete.
    let late = store.variants_of(&source_id).await?;
    if !late.is_empty() {
        return Ok(report.skip(format!(
            "kept: {} variant(s) attached during the merge",
            late.len()
        )));
    }

    match store.delete_base_product(&source).await {
        Ok(()) => {}
        Err(GatewayError::Conflict { .. }) => {
            return Ok(report.skip("kept: it was modified concurrently"));
        }
        Err(GatewayError::NotFound { .. }) => {
            return Ok(report.skip("was deleted concurrently"));
        }
        Err(err) => return Err(err.into()),
    }

    report.advance(SourceState::Done);
    info!(
        source = %source_id,
        target = %target,
        variants_reassigned = report.variants_reassigned,
        "source merged and deleted"
    );
    Ok(report)
}
