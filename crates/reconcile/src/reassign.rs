//! Variant reassignment.
//!
//! Moving one variant to another base product is the shared primitive: the
//! single and batch operations here and every per-source step of a merge go
//! through [`move_variant`]. Only `baseProductId` is written, and only if the
//! variant is still at the version it was read at.

use std::collections::{HashMap, HashSet};

use futures::{stream, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{info, warn};

use stockroom_core::{BaseProductId, DomainError, VariantId};
use stockroom_infra::{CatalogStore, CollectionGateway, GatewayError, Scan, Stored};
use stockroom_products::Variant;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::outcome::Status;

pub(crate) const TARGET_NOT_FOUND: &str = "target not found";
pub(crate) const VARIANT_NOT_FOUND: &str = "variant not found";
pub(crate) const VARIANT_MODIFIED: &str = "variant was modified concurrently";
pub(crate) const VARIANT_UNREADABLE: &str = "variant could not be decoded";
pub(crate) const INVALID_ID: &str = "invalid id";

/// Result of `reassign_one`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReassignOneResult {
    pub success: bool,
    pub message: String,
}

impl ReassignOneResult {
    fn succeeded(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

/// A variant that could not be reassigned, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantError {
    pub variant_id: String,
    pub message: String,
}

impl VariantError {
    pub fn new(variant_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            variant_id: variant_id.into(),
            message: message.into(),
        }
    }
}

/// Result of `reassign_many`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignManyReport {
    /// `true` when no entry failed.
    pub success: bool,
    pub status: Status,
    pub success_count: usize,
    pub errors: Vec<VariantError>,
}

impl ReassignManyReport {
    fn from_tally(tally: Tally) -> Self {
        Self {
            success: tally.errors.is_empty(),
            status: Status::from_counts(tally.succeeded, tally.errors.len()),
            success_count: tally.succeeded,
            errors: tally.errors,
        }
    }
}

/// What happened to one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Move {
    Moved,
    /// Already pointed at the target; nothing written.
    AlreadyThere,
    Failed(&'static str),
}

/// Running totals folded over a batch of moves.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub succeeded: usize,
    pub errors: Vec<VariantError>,
}

impl Tally {
    fn record(mut self, variant_id: impl Into<String>, outcome: Move) -> Self {
        match outcome {
            Move::Moved | Move::AlreadyThere => self.succeeded += 1,
            Move::Failed(message) => self.errors.push(VariantError::new(variant_id, message)),
        }
        self
    }
}

/// Point an already-loaded variant at `target`.
///
/// Expected conditions (variant gone, stale version) come back as
/// [`Move::Failed`]; only store failures are `Err`.
pub(crate) async fn move_variant<G: CollectionGateway>(
    store: &CatalogStore<G>,
    variant: &Stored<Variant>,
    target: &BaseProductId,
) -> Result<Move, GatewayError> {
    if variant.value.belongs_to(target) {
        return Ok(Move::AlreadyThere);
    }

    match store.set_variant_base_product(variant, target).await {
        Ok(_) => Ok(Move::Moved),
        Err(GatewayError::Conflict { .. }) => Ok(Move::Failed(VARIANT_MODIFIED)),
        Err(GatewayError::NotFound { .. }) => Ok(Move::Failed(VARIANT_NOT_FOUND)),
        Err(err) => Err(err),
    }
}

async fn move_variant_by_id<G: CollectionGateway>(
    store: &CatalogStore<G>,
    variant_id: &VariantId,
    target: &BaseProductId,
) -> Result<Move, GatewayError> {
    match store.variant(variant_id).await {
        Ok(Some(variant)) => move_variant(store, &variant, target).await,
        Ok(None) => Ok(Move::Failed(VARIANT_NOT_FOUND)),
        Err(GatewayError::Decode(reason)) => {
            warn!(variant_id = %variant_id, reason = %reason, "variant not decodable");
            Ok(Move::Failed(VARIANT_UNREADABLE))
        }
        Err(err) => Err(err),
    }
}

/// Move a set of loaded variants with bounded concurrency.
///
/// Documents that did not decode cannot be moved and count as failures.
/// Stops at the first store failure. Errors are sorted by variant id since
/// completion order is arbitrary.
pub(crate) async fn move_all<G: CollectionGateway>(
    store: &CatalogStore<G>,
    config: &EngineConfig,
    variants: Scan<Variant>,
    target: &BaseProductId,
) -> Result<Tally, GatewayError> {
    let unreadable = variants
        .undecodable
        .into_iter()
        .fold(Tally::default(), |tally, id| {
            tally.record(id, Move::Failed(VARIANT_UNREADABLE))
        });

    let mut tally = stream::iter(variants.decoded)
        .map(|variant| async move {
            let outcome = move_variant(store, &variant, target).await?;
            Ok::<_, GatewayError>((variant.value.id, outcome))
        })
        .buffer_unordered(config.reassign_concurrency())
        .try_fold(unreadable, |tally, (id, outcome)| async move {
            Ok::<_, GatewayError>(tally.record(id, outcome))
        })
        .await?;

    tally.errors.sort_by(|a, b| a.variant_id.cmp(&b.variant_id));
    Ok(tally)
}

/// Reassign a single variant.
///
/// Malformed ids are a validation error. Missing target or variant is a
/// structured failure; reassigning to the current owner is a no-op success.
pub async fn reassign_one<G: CollectionGateway>(
    store: &CatalogStore<G>,
    variant_id: &str,
    new_base_product_id: &str,
) -> EngineResult<ReassignOneResult> {
    let variant_id = VariantId::parse(variant_id)?;
    let target = BaseProductId::parse(new_base_product_id)?;

    if store.base_product(&target).await?.is_none() {
        warn!(variant_id = %variant_id, target = %target, "reassign target not found");
        return Ok(ReassignOneResult::failed(TARGET_NOT_FOUND));
    }

    let result = match move_variant_by_id(store, &variant_id, &target).await? {
        Move::Moved => {
            info!(variant_id = %variant_id, target = %target, "variant reassigned");
            ReassignOneResult::succeeded("variant reassigned")
        }
        Move::AlreadyThere => ReassignOneResult::succeeded("variant already belongs to target"),
        Move::Failed(message) => {
            warn!(variant_id = %variant_id, target = %target, reason = message, "variant not reassigned");
            ReassignOneResult::failed(message)
        }
    };

    Ok(result)
}

async fn move_raw_variant<'a, G: CollectionGateway>(
    store: &CatalogStore<G>,
    raw: &'a str,
    target: &BaseProductId,
) -> Result<(&'a str, Move), GatewayError> {
    let outcome = match VariantId::parse(raw) {
        Ok(id) => move_variant_by_id(store, &id, target).await?,
        Err(_) => Move::Failed(INVALID_ID),
    };
    Ok((raw, outcome))
}

/// Reassign a batch of variants to one target.
///
/// Each entry is independent: malformed, missing, or concurrently modified
/// variants are recorded in `errors` and the rest of the batch proceeds.
/// Every entry counts, so a repeated id is moved once and then succeeds as a
/// no-op. Errors keep input order.
pub async fn reassign_many<G: CollectionGateway>(
    store: &CatalogStore<G>,
    config: &EngineConfig,
    variant_ids: &[String],
    new_base_product_id: &str,
) -> EngineResult<ReassignManyReport> {
    if variant_ids.is_empty() {
        return Err(DomainError::validation("variantIds must not be empty").into());
    }
    let target = BaseProductId::parse(new_base_product_id)?;

    if store.base_product(&target).await?.is_none() {
        warn!(target = %target, variants = variant_ids.len(), "reassign target not found");
        let tally = variant_ids.iter().fold(Tally::default(), |tally, raw| {
            tally.record(raw.as_str(), Move::Failed(TARGET_NOT_FOUND))
        });
        return Ok(ReassignManyReport::from_tally(tally));
    }

    // Each distinct id is moved once; every occurrence then counts with that
    // outcome, so a repeat of a moved id is a no-op success.
    let mut seen = HashSet::new();
    let distinct: Vec<&str> = variant_ids
        .iter()
        .map(String::as_str)
        .filter(|raw| seen.insert(*raw))
        .collect();

    let moves: Vec<_> = distinct
        .into_iter()
        .map(|raw| move_raw_variant(store, raw, &target))
        .collect();
    let outcomes: HashMap<&str, Move> = stream::iter(moves)
        .buffer_unordered(config.reassign_concurrency())
        .try_collect()
        .await?;

    let tally = variant_ids.iter().fold(Tally::default(), |tally, raw| {
        let outcome = outcomes
            .get(raw.as_str())
            .copied()
            .unwrap_or(Move::Failed(VARIANT_NOT_FOUND));
        tally.record(raw.as_str(), outcome)
    });

    let report = ReassignManyReport::from_tally(tally);
    info!(
        target = %target,
        success_count = report.success_count,
        failed = report.errors.len(),
        "batch reassignment finished"
    );
    Ok(report)
}
