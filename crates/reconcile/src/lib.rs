//! `stockroom-reconcile`: catalog reconciliation engine.
//!
//! Detects duplicate barcodes and orphaned variants, reassigns variants
//! between base products, and merges duplicate base products into one
//! target. The store offers no multi-document transactions, so every
//! mutating operation reports what it did per unit of work instead of
//! pretending to be atomic.

pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod merge;
pub mod orphans;
pub mod outcome;
pub mod reassign;

pub use config::EngineConfig;
pub use duplicates::{DuplicateGroup, DuplicateMember};
pub use engine::ReconciliationEngine;
pub use error::{EngineError, EngineResult};
pub use merge::{MergePreview, MergeReport, SourcePreview, SourceReport, SourceState, TargetSummary};
pub use orphans::OrphanVariant;
pub use outcome::Status;
pub use reassign::{ReassignManyReport, ReassignOneResult, VariantError};
