//! Engine error model.
//!
//! Only two things abort an engine call: bad top-level input and store
//! failures. Everything else (missing sub-items, self-merge entries, stale
//! versions) is reported inside the operation's result.

use stockroom_core::DomainError;
use stockroom_infra::GatewayError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Top-level input rejected before any store access.
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// A read-only operation needs a target that does not exist.
    #[error("target base product '{0}' not found")]
    TargetNotFound(String),

    /// The collection gateway failed; the operation stopped where it was.
    #[error("store error: {0}")]
    Store(#[from] GatewayError),
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
