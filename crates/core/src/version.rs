//! Optimistic concurrency primitives for store documents.

use crate::error::{DomainError, DomainResult};

/// Optimistic concurrency expectation for a document write.
///
/// Every stored document carries a monotonically increasing version. Writers
/// pass the version they read; the store rejects the write if another caller
/// changed the document in between.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// Require the document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        match self {
            ExpectedVersion::Exact(expected) if expected != actual => {
                Err(DomainError::StaleVersion { expected, actual })
            }
            _ => Ok(()),
        }
    }

    /// The exact version, if any (used as a nullable SQL parameter).
    pub fn as_exact(self) -> Option<u64> {
        match self {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(v),
        }
    }
}
