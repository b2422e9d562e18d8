//! Overall outcome of a mutating engine call.

use serde::Serialize;

/// What actually happened, across all units of work in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    /// Every unit of work succeeded.
    Succeeded,
    /// Some units succeeded, some failed; the failures are listed.
    PartiallySucceeded,
    /// Nothing succeeded (or a precondition failed before any work).
    Failed,
}

impl Status {
    /// Classify a batch from its success and failure counts.
    ///
    /// An empty batch with no failures counts as succeeded.
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => Status::Succeeded,
            (0, _) => Status::Failed,
            _ => Status::PartiallySucceeded,
        }
    }

    /// Conventional boolean view: anything but `Failed`.
    pub fn is_success(self) -> bool {
        !matches!(self, Status::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_counts() {
        assert_eq!(Status::from_counts(3, 0), Status::Succeeded);
        assert_eq!(Status::from_counts(0, 0), Status::Succeeded);
        assert_eq!(Status::from_counts(2, 1), Status::PartiallySucceeded);
        assert_eq!(Status::from_counts(0, 4), Status::Failed);
    }

    #[test]
    fn partial_success_still_reports_success() {
        assert!(Status::PartiallySucceeded.is_success());
        assert!(!Status::Failed.is_success());
    }
}
