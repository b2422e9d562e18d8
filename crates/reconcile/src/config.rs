/// Tuning knobs for the reconciliation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    reassign_concurrency: usize,
}

impl EngineConfig {
    pub const DEFAULT_REASSIGN_CONCURRENCY: usize = 8;

    /// Maximum number of variant updates in flight at once, per source (merge)
    /// or per batch (reassign many). Clamped to at least 1.
    pub fn with_reassign_concurrency(mut self, concurrency: usize) -> Self {
        self.reassign_concurrency = concurrency.max(1);
        self
    }

    pub fn reassign_concurrency(&self) -> usize {
        self.reassign_concurrency
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reassign_concurrency: Self::DEFAULT_REASSIGN_CONCURRENCY,
        }
    }
}
