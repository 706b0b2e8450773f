//! Progress engine configuration.

/// Configuration for the progress service.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Upper bound on distinct module ids accepted by one
    /// `user_progress` call (default: 500).
    pub max_modules_per_request: usize,
    /// Include Draft and Archived modules in tenant reports and
    /// dashboards (default: false, Published only).
    pub include_unpublished: bool,
    /// Batches slower than this are logged at WARN (default: 250 ms).
    pub slow_batch_threshold_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            max_modules_per_request: 500,
            include_unpublished: false,
            slow_batch_threshold_ms: 250,
        }
    }
}
