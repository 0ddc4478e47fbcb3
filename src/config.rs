// src/config.rs
// =============================================================================
// Runtime settings for the analyzer.
//
// The CLI fills these in from flags (with WEB_ANALYZER_* environment
// fallbacks, see cli.rs); tests build them directly, usually starting from
// AnalyzerConfig::default().
// =============================================================================

use std::time::Duration;

/// Upper bound on link-check workers per job.
pub const DEFAULT_MAX_LINK_WORKERS: usize = 10;

/// Per-probe HTTP timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for fetching the analyzed page itself.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How many analysis pipelines may run at the same time.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Worker pool size is min(max_link_workers, link count)
    pub max_link_workers: usize,
    pub probe_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Pipelines beyond this wait for a free slot; submission never waits
    pub max_concurrent_jobs: usize,
    /// When set, link checking stops at this deadline and the job keeps
    /// whatever was probed so far
    pub link_check_deadline: Option<Duration>,
    pub user_agent: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_link_workers: DEFAULT_MAX_LINK_WORKERS,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            link_check_deadline: None,
            user_agent: format!("web-analyzer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
