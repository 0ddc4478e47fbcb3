// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API, so the CLI structure is plain Rust structs and
// enums with attributes. Every analyzer setting can also come from a
// WEB_ANALYZER_* environment variable (clap's `env` feature).
//
// URL validation lives here: the analyzer core expects an absolute http(s)
// URL and doesn't check again.
// =============================================================================

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use url::Url;

use web_analyzer::config::{
    DEFAULT_MAX_CONCURRENT_JOBS, DEFAULT_MAX_LINK_WORKERS,
};
use web_analyzer::{AnalyzerConfig, AnalyzerError};

#[derive(Parser, Debug)]
#[command(
    name = "web-analyzer",
    version,
    about = "Analyze web pages: HTML version, title, headings, login forms and link health",
    long_about = "web-analyzer fetches each page in a background job, extracts its structure \
                  and checks every link on it with a bounded pool of workers. \
                  The CLI submits the jobs, polls them until they finish and prints the reports."
)]
pub struct Cli {
    /// Show debug logs from the analyzer (RUST_LOG overrides this)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze one or more web pages
    ///
    /// Example: web-analyzer analyze https://example.com https://www.rust-lang.org --json
    Analyze {
        /// Page URLs to analyze (http:// or https://)
        #[arg(required = true, value_parser = parse_target_url)]
        urls: Vec<Url>,

        /// Output reports in JSON format instead of a table
        #[arg(long)]
        json: bool,

        /// How often to poll a running job, in milliseconds
        #[arg(long, env = "WEB_ANALYZER_POLL_INTERVAL_MS", default_value_t = 250)]
        poll_interval_ms: u64,

        #[command(flatten)]
        settings: Settings,
    },
}

/// Analyzer tunables
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Maximum link-check workers per page
    #[arg(
        long,
        env = "WEB_ANALYZER_MAX_LINK_WORKERS",
        default_value_t = DEFAULT_MAX_LINK_WORKERS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_link_workers: usize,

    /// Timeout for each link probe, in seconds
    #[arg(long, env = "WEB_ANALYZER_PROBE_TIMEOUT_SECS", default_value_t = 10)]
    pub probe_timeout_secs: u64,

    /// Timeout for fetching the analyzed page, in seconds
    #[arg(long, env = "WEB_ANALYZER_FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// How many pages may be analyzed at the same time
    #[arg(
        long,
        env = "WEB_ANALYZER_MAX_CONCURRENT_JOBS",
        default_value_t = DEFAULT_MAX_CONCURRENT_JOBS,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub max_concurrent_jobs: usize,

    /// Stop checking links after this many seconds and report what was checked
    #[arg(long, env = "WEB_ANALYZER_LINK_CHECK_DEADLINE_SECS")]
    pub link_check_deadline_secs: Option<u64>,

    /// User-Agent header sent with every request
    #[arg(long, env = "WEB_ANALYZER_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl Settings {
    pub fn into_config(self) -> AnalyzerConfig {
        let defaults = AnalyzerConfig::default();
        AnalyzerConfig {
            max_link_workers: self.max_link_workers,
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            max_concurrent_jobs: self.max_concurrent_jobs,
            link_check_deadline: self.link_check_deadline_secs.map(Duration::from_secs),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
        }
    }
}

// Checks that a URL is something we can analyze
//
// Requirements:
// - parses as an absolute URL
// - scheme is http or https
// - has a host
pub fn parse_target_url(raw: &str) -> Result<Url, AnalyzerError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AnalyzerError::Validation(format!("{raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AnalyzerError::Validation(format!(
            "{raw}: please provide a URL with scheme http:// or https://"
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(AnalyzerError::Validation(format!("{raw}: URL has no host")));
    }

    Ok(url)
}
