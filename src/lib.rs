// src/lib.rs
// =============================================================================
// web-analyzer: fetch a page, pull out its structure, and check every link
// on it, all in a background job the caller polls.
//
// Modules:
// - checker: HTML feature extraction, link probing, the worker pool
// - page: Downloading the page under analysis
// - jobs: Job model, storage and the orchestrator (WebAnalyzer)
// - config: Tunables (worker count, timeouts, concurrency)
// - error: Error types
// =============================================================================

pub mod checker;
pub mod config;
pub mod error;
pub mod jobs;
pub mod page;

pub use config::AnalyzerConfig;
pub use error::{AnalyzerError, ErrorCategory, StoreError};
pub use jobs::{AnalysisReport, InMemoryJobRepository, JobRepository, JobStatus, WebAnalyzer};
