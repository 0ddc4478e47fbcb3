// src/jobs/mod.rs
// =============================================================================
// This module owns analysis jobs: what they look like, where they are
// stored, and the orchestrator that drives them from pending to done.
//
// Submodules:
// - model: AnalysisJob, its status, link statistics and the public report
// - store: The JobRepository trait and an in-memory implementation
// - service: WebAnalyzer, the job orchestrator
// =============================================================================

mod model;
mod service;
mod store;

pub use model::{
    AnalysisJob, AnalysisReport, InaccessibleLink, JobStatus, LinkAnalysis, LinkProbeResult,
};
pub use service::WebAnalyzer;
pub use store::{InMemoryJobRepository, JobRepository};
