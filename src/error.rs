// src/error.rs
// =============================================================================
// Error types for the analyzer core.
//
// Two layers:
// - StoreError: what a JobRepository can fail with
// - AnalyzerError: what callers of the WebAnalyzer see
//
// Pipeline failures (fetch, parse) never reach a caller as an error value.
// They are written into the job as a `failed` status with a description,
// so the Fetch and Parse variants mostly exist to build those descriptions.
// =============================================================================

use thiserror::Error;
use uuid::Uuid;

/// Errors returned by a job repository.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `update` was called for an id the store has never seen
    #[error("record not found: {0}")]
    NotFound(Uuid),

    /// The backing storage itself failed (lock poisoned, connection lost, ...)
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Broad class of an error, used when rendering it to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller sent something we can't work with
    Validation,
    /// Something went wrong on our side
    Internal,
    /// A remote server misbehaved or couldn't be reached
    Downstream,
}

/// Errors surfaced by the analyzer.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Malformed target URL (raised at the CLI boundary, never by the core)
    #[error("invalid URL: {0}")]
    Validation(String),

    /// The target page was unreachable or answered with a non-200 status
    #[error("{0}")]
    Fetch(String),

    /// The response body could not be read as an HTML document
    #[error("Failed to parse HTML: {0}")]
    Parse(String),

    /// The job store failed while creating or reading a job
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// No job exists with the requested id
    #[error("Analysis result not found: {0}")]
    NotFound(Uuid),

    /// The analyzer shut down while the job was still running
    #[error("analysis cancelled by shutdown")]
    Cancelled,

    /// Setup failure inside the analyzer (e.g. HTTP client construction)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalyzerError::Validation(_) | AnalyzerError::NotFound(_) => ErrorCategory::Validation,
            AnalyzerError::Fetch(_) | AnalyzerError::Parse(_) => ErrorCategory::Downstream,
            AnalyzerError::Store { .. } | AnalyzerError::Cancelled | AnalyzerError::Internal(_) => {
                ErrorCategory::Internal
            }
        }
    }

    pub(crate) fn store(context: &'static str, source: StoreError) -> Self {
        AnalyzerError::Store { context, source }
    }
}
