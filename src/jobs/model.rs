// src/jobs/model.rs
// =============================================================================
// Data model for analysis jobs.
//
// AnalysisJob is the stored record. It starts `pending` and receives exactly
// one terminal write (`success` or `failed`). AnalysisReport is the public
// shape handed to callers when they poll.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Success,
    Failed,
}

impl JobStatus {
    /// Success and Failed are terminal: nothing moves a job out of them
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link that was probed and found unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InaccessibleLink {
    pub url: String,
    /// 0 when no response was ever received
    pub status_code: u16,
}

/// Aggregated link statistics for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkAnalysis {
    pub internal: usize,
    pub external: usize,
    pub inaccessible: usize,
    pub inaccessible_details: Vec<InaccessibleLink>,
}

/// Outcome of probing a single link. Produced by a worker, consumed once by
/// the aggregator, never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkProbeResult {
    /// The href as it appeared in the page
    pub link: String,
    pub resolved_url: String,
    pub status_code: u16,
    pub is_accessible: bool,
}

/// The stored record of one submitted analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    /// Assigned by the repository on save
    pub id: Uuid,
    pub url: String,
    pub status: JobStatus,
    pub html_version: String,
    pub title: String,
    pub headings: BTreeMap<String, usize>,
    pub links: LinkAnalysis,
    pub has_login_form: bool,
    pub error_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl AnalysisJob {
    /// A fresh pending job for `url`. The id stays nil until it is saved.
    pub fn pending(url: &str) -> Self {
        Self {
            id: Uuid::nil(),
            url: url.to_string(),
            status: JobStatus::Pending,
            html_version: String::new(),
            title: String::new(),
            headings: BTreeMap::new(),
            links: LinkAnalysis::default(),
            has_login_form: false,
            error_description: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Maps the record onto the shape callers see.
    pub fn to_report(&self) -> AnalysisReport {
        AnalysisReport {
            id: self.id,
            url: self.url.clone(),
            html_version: self.html_version.clone(),
            title: self.title.clone(),
            headings: self.headings.clone(),
            links: self.links.clone(),
            has_login_form: self.has_login_form,
            status: self.status,
            error_description: self
                .error_description
                .clone()
                .filter(|description| !description.is_empty()),
        }
    }
}

/// What `get_analyze_data` returns, possibly for a job that is still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub url: String,
    pub html_version: String,
    pub title: String,
    pub headings: BTreeMap<String, usize>,
    pub links: LinkAnalysis,
    pub has_login_form: bool,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}
