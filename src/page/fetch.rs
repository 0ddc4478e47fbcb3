// src/page/fetch.rs
// =============================================================================
// This module downloads the page being analyzed.
//
// Rules:
// - Plain GET, redirects followed (unlike link probes)
// - Anything other than 200 OK is a failure
// - A body that can't be decoded as text is a parse failure
//
// Failures come back as AnalyzerError::Fetch / AnalyzerError::Parse with a
// message meant for the job's error description, so the wording matters:
// it tells the user whether the URL was unreachable or something else broke.
// =============================================================================

use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;

/// Fetches pages for analysis.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AnalyzerError::Internal(format!("failed to build page client: {e}")))?;

        Ok(Self { client })
    }

    // Fetches a web page and returns its HTML as text
    pub async fn fetch_page(&self, url: &Url) -> Result<String, AnalyzerError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| categorize_error(&e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AnalyzerError::Fetch(format!(
                "URL returned error status: {}",
                status.as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AnalyzerError::Parse(e.to_string()))
    }
}

// Turns a reqwest error into a user-facing description
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure / connection refused
// - A URL reqwest can't send a request to
// - Too many redirects
fn categorize_error(error: &reqwest::Error) -> AnalyzerError {
    let message = if error.is_builder() || error.is_connect() {
        format!("URL is unreachable or invalid: {error}")
    } else if error.is_timeout() {
        format!("Timed out fetching URL: {error}")
    } else if error.is_redirect() {
        format!("Too many redirects fetching URL: {error}")
    } else {
        format!("Failed to fetch URL: {error}")
    };

    AnalyzerError::Fetch(message)
}
