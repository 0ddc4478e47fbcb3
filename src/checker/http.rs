// src/checker/http.rs
// =============================================================================
// This module checks whether a single link is reachable.
//
// Key functionality:
// - Filters out links that can't be probed (anchors, javascript:, mailto:)
// - Anything else that resolves is probed, whatever its scheme. A tel: or
//   ftp: link fails at transport level and is reported with status 0
// - Resolves relative links against the page URL
// - Makes an HTTP HEAD request (lightweight, no body download)
// - Falls back to GET when HEAD doesn't give a clean answer
// - Never follows redirects: a 3xx is the final answer, and it counts as OK
//
// Probe protocol:
//   HEAD ── response < 400 ──────────────────────────► accessible
//     │
//     └─ transport error or response >= 400 ─► GET
//                                               ├─ response < 400  ► accessible
//                                               ├─ response >= 400 ► inaccessible (status)
//                                               └─ error           ► inaccessible (status 0)
// =============================================================================

use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::Span;
use url::Url;

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::jobs::LinkProbeResult;

/// Anything that can check one link. The worker pool only sees this trait.
#[async_trait]
pub trait LinkProber: Send + Sync {
    /// Probes `link` (as written in the page) relative to `base`.
    ///
    /// Returns `None` when the link is skipped: it never counts as
    /// accessible or inaccessible.
    async fn probe(&self, link: &str, base: &Url) -> Option<LinkProbeResult>;
}

/// Probes links over real HTTP.
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
    span: Span,
}

impl HttpProber {
    // Builds the probe client
    //
    // One client is shared by every worker (connection pooling). Redirects
    // are disabled so the first response is the one we judge.
    pub fn new(config: &AnalyzerConfig, span: Span) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(config.probe_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AnalyzerError::Internal(format!("failed to build probe client: {e}")))?;

        Ok(Self { client, span })
    }

    // Sends one request and returns the status code
    //
    // The response is dropped without reading the body.
    async fn send(&self, method: Method, url: &Url) -> Result<u16, reqwest::Error> {
        let response = self.client.request(method, url.clone()).send().await?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl LinkProber for HttpProber {
    async fn probe(&self, link: &str, base: &Url) -> Option<LinkProbeResult> {
        let Some(url) = resolve_link(link, base) else {
            tracing::warn!(parent: &self.span, link, "invalid link, skipping");
            return None;
        };

        let status = match self.send(Method::HEAD, &url).await {
            Ok(status) if status < 400 => Ok(status),
            head => {
                match &head {
                    Ok(status) => tracing::debug!(parent: &self.span, %url, status, "HEAD rejected, trying GET"),
                    Err(e) => tracing::debug!(parent: &self.span, %url, error = %e, "HEAD failed, trying GET"),
                }
                self.send(Method::GET, &url).await
            }
        };

        let result = match status {
            Ok(status_code) => LinkProbeResult {
                link: link.to_string(),
                resolved_url: url.to_string(),
                status_code,
                is_accessible: status_code < 400,
            },
            Err(e) => {
                tracing::debug!(parent: &self.span, %url, error = %e, "GET failed");
                LinkProbeResult {
                    link: link.to_string(),
                    resolved_url: url.to_string(),
                    status_code: 0,
                    is_accessible: false,
                }
            }
        };

        if result.is_accessible {
            tracing::debug!(parent: &self.span, link, status = result.status_code, "accessible link");
        } else {
            tracing::debug!(parent: &self.span, link, status = result.status_code, "inaccessible link");
        }

        Some(result)
    }
}

// Turns an href into an absolute URL we can send a request to
//
// Returns None (skip) for:
// - empty links and in-page anchors ("#section")
// - javascript: and mailto: links
// - anything that doesn't parse or resolve
//
// Examples:
//   base = "https://example.com/page"
//   "/docs"             -> https://example.com/docs
//   "../other"          -> https://example.com/other
//   "https://other.com" -> https://other.com/
pub fn resolve_link(link: &str, base: &Url) -> Option<Url> {
    if is_skipped(link) {
        return None;
    }

    if link.starts_with("http://") || link.starts_with("https://") {
        Url::parse(link).ok()
    } else {
        base.join(link).ok()
    }
}

// Links that are never probed or counted
pub fn is_skipped(link: &str) -> bool {
    link.is_empty()
        || link.starts_with('#')
        || link.starts_with("javascript:")
        || link.starts_with("mailto:")
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait (LinkProber) instead of calling HttpProber directly?
//    - The worker pool works with any prober
//    - Tests plug in a fake prober that sleeps or counts calls, no network
//
// 2. What does #[async_trait] do?
//    - Lets a trait have async fns and still be used as `dyn LinkProber`
//    - It boxes the returned future behind the scenes
//
// 3. Why is a tel: link probed at all?
//    - It is still a link on the page, so it must show up in the counts
//    - reqwest refuses non-HTTP schemes, which lands on the status 0 path
// -----------------------------------------------------------------------------
