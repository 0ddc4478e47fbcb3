// src/jobs/service.rs
// =============================================================================
// The analysis job orchestrator.
//
// Lifecycle of a job:
//
//   analyze_website(url)
//     └─► save pending record ─► return id   (caller never waits past here)
//           └─► background pipeline (one task per job, bounded slots)
//                 1. re-read the record
//                 2. GET the page          ── failure ─► failed + description
//                 3. parse + extract       ── failure ─► failed + description
//                 4. check links (worker pool)
//                 5. write success
//
//   get_analyze_data(id)  ─► current record, pending or terminal
//
// A job gets exactly one terminal write. Nothing moves it out of success or
// failed afterwards: every status write re-reads the job and checks it while
// holding the transition lock, so two writers can't both see it pending.
//
// Pipelines run under an application-level cancellation token, not the
// caller's: a submitter going away doesn't stop its job, shutdown() does.
// =============================================================================

use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span};
use url::Url;
use uuid::Uuid;

use super::model::{AnalysisJob, AnalysisReport, JobStatus};
use super::store::JobRepository;
use crate::checker::{extract_features, LinkChecker, LinkProber};
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::page::PageFetcher;

/// Submits analyses and answers status queries. Cheap to clone.
#[derive(Clone)]
pub struct WebAnalyzer {
    inner: Arc<Inner>,
}

struct Inner {
    repo: Arc<dyn JobRepository>,
    fetcher: PageFetcher,
    checker: LinkChecker,
    config: AnalyzerConfig,
    /// One permit per concurrently running pipeline
    slots: Arc<Semaphore>,
    /// Held across read, check and write of any status change
    transitions: Mutex<()>,
    tasks: TaskTracker,
    shutdown: CancellationToken,
    span: Span,
}

impl WebAnalyzer {
    pub fn new(
        config: AnalyzerConfig,
        repo: Arc<dyn JobRepository>,
        prober: Arc<dyn LinkProber>,
        span: Span,
    ) -> Result<Self, AnalyzerError> {
        let fetcher = PageFetcher::new(&config)?;
        let checker = LinkChecker::new(
            prober,
            config.max_link_workers,
            tracing::info_span!(parent: &span, "link_checker"),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                repo,
                fetcher,
                checker,
                slots: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
                config,
                transitions: Mutex::new(()),
                tasks: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                span,
            }),
        })
    }

    /// Creates a pending job for `url` and starts analyzing it in the
    /// background. Returns as soon as the pending record is stored.
    ///
    /// `url` must already be an absolute http(s) URL; nothing is validated here.
    pub async fn analyze_website(&self, url: &Url) -> Result<Uuid, AnalyzerError> {
        let inner = &self.inner;
        if inner.shutdown.is_cancelled() {
            return Err(AnalyzerError::Internal(
                "analyzer is shutting down".to_string(),
            ));
        }

        let id = inner
            .repo
            .save(AnalysisJob::pending(url.as_str()))
            .await
            .map_err(|e| {
                tracing::error!(parent: &inner.span, error = %e, "failed to save initial analysis");
                AnalyzerError::store("Failed to initialize analysis", e)
            })?;

        let pipeline_span = tracing::info_span!(parent: &inner.span, "analysis", job_id = %id, url = %url);
        inner
            .tasks
            .spawn(Arc::clone(inner).run_pipeline(id, url.clone()).instrument(pipeline_span));

        Ok(id)
    }

    /// Returns the current state of a job, pending or finished.
    pub async fn get_analyze_data(&self, id: Uuid) -> Result<AnalysisReport, AnalyzerError> {
        let inner = &self.inner;
        match inner.repo.get_by_id(id).await {
            Ok(Some(job)) => Ok(job.to_report()),
            Ok(None) => {
                tracing::warn!(parent: &inner.span, job_id = %id, "analysis result not found");
                Err(AnalyzerError::NotFound(id))
            }
            Err(e) => {
                tracing::error!(parent: &inner.span, job_id = %id, error = %e, "failed to get analysis data");
                Err(AnalyzerError::store("Failed to get analysis data", e))
            }
        }
    }

    /// Best-effort status change. Failures are logged and dropped, and a job
    /// that already finished is left alone.
    pub async fn update_analysis_status(
        &self,
        id: Uuid,
        status: JobStatus,
        error_description: Option<&str>,
    ) {
        self.inner.update_status(id, status, error_description).await;
    }

    /// Stops accepting work, cancels page fetches and link checks in flight
    /// and waits for every pipeline to write its final state.
    pub async fn shutdown(&self) {
        let inner = &self.inner;
        tracing::info!(parent: &inner.span, running = inner.tasks.len(), "shutting down analyzer");
        inner.shutdown.cancel();
        inner.tasks.close();
        inner.tasks.wait().await;
    }
}

impl Inner {
    async fn run_pipeline(self: Arc<Self>, id: Uuid, url: Url) {
        let _slot = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                let description = AnalyzerError::Cancelled.to_string();
                self.update_status(id, JobStatus::Failed, Some(&description)).await;
                return;
            }
            permit = Arc::clone(&self.slots).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(e) => {
                    self.update_status(id, JobStatus::Failed, Some(&e.to_string())).await;
                    return;
                }
            },
        };

        tracing::info!("starting background analysis");

        match self.analyze(id, &url).await {
            Ok(job) => {
                self.finish(job).await;
                tracing::info!("background analysis completed");
            }
            Err(e) => {
                tracing::error!(error = %e, "background analysis failed");
                self.update_status(id, JobStatus::Failed, Some(&e.to_string())).await;
            }
        }
    }

    // Steps 1-4 of the pipeline; returns the populated record
    async fn analyze(&self, id: Uuid, url: &Url) -> Result<AnalysisJob, AnalyzerError> {
        let mut job = self
            .repo
            .get_by_id(id)
            .await
            .map_err(|e| AnalyzerError::store("Failed to get analysis data", e))?
            .ok_or(AnalyzerError::NotFound(id))?;

        let body = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return Err(AnalyzerError::Cancelled),
            body = self.fetcher.fetch_page(url) => body?,
        };

        // The parsed tree is dropped inside extract_features, before any await
        let features = extract_features(&body);
        drop(body);

        let link_cancel = self.shutdown.child_token();
        let deadline = self.config.link_check_deadline.map(|limit| {
            let token = link_cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                token.cancel();
            })
        });

        let links = self
            .checker
            .check_links(features.links, url, link_cancel)
            .await;

        if let Some(timer) = deadline {
            timer.abort();
        }

        if self.shutdown.is_cancelled() {
            return Err(AnalyzerError::Cancelled);
        }

        job.html_version = features.html_version;
        job.title = features.title;
        job.headings = features.headings;
        job.has_login_form = features.has_login_form;
        job.links = links;
        job.status = JobStatus::Success;

        Ok(job)
    }

    // Step 5: the success write, only if the job is still pending
    async fn finish(&self, job: AnalysisJob) {
        let _transition = self.transitions.lock().await;
        match self.repo.get_by_id(job.id).await {
            Ok(Some(current)) if current.status.is_terminal() => {
                tracing::warn!(status = %current.status, "job already finished, dropping result");
                return;
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                tracing::warn!("job disappeared before result was written");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to re-read job before writing result");
                return;
            }
        }

        if let Err(e) = self.repo.update(job).await {
            tracing::error!(error = %e, "failed to update analysis result");
        }
    }

    async fn update_status(&self, id: Uuid, status: JobStatus, error_description: Option<&str>) {
        let _transition = self.transitions.lock().await;
        let mut job = match self.repo.get_by_id(id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tracing::warn!(parent: &self.span, job_id = %id, "analysis not found for update");
                return;
            }
            Err(e) => {
                tracing::error!(parent: &self.span, job_id = %id, error = %e, "failed to get analysis data");
                return;
            }
        };

        if job.status.is_terminal() {
            tracing::warn!(
                parent: &self.span,
                job_id = %id,
                current = %job.status,
                requested = %status,
                "ignoring status change for finished analysis"
            );
            return;
        }

        job.status = status;
        if let Some(description) = error_description.filter(|d| !d.is_empty()) {
            job.error_description = Some(description.to_string());
        }

        if let Err(e) = self.repo.update(job).await {
            tracing::error!(parent: &self.span, job_id = %id, error = %e, "failed to update analysis status");
        }
    }
}
