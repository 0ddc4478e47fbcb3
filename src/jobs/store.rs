// src/jobs/store.rs
// =============================================================================
// Persistence seam for analysis jobs.
//
// The analyzer only talks to the JobRepository trait. The in-memory
// implementation below guards its map with an RwLock: the background
// pipeline writes a job while a polling caller may be reading it.
//
// Stores hand out clones; nobody outside the store touches the map.
// =============================================================================

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::Span;
use uuid::Uuid;

use super::model::AnalysisJob;
use crate::error::StoreError;

/// Storage for analysis jobs.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Stores a new job, assigns it an id and returns that id.
    async fn save(&self, job: AnalysisJob) -> Result<Uuid, StoreError>;

    /// Returns a copy of the job, or `None` if the id is unknown.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<AnalysisJob>, StoreError>;

    /// Replaces an existing job. Unknown ids fail with `StoreError::NotFound`.
    async fn update(&self, job: AnalysisJob) -> Result<Uuid, StoreError>;
}

/// Process-local job store.
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<Uuid, AnalysisJob>>,
    span: Span,
}

impl InMemoryJobRepository {
    pub fn new(span: Span) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            span,
        }
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn save(&self, mut job: AnalysisJob) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        job.id = id;
        self.jobs.write().await.insert(id, job);
        tracing::debug!(parent: &self.span, job_id = %id, "job saved");
        Ok(id)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<AnalysisJob>, StoreError> {
        Ok(self.jobs.read().await.get(&id).cloned())
    }

    async fn update(&self, mut job: AnalysisJob) -> Result<Uuid, StoreError> {
        let mut jobs = self.jobs.write().await;
        let slot = jobs.get_mut(&job.id).ok_or(StoreError::NotFound(job.id))?;
        job.updated_at = Some(Utc::now());
        let id = job.id;
        *slot = job;
        tracing::debug!(parent: &self.span, job_id = %id, "job updated");
        Ok(id)
    }
}
