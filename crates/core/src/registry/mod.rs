//! In-memory job registry.
//!
//! Single source of truth for job state. Jobs live for the life of the
//! process; a restart loses in-flight state by design and clients are
//! expected to resubmit.

mod types;

pub use types::{Job, JobError, JobKey, JobStatus, NewJob};

use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::store::StoreRef;

/// Error type for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Job not found.
    #[error("job not found: {0}")]
    NotFound(String),

    /// Transition violates the queued -> running -> terminal ordering.
    #[error("cannot move job {job} from {from} to {to}")]
    InvalidTransition {
        job: String,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Outcome of a register call.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    /// The job was created in queued state.
    Created(Job),
    /// A job with this identity already exists; its current record is
    /// returned unchanged. This is what makes duplicate submissions safe.
    AlreadyExists(Job),
}

/// A state transition applied by the worker owning the job.
#[derive(Debug, Clone)]
pub enum Transition {
    Running,
    Succeeded { page_count: u32, manifest: StoreRef },
    Failed { error: JobError, manifest: StoreRef },
}

impl Transition {
    fn target_status(&self) -> JobStatus {
        match self {
            Self::Running => JobStatus::Running,
            Self::Succeeded { .. } => JobStatus::Succeeded,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Concurrency-safe in-memory map of job identity to job state.
///
/// Reads never observe a partially written record; writers hold the map
/// lock for the duration of each mutation. The scheduler guarantees a
/// single writer per job, so no per-job locking is needed.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobKey, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job, or returns the existing record for its identity.
    pub async fn register(&self, new_job: NewJob) -> RegisterOutcome {
        let mut jobs = self.jobs.write().await;
        if let Some(existing) = jobs.get(&new_job.key) {
            info!(job = %new_job.key, status = %existing.status, "job already exists");
            return RegisterOutcome::AlreadyExists(existing.clone());
        }

        let job = Job {
            key: new_job.key.clone(),
            input: new_job.input,
            output: new_job.output,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            page_count: None,
            error: None,
            manifest: None,
        };
        jobs.insert(new_job.key.clone(), job.clone());
        info!(job = %new_job.key, "job registered");
        RegisterOutcome::Created(job)
    }

    /// Returns a snapshot of the job, if the identity matches.
    pub async fn get(&self, tenant_id: &str, job_id: &str) -> Option<Job> {
        let key = JobKey::new(tenant_id, job_id);
        self.jobs.read().await.get(&key).cloned()
    }

    /// Applies a state transition and returns the updated record.
    ///
    /// Transitions are monotonic: queued -> running -> terminal. Anything
    /// else, including any transition out of a terminal state, is rejected.
    pub async fn transition(
        &self,
        key: &JobKey,
        transition: Transition,
    ) -> Result<Job, RegistryError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;

        let target = transition.target_status();
        let allowed = match (job.status, target) {
            (JobStatus::Queued, JobStatus::Running) => true,
            (JobStatus::Running, JobStatus::Succeeded) => true,
            (JobStatus::Running, JobStatus::Failed) => true,
            _ => false,
        };
        if !allowed {
            return Err(RegistryError::InvalidTransition {
                job: key.to_string(),
                from: job.status,
                to: target,
            });
        }

        let old_status = job.status;
        job.status = target;
        match transition {
            Transition::Running => {
                job.started_at = Some(Utc::now());
            }
            Transition::Succeeded {
                page_count,
                manifest,
            } => {
                job.finished_at = Some(Utc::now());
                job.page_count = Some(page_count);
                job.manifest = Some(manifest);
            }
            Transition::Failed { error, manifest } => {
                job.finished_at = Some(Utc::now());
                job.error = Some(error);
                job.manifest = Some(manifest);
            }
        }

        info!(job = %key, from = %old_status, to = %job.status, "job status updated");
        Ok(job.clone())
    }

    /// Number of jobs currently in running state.
    pub async fn running_count(&self) -> usize {
        self.jobs
            .read()
            .await
            .values()
            .filter(|j| j.status == JobStatus::Running)
            .count()
    }
}
