//! Core job data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::store::StoreRef;

/// Possible states of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Whether the job has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job identity, unique per tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub tenant_id: String,
    pub job_id: String,
}

impl JobKey {
    pub fn new(tenant_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            job_id: job_id.into(),
        }
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.job_id)
    }
}

/// Terminal error recorded on a failed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobError {
    pub code: String,
    pub message: String,
}

impl JobError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// A conversion job as tracked by the registry.
#[derive(Debug, Clone)]
pub struct Job {
    pub key: JobKey,
    /// Input object location.
    pub input: StoreRef,
    /// Output location; the key is a prefix under which pages and the
    /// manifest are published.
    pub output: StoreRef,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Present once the job succeeded.
    pub page_count: Option<u32>,
    /// Present iff the job failed.
    pub error: Option<JobError>,
    /// Manifest location, present iff the job is terminal.
    pub manifest: Option<StoreRef>,
}

/// Request to register a new job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub key: JobKey,
    pub input: StoreRef,
    pub output: StoreRef,
}
