//! Job API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use slidepress_core::metrics::JOBS_SUBMITTED;
use slidepress_core::{JobKey, JobStatus, NewJob, RegisterOutcome, StoreRef};

use crate::state::AppState;

/// Longest accepted tenant or job identifier.
const MAX_ID_LENGTH: usize = 256;

/// Longest accepted object key or key prefix.
const MAX_KEY_LENGTH: usize = 1024;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for POST /v1/jobs
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobBody {
    /// Tenant identifier
    pub tenant_id: String,
    /// Job identifier, unique per tenant
    pub job_id: String,
    /// Location of the input document
    pub input: LocationBody,
    /// Output location; the key is used as a key prefix
    pub output: LocationBody,
}

/// Bucket and key in request bodies
#[derive(Debug, Deserialize)]
pub struct LocationBody {
    pub bucket: String,
    pub key: String,
}

/// Response for POST /v1/jobs
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobResponse {
    pub job_id: String,
    pub status: JobStatus,
}

/// Response for GET /v1/jobs/{jobId}
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJobResponse {
    pub job_id: String,
    pub user_id: String,
    pub status: JobStatus,
    /// Manifest location, present once the job is terminal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<StoreRef>,
}

/// Query parameters for GET /v1/jobs/{jobId}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetJobParams {
    pub tenant_id: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
    pub code: String,
}

fn bad_request(reason: String) -> (StatusCode, Json<JobErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(JobErrorResponse {
            error: reason,
            code: "INVALID_REQUEST".to_string(),
        }),
    )
}

fn not_found(job_id: &str) -> (StatusCode, Json<JobErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(JobErrorResponse {
            error: format!("Job not found: {job_id}"),
            code: "NOT_FOUND".to_string(),
        }),
    )
}

// ============================================================================
// Validation
// ============================================================================

fn validate_id(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.len() > MAX_ID_LENGTH {
        return Err(format!("{field} exceeds {MAX_ID_LENGTH} characters"));
    }
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(format!("{field} contains invalid characters"));
    }
    Ok(())
}

fn validate_location(field: &str, location: &LocationBody) -> Result<(), String> {
    if location.bucket.is_empty() {
        return Err(format!("{field}.bucket must not be empty"));
    }
    if location.key.is_empty() {
        return Err(format!("{field}.key must not be empty"));
    }
    if location.key.len() > MAX_KEY_LENGTH {
        return Err(format!("{field}.key exceeds {MAX_KEY_LENGTH} characters"));
    }
    if location.key.starts_with('/') {
        return Err(format!("{field}.key must not start with '/'"));
    }
    Ok(())
}

fn validate_body(body: &CreateJobBody) -> Result<(), String> {
    validate_id("tenantId", &body.tenant_id)?;
    validate_id("jobId", &body.job_id)?;
    validate_location("input", &body.input)?;
    validate_location("output", &body.output)?;
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a conversion job.
///
/// Registration is idempotent on (tenantId, jobId): a fresh identity is
/// queued and acknowledged with 202, a resubmission returns the existing
/// status with 200 and never starts a second execution. Malformed requests
/// are rejected synchronously and never consume an execution slot.
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Result<(StatusCode, Json<CreateJobResponse>), (StatusCode, Json<JobErrorResponse>)> {
    if let Err(reason) = validate_body(&body) {
        return Err(bad_request(reason));
    }

    let key = JobKey::new(&body.tenant_id, &body.job_id);
    let outcome = state
        .registry()
        .register(NewJob {
            key: key.clone(),
            input: StoreRef::new(&body.input.bucket, &body.input.key),
            output: StoreRef::new(&body.output.bucket, &body.output.key),
        })
        .await;

    match outcome {
        RegisterOutcome::Created(job) => {
            JOBS_SUBMITTED.inc();
            state.scheduler().enqueue(key);
            Ok((
                StatusCode::ACCEPTED,
                Json(CreateJobResponse {
                    job_id: job.key.job_id,
                    status: job.status,
                }),
            ))
        }
        RegisterOutcome::AlreadyExists(job) => Ok((
            StatusCode::OK,
            Json(CreateJobResponse {
                job_id: job.key.job_id,
                status: job.status,
            }),
        )),
    }
}

/// Get the status of a conversion job.
///
/// A tenant mismatch is indistinguishable from an unknown job id, so no
/// tenant can enumerate another tenant's jobs by guessing ids. The manifest
/// location appears once the job is terminal; callers resolve the manifest
/// object themselves for full detail.
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
    Query(params): Query<GetJobParams>,
) -> Result<Json<GetJobResponse>, (StatusCode, Json<JobErrorResponse>)> {
    match state.registry().get(&params.tenant_id, &job_id).await {
        Some(job) => {
            let manifest = if job.status.is_terminal() {
                job.manifest
            } else {
                None
            };
            Ok(Json(GetJobResponse {
                job_id: job.key.job_id,
                user_id: job.key.tenant_id,
                status: job.status,
                manifest,
            }))
        }
        None => Err(not_found(&job_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_body() -> CreateJobBody {
        CreateJobBody {
            tenant_id: "acme".to_string(),
            job_id: "job-1".to_string(),
            input: LocationBody {
                bucket: "decks".to_string(),
                key: "acme/deck.pptx".to_string(),
            },
            output: LocationBody {
                bucket: "conversions".to_string(),
                key: "jobs/job-1/".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_body_passes() {
        assert!(validate_body(&valid_body()).is_ok());
    }

    #[test]
    fn test_empty_tenant_rejected() {
        let mut body = valid_body();
        body.tenant_id = String::new();
        let err = validate_body(&body).unwrap_err();
        assert!(err.contains("tenantId"));
    }

    #[test]
    fn test_job_id_with_slash_rejected() {
        let mut body = valid_body();
        body.job_id = "a/b".to_string();
        assert!(validate_body(&body).is_err());
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let mut body = valid_body();
        body.input.bucket = String::new();
        let err = validate_body(&body).unwrap_err();
        assert!(err.contains("input.bucket"));
    }

    #[test]
    fn test_absolute_key_rejected() {
        let mut body = valid_body();
        body.output.key = "/jobs/job-1/".to_string();
        let err = validate_body(&body).unwrap_err();
        assert!(err.contains("output.key"));
    }

    #[test]
    fn test_oversized_id_rejected() {
        let mut body = valid_body();
        body.job_id = "x".repeat(MAX_ID_LENGTH + 1);
        assert!(validate_body(&body).is_err());
    }
}
