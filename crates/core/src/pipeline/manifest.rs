//! Manifest objects published to the store.
//!
//! The manifest is uploaded only after every page object exists, so its
//! presence at `{outputKeyPrefix}manifest.json` is the single atomic signal
//! that a job is done. Consumers polling the store directly can rely on it
//! without racing partially staged pages.

use serde::{Deserialize, Serialize};

use crate::registry::{Job, JobError};

/// One page reference inside a success manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// 1-based page number, contiguous from 1 in slide order.
    pub page: u32,
    /// Full object key of the page PDF.
    pub key: String,
}

/// Manifest written on successful conversion. Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessManifest {
    pub job_id: String,
    /// Tenant identity; the field name is kept for wire compatibility.
    pub user_id: String,
    pub status: String,
    pub page_count: u32,
    pub pages: Vec<PageEntry>,
}

impl SuccessManifest {
    pub fn new(job: &Job, pages: Vec<PageEntry>) -> Self {
        Self {
            job_id: job.key.job_id.clone(),
            user_id: job.key.tenant_id.clone(),
            status: "succeeded".to_string(),
            page_count: pages.len() as u32,
            pages,
        }
    }
}

/// Error information in a failure manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

/// Manifest written on failed conversion. Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureManifest {
    pub job_id: String,
    pub user_id: String,
    pub status: String,
    pub error: ErrorInfo,
}

impl FailureManifest {
    pub fn new(job: &Job, error: &JobError) -> Self {
        Self {
            job_id: job.key.job_id.clone(),
            user_id: job.key.tenant_id.clone(),
            status: "failed".to_string(),
            error: ErrorInfo {
                code: error.code.clone(),
                message: error.message.clone(),
            },
        }
    }
}

/// Normalises an output key prefix so key composition is unambiguous: a
/// non-empty prefix always ends with `/`.
fn normalized_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{prefix}/")
    }
}

/// Object key for page `page` (1-based) under an output prefix.
pub fn page_key(prefix: &str, page: u32) -> String {
    format!("{}pages/{page:04}.pdf", normalized_prefix(prefix))
}

/// Object key for the manifest under an output prefix.
pub fn manifest_key(prefix: &str) -> String {
    format!("{}manifest.json", normalized_prefix(prefix))
}
