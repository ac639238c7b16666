//! Pipeline error taxonomy.

use thiserror::Error;

use crate::converter::ConverterError;
use crate::registry::JobError;
use crate::store::{StoreError, StoreRef};

/// Errors that fail a job during pipeline execution.
///
/// Every variant maps to a stable error code recorded in the registry and
/// the failure manifest; nothing propagates past the pipeline as a raw
/// fault.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The job record is malformed.
    #[error("invalid job: {reason}")]
    Validation { reason: String },

    /// The input object exceeds the configured size limit.
    #[error("input is {size_bytes} bytes, limit is {max_bytes} bytes")]
    InputTooLarge { size_bytes: u64, max_bytes: u64 },

    /// The input object does not exist.
    #[error("input object not found: {location}")]
    InputNotFound { location: StoreRef },

    /// The store rejected access to an object.
    #[error("store access denied: {location}")]
    AccessDenied { location: StoreRef },

    /// A store operation kept failing after bounded retries.
    #[error("store unavailable during {op}: {source}")]
    StoreUnavailable {
        op: &'static str,
        #[source]
        source: StoreError,
    },

    /// The rendering step failed.
    #[error(transparent)]
    Conversion(#[from] ConverterError),

    /// Unexpected fault in the pipeline itself.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl PipelineError {
    /// Maps a store error from the given operation into a job failure.
    pub fn from_store(op: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::NotFound { location } => Self::InputNotFound { location },
            StoreError::AccessDenied { location } => Self::AccessDenied { location },
            StoreError::InvalidLocation { location, reason } => Self::Validation {
                reason: format!("unusable store location {location}: {reason}"),
            },
            StoreError::Configuration(reason) => Self::Internal { reason },
            other => Self::StoreUnavailable { op, source: other },
        }
    }

    /// Stable error code for manifests and status responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "INVALID_JOB",
            Self::InputTooLarge { .. } => "FILE_TOO_LARGE",
            Self::InputNotFound { .. } => "OBJECT_NOT_FOUND",
            Self::AccessDenied { .. } => "ACCESS_DENIED",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            Self::Conversion(err) => match err {
                ConverterError::Timeout { .. } => "CONVERSION_TIMEOUT",
                ConverterError::EmptyDocument => "EMPTY_DOCUMENT",
                ConverterError::SplitFailed { .. } => "SPLIT_FAILED",
                _ => "CONVERSION_FAILED",
            },
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// The terminal error recorded on the job.
    pub fn to_job_error(&self) -> JobError {
        let message = match self {
            Self::Conversion(err) => err.detail(),
            other => other.to_string(),
        };
        JobError::new(self.code(), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_code() {
        let err = PipelineError::Conversion(ConverterError::Timeout { timeout_secs: 180 });
        assert_eq!(err.code(), "CONVERSION_TIMEOUT");
    }

    #[test]
    fn test_not_found_mapping() {
        let err = PipelineError::from_store(
            "head",
            StoreError::NotFound {
                location: StoreRef::new("b", "k"),
            },
        );
        assert_eq!(err.code(), "OBJECT_NOT_FOUND");
    }

    #[test]
    fn test_transient_exhaustion_mapping() {
        let err = PipelineError::from_store(
            "put",
            StoreError::Unavailable {
                location: StoreRef::new("b", "k"),
                source: object_store::Error::Generic {
                    store: "test",
                    source: "throttled".into(),
                },
            },
        );
        assert_eq!(err.code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_job_error_carries_engine_diagnostic() {
        let err = PipelineError::Conversion(ConverterError::render_failed(
            "soffice exited with code 1",
            Some("Error: corrupt zip".to_string()),
        ));
        let job_error = err.to_job_error();
        assert_eq!(job_error.code, "CONVERSION_FAILED");
        assert!(job_error.message.contains("corrupt zip"));
    }
}
