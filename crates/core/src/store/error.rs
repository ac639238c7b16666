//! Error types for object store operations.

use thiserror::Error;

use super::types::StoreRef;

/// Errors that can occur talking to the object store.
///
/// Variants are classified as transient (retrying may succeed) or
/// permanent (retrying cannot change the outcome); see
/// [`StoreError::is_transient`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The object does not exist.
    #[error("object not found: {location}")]
    NotFound { location: StoreRef },

    /// The caller is not allowed to access the object.
    #[error("access denied: {location}")]
    AccessDenied { location: StoreRef },

    /// The bucket or key cannot be used with this backend.
    #[error("invalid store location {location}: {reason}")]
    InvalidLocation { location: StoreRef, reason: String },

    /// The request failed in a way that may succeed on a later attempt
    /// (network faults, 5xx responses, throttling).
    #[error("store request failed for {location}: {source}")]
    Unavailable {
        location: StoreRef,
        #[source]
        source: object_store::Error,
    },

    /// The store client is misconfigured.
    #[error("store configuration error: {0}")]
    Configuration(String),

    /// Local filesystem I/O while staging an object.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Classifies an `object_store` error for a given location.
    pub fn classify(location: &StoreRef, source: object_store::Error) -> Self {
        match source {
            object_store::Error::NotFound { .. } => Self::NotFound {
                location: location.clone(),
            },
            object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. } => Self::AccessDenied {
                location: location.clone(),
            },
            object_store::Error::InvalidPath { source } => Self::InvalidLocation {
                location: location.clone(),
                reason: source.to_string(),
            },
            object_store::Error::NotSupported { source } => Self::InvalidLocation {
                location: location.clone(),
                reason: source.to_string(),
            },
            other => Self::Unavailable {
                location: location.clone(),
                source: other,
            },
        }
    }

    /// Whether retrying the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> StoreRef {
        StoreRef::new("bucket", "key")
    }

    #[test]
    fn test_not_found_is_permanent() {
        let err = StoreError::classify(
            &loc(),
            object_store::Error::NotFound {
                path: "key".to_string(),
                source: "gone".into(),
            },
        );
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_generic_is_transient() {
        let err = StoreError::classify(
            &loc(),
            object_store::Error::Generic {
                store: "S3",
                source: "connection reset".into(),
            },
        );
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert!(err.is_transient());
    }
}
