//! Core store location types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (bucket, key) object location.
///
/// The key is either a full object key or a key prefix, depending on
/// context. This is the canonical location type used on the wire and in
/// manifests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreRef {
    pub bucket: String,
    pub key: String,
}

impl StoreRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Returns a location with the same bucket and a different key.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            bucket: self.bucket.clone(),
            key: key.into(),
        }
    }
}

impl fmt::Display for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Object metadata from a `head` probe.
#[derive(Debug, Clone)]
pub struct ObjectStat {
    pub size_bytes: u64,
}
