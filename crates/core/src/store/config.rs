//! Configuration for the store module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Object store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Storage backend type.
    pub backend: StoreBackend,

    /// S3 settings (required when backend = "s3").
    #[serde(default)]
    pub s3: Option<S3Config>,

    /// Local filesystem settings (required when backend = "filesystem").
    #[serde(default)]
    pub filesystem: Option<FilesystemConfig>,

    /// Retry policy for transient store errors.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Available storage backends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    S3,
    Filesystem,
}

/// S3 backend configuration.
///
/// Credentials left unset fall back to the ambient AWS credential chain
/// (instance role, env vars), which is what production deployments use.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct S3Config {
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint for MinIO/LocalStack style deployments.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Allow plain-http endpoints (local development only).
    #[serde(default)]
    pub allow_http: bool,
}

/// Filesystem backend configuration. Each bucket becomes a directory
/// under the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesystemConfig {
    pub root: PathBuf,
}

/// Retry policy for transient store errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Ceiling on the backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Backoff delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> std::time::Duration {
        let exp = attempt.saturating_sub(1);
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exp as i32);
        std::time::Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}
