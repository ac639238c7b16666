//! Configuration for the pipeline module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum concurrent job executions. The rendering engine misbehaves
    /// under internal concurrency, so this is a hard ceiling.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Maximum input object size in megabytes, probed before download.
    #[serde(default = "default_max_input_size_mb")]
    pub max_input_size_mb: u64,

    /// Scratch directory for per-job working directories.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

fn default_concurrency() -> usize {
    1
}

fn default_max_input_size_mb() -> u64 {
    100
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("slidepress")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_input_size_mb: default_max_input_size_mb(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl PipelineConfig {
    /// Maximum input size in bytes.
    pub fn max_input_size_bytes(&self) -> u64 {
        self.max_input_size_mb * 1024 * 1024
    }

    /// Sets the scratch directory.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = dir;
        self
    }

    /// Sets the input size limit.
    pub fn with_max_input_size_mb(mut self, mb: u64) -> Self {
        self.max_input_size_mb = mb;
        self
    }
}
