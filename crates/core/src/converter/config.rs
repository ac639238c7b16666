//! Configuration for the converter module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the LibreOffice converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the soffice binary.
    #[serde(default = "default_soffice_path")]
    pub soffice_path: PathBuf,

    /// Hard wall-clock deadline for a single render, in seconds. The
    /// engine process is killed when it elapses.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_soffice_path() -> PathBuf {
    PathBuf::from("soffice")
}

fn default_timeout_secs() -> u64 {
    180
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            soffice_path: default_soffice_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
