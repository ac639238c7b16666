use crate::store::StoreBackend;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - The selected store backend has its settings section
/// - Pipeline and retry bounds are at least 1
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Store validation
    match config.store.backend {
        StoreBackend::S3 => {
            if config.store.s3.is_none() {
                return Err(ConfigError::ValidationError(
                    "store.backend is \"s3\" but [store.s3] is missing".to_string(),
                ));
            }
        }
        StoreBackend::Filesystem => {
            if config.store.filesystem.is_none() {
                return Err(ConfigError::ValidationError(
                    "store.backend is \"filesystem\" but [store.filesystem] is missing"
                        .to_string(),
                ));
            }
        }
    }

    if config.store.retry.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "store.retry.max_attempts must be at least 1".to_string(),
        ));
    }

    // Pipeline validation
    if config.pipeline.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.concurrency must be at least 1".to_string(),
        ));
    }

    if config.pipeline.max_input_size_mb == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_input_size_mb must be at least 1".to_string(),
        ));
    }

    if config.converter.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "converter.timeout_secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}
