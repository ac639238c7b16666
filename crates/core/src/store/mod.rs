//! Object store access for job inputs and published outputs.
//!
//! Wraps the `object_store` backends (S3, local filesystem, in-memory for
//! tests) behind a (bucket, key) API with transient/permanent error
//! classification and bounded retries.

mod client;
mod config;
mod error;
mod retry;
mod types;

pub use client::StoreClient;
pub use config::{FilesystemConfig, RetryConfig, S3Config, StoreBackend, StoreConfig};
pub use error::StoreError;
pub use retry::with_retry;
pub use types::{ObjectStat, StoreRef};
