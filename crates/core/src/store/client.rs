//! Object store client keyed by (bucket, key).

use bytes::Bytes;
use futures::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::config::{RetryConfig, S3Config, StoreBackend, StoreConfig};
use super::error::StoreError;
use super::types::{ObjectStat, StoreRef};

/// Which family of `object_store` backends this client builds per bucket.
enum Backend {
    S3(S3Config),
    Filesystem(PathBuf),
    /// In-process store for tests. Buckets are isolated maps.
    Memory,
}

/// Client for object storage, addressed by (bucket, key).
///
/// `object_store` binds a handle to a single bucket, so the client keeps a
/// lazily-built handle per bucket. Handles are cached for the life of the
/// client; the in-memory backend relies on this to keep seeded data visible
/// across calls.
pub struct StoreClient {
    backend: Backend,
    retry: RetryConfig,
    stores: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl StoreClient {
    /// Builds a client from configuration.
    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let backend = match config.backend {
            StoreBackend::S3 => {
                let s3 = config.s3.clone().ok_or_else(|| {
                    StoreError::Configuration("s3 backend selected but [store.s3] missing".into())
                })?;
                Backend::S3(s3)
            }
            StoreBackend::Filesystem => {
                let fs = config.filesystem.clone().ok_or_else(|| {
                    StoreError::Configuration(
                        "filesystem backend selected but [store.filesystem] missing".into(),
                    )
                })?;
                std::fs::create_dir_all(&fs.root)?;
                Backend::Filesystem(fs.root)
            }
        };

        Ok(Self {
            backend,
            retry: config.retry.clone(),
            stores: RwLock::new(HashMap::new()),
        })
    }

    /// In-memory client for tests.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory,
            retry: RetryConfig::default(),
            stores: RwLock::new(HashMap::new()),
        }
    }

    /// Retry policy configured for this store.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the cached handle for a bucket, building it on first use.
    async fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StoreError> {
        if bucket.is_empty() {
            return Err(StoreError::Configuration("empty bucket name".into()));
        }

        {
            let stores = self.stores.read().await;
            if let Some(store) = stores.get(bucket) {
                return Ok(Arc::clone(store));
            }
        }

        let mut stores = self.stores.write().await;
        // Another task may have built it while we waited for the write lock.
        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let store: Arc<dyn ObjectStore> = match &self.backend {
            Backend::S3(s3) => {
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = &s3.region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = &s3.endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if let Some(access_key_id) = &s3.access_key_id {
                    builder = builder.with_access_key_id(access_key_id);
                }
                if let Some(secret) = &s3.secret_access_key {
                    builder = builder.with_secret_access_key(secret);
                }
                if s3.allow_http {
                    builder = builder.with_allow_http(true);
                }
                Arc::new(
                    builder
                        .build()
                        .map_err(|e| StoreError::Configuration(e.to_string()))?,
                )
            }
            Backend::Filesystem(root) => {
                let dir = root.join(bucket);
                std::fs::create_dir_all(&dir)?;
                Arc::new(
                    LocalFileSystem::new_with_prefix(&dir)
                        .map_err(|e| StoreError::Configuration(e.to_string()))?,
                )
            }
            Backend::Memory => Arc::new(InMemory::new()),
        };

        stores.insert(bucket.to_string(), Arc::clone(&store));
        debug!(bucket, "object store handle created");
        Ok(store)
    }

    fn object_path(location: &StoreRef) -> Result<ObjectPath, StoreError> {
        ObjectPath::parse(&location.key).map_err(|e| StoreError::InvalidLocation {
            location: location.clone(),
            reason: e.to_string(),
        })
    }

    /// Probes object metadata without downloading the payload.
    pub async fn stat(&self, location: &StoreRef) -> Result<ObjectStat, StoreError> {
        let store = self.store_for(&location.bucket).await?;
        let path = Self::object_path(location)?;
        let meta = store
            .head(&path)
            .await
            .map_err(|e| StoreError::classify(location, e))?;
        Ok(ObjectStat {
            size_bytes: meta.size,
        })
    }

    /// Reads the full object into memory.
    pub async fn get_bytes(&self, location: &StoreRef) -> Result<Bytes, StoreError> {
        let store = self.store_for(&location.bucket).await?;
        let path = Self::object_path(location)?;
        let result = store
            .get(&path)
            .await
            .map_err(|e| StoreError::classify(location, e))?;
        result
            .bytes()
            .await
            .map_err(|e| StoreError::classify(location, e))
    }

    /// Downloads an object to a local file. Returns the byte count.
    pub async fn download(&self, location: &StoreRef, dest: &Path) -> Result<u64, StoreError> {
        let bytes = self.get_bytes(location).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        debug!(location = %location, dest = %dest.display(), size_bytes = bytes.len(), "object downloaded");
        Ok(bytes.len() as u64)
    }

    /// Writes bytes to an object, replacing any existing content.
    pub async fn put_bytes(&self, location: &StoreRef, data: Bytes) -> Result<(), StoreError> {
        let store = self.store_for(&location.bucket).await?;
        let path = Self::object_path(location)?;
        store
            .put(&path, data.into())
            .await
            .map_err(|e| StoreError::classify(location, e))?;
        Ok(())
    }

    /// Uploads a local file to an object.
    pub async fn upload_file(&self, src: &Path, location: &StoreRef) -> Result<(), StoreError> {
        let data = tokio::fs::read(src).await?;
        let size_bytes = data.len();
        self.put_bytes(location, Bytes::from(data)).await?;
        debug!(location = %location, size_bytes, "object uploaded");
        Ok(())
    }

    /// Lists object keys under a prefix, sorted.
    pub async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let store = self.store_for(bucket).await?;
        let location = StoreRef::new(bucket, prefix);
        let prefix_path = if prefix.is_empty() {
            None
        } else {
            Some(Self::object_path(&location)?)
        };

        let mut stream = store.list(prefix_path.as_ref());
        let mut keys = Vec::new();
        while let Some(entry) = stream.next().await {
            let meta = entry.map_err(|e| StoreError::classify(&location, e))?;
            keys.push(meta.location.to_string());
        }
        keys.sort();
        Ok(keys)
    }
}
