/// Object storage
///
/// Stores raw file bytes and issues time-limited retrieval URLs.
/// Supports multiple backend implementations (S3-compatible, in-memory).
pub mod memory;
pub mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use crate::config::ObjectBackendConfig;
use crate::error::ApiResult;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// A collaborator-issued URL granting temporary direct read access
#[derive(Debug, Clone, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub expires_in: u64,
}

/// Object storage backend trait
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under a key
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> ApiResult<()>;

    /// Issue a time-limited retrieval URL for a stored object
    async fn signed_url(&self, key: &str, expires_in: u64) -> ApiResult<SignedUrl>;

    /// Delete an object by key
    async fn delete(&self, key: &str) -> ApiResult<()>;
}

/// Construct the configured backend
pub async fn from_config(backend: &ObjectBackendConfig) -> ApiResult<Arc<dyn ObjectStore>> {
    match backend {
        ObjectBackendConfig::S3 {
            bucket,
            region,
            access_key_id,
            secret_access_key,
            endpoint,
        } => {
            let store = S3ObjectStore::new(s3::S3Config {
                bucket: bucket.clone(),
                region: region.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                endpoint: endpoint.clone(),
            })
            .await?;
            Ok(Arc::new(store))
        }
        ObjectBackendConfig::Memory => {
            tracing::info!("Using in-memory object store; objects are not persisted");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
    }
}
