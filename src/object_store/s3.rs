/// S3-compatible object storage backend
use crate::error::{ApiError, ApiResult};
use crate::object_store::{ObjectStore, SignedUrl};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Configuration for S3 storage
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,

    /// AWS region (e.g., "us-east-1")
    pub region: String,

    pub access_key_id: String,
    pub secret_access_key: String,

    /// Custom endpoint for S3-compatible services (MinIO, Spaces, ...)
    pub endpoint: Option<String>,
}

/// S3 object storage backend
///
/// Supports AWS S3 and S3-compatible providers.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Arc<Client>,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn new(config: S3Config) -> ApiResult<Self> {
        info!(
            "Initializing S3 object storage (bucket: {}, region: {})",
            config.bucket, config.region
        );

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "bytrix",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        if let Some(endpoint) = &config.endpoint {
            debug!("Using custom S3 endpoint: {}", endpoint);
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true); // Required for MinIO and some S3-compatible services
        }

        let client = Client::from_conf(s3_config_builder.build());

        Ok(Self {
            client: Arc::new(client),
            bucket: config.bucket,
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, data: Vec<u8>, mime_type: &str) -> ApiResult<()> {
        debug!(
            "Uploading object to S3: {} ({} bytes, type: {})",
            key,
            data.len(),
            mime_type
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to upload object to S3: {}", e);
                ApiError::Storage(format!("S3 upload failed: {}", e))
            })?;

        Ok(())
    }

    async fn signed_url(&self, key: &str, expires_in: u64) -> ApiResult<SignedUrl> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expires_in))
            .map_err(|e| ApiError::Storage(format!("Invalid presign expiry: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                error!("Failed to presign S3 URL: {}", e);
                ApiError::Storage(format!("S3 presign failed: {}", e))
            })?;

        debug!("Signed URL generated for {} ({}s)", key, expires_in);

        Ok(SignedUrl {
            url: presigned.uri().to_string(),
            expires_in,
        })
    }

    async fn delete(&self, key: &str) -> ApiResult<()> {
        debug!("Deleting object from S3: {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to delete object from S3: {}", e);
                ApiError::Storage(format!("S3 delete failed: {}", e))
            })?;

        Ok(())
    }
}
