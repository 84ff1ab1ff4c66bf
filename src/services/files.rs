/// File service
///
/// Orchestrates the object store and the metadata store for uploads,
/// retrieval, and the ownership-scoped agent actions. Never swallows a
/// collaborator failure; everything surfaces as a taxonomy error.
use crate::{
    auth::Principal,
    config::ServerConfig,
    db::uploads::{UploadFilters, UploadRecord, UploadStore, UploadSummary},
    error::{ApiError, ApiResult},
    object_store::ObjectStore,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upload response payload
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub id: String,
    pub filename: String,
    pub size: i64,
    pub mimetype: String,
    pub url: String,
}

/// Retrieval payload: metadata plus a fresh signed URL
#[derive(Debug, Clone, Serialize)]
pub struct FileDetails {
    pub id: String,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub signed_url: String,
    pub expires_in: u64,
}

/// Detailed info payload for the agent `info` action
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub id: String,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub size_readable: String,
    pub created_at: DateTime<Utc>,
    pub storage_key: String,
    pub file_type: &'static str,
}

pub struct FileService {
    objects: Arc<dyn ObjectStore>,
    uploads: UploadStore,
    public_domain: String,
    public_file_base: String,
    signed_url_expiry: u64,
    max_upload_size: usize,
}

impl FileService {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        uploads: UploadStore,
        config: &ServerConfig,
    ) -> Self {
        Self {
            objects,
            uploads,
            public_domain: config.service.public_domain.trim_end_matches('/').to_string(),
            public_file_base: config.routes.public_file_base.clone(),
            signed_url_expiry: config.objects.signed_url_expiry,
            max_upload_size: config.service.max_upload_size,
        }
    }

    /// Store a file and record its metadata
    pub async fn upload(
        &self,
        owner_id: &str,
        filename: &str,
        mimetype: &str,
        data: Vec<u8>,
    ) -> ApiResult<UploadedFile> {
        if data.is_empty() {
            return Err(ApiError::invalid("file", "No file provided"));
        }

        // Bound memory before any storage I/O happens
        if data.len() > self.max_upload_size {
            return Err(ApiError::invalid(
                "file",
                &format!(
                    "File exceeds the maximum upload size of {} bytes",
                    self.max_upload_size
                ),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let extension = file_extension(filename);
        let storage_key = format!("uploads/{}/{}.{}", owner_id, id, extension);
        let size = data.len() as i64;

        debug!(file_id = %id, key = %storage_key, size, "Starting file upload");

        self.objects.put(&storage_key, data, mimetype).await?;

        let record = UploadRecord {
            id: id.clone(),
            filename: filename.to_string(),
            storage_key,
            mimetype: mimetype.to_string(),
            size,
            owner_id: owner_id.to_string(),
            created_at: Utc::now(),
        };

        // A failure here strands the object just written; reconciliation
        // is left to an out-of-band sweep.
        self.uploads.insert(&record).await?;

        info!(file_id = %id, "File uploaded");

        Ok(UploadedFile {
            url: format!("{}{}/{}", self.public_domain, self.public_file_base, id),
            id: record.id,
            filename: record.filename,
            size: record.size,
            mimetype: record.mimetype,
        })
    }

    /// Metadata plus a fresh signed URL, no ownership restriction
    pub async fn retrieve(&self, id: &str) -> ApiResult<FileDetails> {
        debug!(file_id = %id, "Fetching file metadata and signing URL");

        let record = self
            .uploads
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("File with ID {} not found", id)))?;

        let signed = self
            .objects
            .signed_url(&record.storage_key, self.signed_url_expiry)
            .await?;

        Ok(FileDetails {
            id: record.id,
            filename: record.filename,
            mimetype: record.mimetype,
            size: record.size,
            created_at: record.created_at,
            signed_url: signed.url,
            expires_in: signed.expires_in,
        })
    }

    /// Fetch a record the principal is allowed to see.
    ///
    /// A missing row and a foreign owner produce the same error, so the
    /// caller cannot distinguish "does not exist" from "not yours".
    async fn get_record_owned(
        &self,
        principal: &Principal,
        file_id: &str,
    ) -> ApiResult<UploadRecord> {
        let record = self
            .uploads
            .get(file_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("File {} not found", file_id)))?;

        if !principal.can_access(&record.owner_id) {
            return Err(ApiError::NotFound(format!("File {} not found", file_id)));
        }

        Ok(record)
    }

    /// Agent action: metadata plus signed download URL, ownership-scoped
    pub async fn get_owned(
        &self,
        principal: &Principal,
        file_id: &str,
    ) -> ApiResult<FileDetails> {
        let record = self.get_record_owned(principal, file_id).await?;
        let signed = self
            .objects
            .signed_url(&record.storage_key, self.signed_url_expiry)
            .await?;

        Ok(FileDetails {
            id: record.id,
            filename: record.filename,
            mimetype: record.mimetype,
            size: record.size,
            created_at: record.created_at,
            signed_url: signed.url,
            expires_in: signed.expires_in,
        })
    }

    /// Agent action: detailed info, ownership-scoped
    pub async fn info_owned(&self, principal: &Principal, file_id: &str) -> ApiResult<FileInfo> {
        let record = self.get_record_owned(principal, file_id).await?;

        Ok(FileInfo {
            size_readable: format_bytes(record.size as u64),
            file_type: file_type(&record.mimetype),
            id: record.id,
            filename: record.filename,
            mimetype: record.mimetype,
            size: record.size,
            created_at: record.created_at,
            storage_key: record.storage_key,
        })
    }

    /// Agent action: delete metadata, then best-effort delete the object
    pub async fn delete_owned(&self, principal: &Principal, file_id: &str) -> ApiResult<()> {
        let record = self.get_record_owned(principal, file_id).await?;

        self.uploads.delete(&record.id).await?;

        if let Err(e) = self.objects.delete(&record.storage_key).await {
            warn!(file_id = %record.id, error = %e, "Stored object could not be deleted");
        }

        info!(file_id = %record.id, "File deleted");

        Ok(())
    }

    /// Agent action: every file the principal owns, newest first
    pub async fn list_owned(&self, principal: &Principal) -> ApiResult<Vec<UploadSummary>> {
        self.uploads.list_for_owner(&principal.id).await
    }

    /// Agent action: filtered listing, newest first
    pub async fn query_owned(
        &self,
        principal: &Principal,
        filters: &UploadFilters,
    ) -> ApiResult<Vec<UploadSummary>> {
        self.uploads.query_for_owner(&principal.id, filters).await
    }
}

/// Extension of a filename, `bin` when it has none
fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("bin")
        .to_ascii_lowercase()
}

/// Human-readable byte count
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    // Two decimals, trailing zeros trimmed
    let mut formatted = format!("{:.2}", value);
    while formatted.ends_with('0') {
        formatted.pop();
    }
    if formatted.ends_with('.') {
        formatted.pop();
    }

    format!("{} {}", formatted, UNITS[exponent])
}

/// Coarse file-type label from a MIME type
pub fn file_type(mimetype: &str) -> &'static str {
    if mimetype.is_empty() {
        return "unknown";
    }

    if mimetype.starts_with("image/") {
        "image"
    } else if mimetype.starts_with("video/") {
        "video"
    } else if mimetype.starts_with("audio/") {
        "audio"
    } else if mimetype.starts_with("text/") {
        "text"
    } else if mimetype.contains("pdf") {
        "pdf"
    } else if mimetype.contains("word") || mimetype.contains("document") {
        "document"
    } else if mimetype.contains("sheet") || mimetype.contains("spreadsheet") {
        "spreadsheet"
    } else if mimetype.contains("presentation") || mimetype.contains("slide") {
        "presentation"
    } else if mimetype.contains("zip") || mimetype.contains("archive") {
        "archive"
    } else {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::config::{
        AuthConfig, CompletionConfig, LoggingConfig, MetadataConfig, ObjectBackendConfig,
        ObjectStoreSettings, RouteConfig, ServerConfig, ServiceConfig,
    };
    use crate::db::{create_pool, run_migrations, DatabaseOptions};
    use crate::object_store::MemoryObjectStore;
    use std::path::Path;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                host: "127.0.0.1".into(),
                port: 3000,
                public_domain: "http://localhost:3000".into(),
                environment: "test".into(),
                max_upload_size: 1024,
            },
            routes: RouteConfig {
                api_base: "/api/v1".into(),
                files_base: "/api/v1/files".into(),
                gpt_base: "/api/v1/gpt".into(),
                public_file_base: "/file".into(),
            },
            auth: AuthConfig {
                service_key: "super-secret-service-key".into(),
                identity: None,
                local_jwt_secret: None,
            },
            metadata: MetadataConfig {
                database_path: ":memory:".into(),
                max_connections: 1,
            },
            objects: ObjectStoreSettings {
                backend: ObjectBackendConfig::Memory,
                signed_url_expiry: 3600,
            },
            completion: CompletionConfig {
                api_url: "http://localhost:9".into(),
                api_key: "test".into(),
                model: "gpt-3.5-turbo".into(),
                temperature: 0.7,
                max_tokens: 2000,
                timeout_secs: 5,
            },
            logging: LoggingConfig { level: "info".into() },
        }
    }

    async fn service() -> (FileService, Arc<MemoryObjectStore>) {
        let pool = create_pool(Path::new(":memory:"), DatabaseOptions::default())
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        let objects = Arc::new(MemoryObjectStore::new());
        let service = FileService::new(
            objects.clone(),
            UploadStore::new(pool),
            &test_config(),
        );
        (service, objects)
    }

    fn user(id: &str) -> Principal {
        Principal {
            id: id.into(),
            role: Role::Authenticated,
        }
    }

    fn service_role() -> Principal {
        Principal {
            id: "service-role".into(),
            role: Role::Service,
        }
    }

    #[tokio::test]
    async fn test_upload_and_retrieve() {
        let (service, objects) = service().await;

        let uploaded = service
            .upload("u1", "a.txt", "text/plain", b"0123456789".to_vec())
            .await
            .unwrap();

        assert_eq!(uploaded.filename, "a.txt");
        assert_eq!(uploaded.size, 10);
        assert!(uploaded.url.contains(&uploaded.id));
        assert!(objects.contains(&format!("uploads/u1/{}.txt", uploaded.id)));

        let details = service.retrieve(&uploaded.id).await.unwrap();
        assert_eq!(details.filename, "a.txt");
        assert_eq!(details.size, 10);
        assert_eq!(details.expires_in, 3600);
        assert!(!details.signed_url.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_returns_fresh_url_with_stable_metadata() {
        let (service, _) = service().await;
        let uploaded = service
            .upload("u1", "a.txt", "text/plain", b"xx".to_vec())
            .await
            .unwrap();

        let first = service.retrieve(&uploaded.id).await.unwrap();
        let second = service.retrieve(&uploaded.id).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.filename, second.filename);
        assert_eq!(first.mimetype, second.mimetype);
        assert_eq!(first.size, second.size);
        assert_eq!(first.created_at, second.created_at);
        assert_ne!(first.signed_url, second.signed_url);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected_before_storage() {
        let (service, objects) = service().await;

        let err = service
            .upload("u1", "big.bin", "application/octet-stream", vec![0u8; 2048])
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert_eq!(objects.object_count(), 0);
    }

    #[tokio::test]
    async fn test_retrieve_missing_is_not_found() {
        let (service, _) = service().await;
        let err = service.retrieve("missing-id").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_ownership_mismatch_indistinguishable_from_missing() {
        let (service, _) = service().await;
        let uploaded = service
            .upload("u1", "a.txt", "text/plain", b"data".to_vec())
            .await
            .unwrap();

        let foreign = service
            .get_owned(&user("u2"), &uploaded.id)
            .await
            .unwrap_err();
        let missing = service
            .get_owned(&user("u2"), "00000000-0000-0000-0000-000000000000")
            .await
            .unwrap_err();

        assert_eq!(foreign.code(), "NOT_FOUND");
        assert_eq!(missing.code(), "NOT_FOUND");
        assert_eq!(foreign.status(), missing.status());
    }

    #[tokio::test]
    async fn test_service_principal_bypasses_ownership() {
        let (service, _) = service().await;
        let uploaded = service
            .upload("u1", "a.txt", "text/plain", b"data".to_vec())
            .await
            .unwrap();

        let details = service
            .get_owned(&service_role(), &uploaded.id)
            .await
            .unwrap();
        assert_eq!(details.id, uploaded.id);

        let info = service
            .info_owned(&service_role(), &uploaded.id)
            .await
            .unwrap();
        assert_eq!(info.file_type, "text");
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_object() {
        let (service, objects) = service().await;
        let uploaded = service
            .upload("u1", "a.txt", "text/plain", b"data".to_vec())
            .await
            .unwrap();
        let key = format!("uploads/u1/{}.txt", uploaded.id);
        assert!(objects.contains(&key));

        service.delete_owned(&user("u1"), &uploaded.id).await.unwrap();

        assert!(!objects.contains(&key));
        let err = service.retrieve(&uploaded.id).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_and_query_scoped_to_caller() {
        let (service, _) = service().await;
        service
            .upload("u1", "mine.txt", "text/plain", b"1".to_vec())
            .await
            .unwrap();
        service
            .upload("u2", "theirs.txt", "text/plain", b"2".to_vec())
            .await
            .unwrap();

        let mine = service.list_owned(&user("u1")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].filename, "mine.txt");

        let queried = service
            .query_owned(
                &user("u1"),
                &UploadFilters {
                    filename: Some("theirs".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(queried.is_empty());
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("a.txt"), "txt");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("README"), "bin");
        assert_eq!(file_extension("noext."), "bin");
        assert_eq!(file_extension("UPPER.PDF"), "pdf");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(5_242_880), "5 MB");
    }

    #[test]
    fn test_file_type() {
        assert_eq!(file_type("image/png"), "image");
        assert_eq!(file_type("video/mp4"), "video");
        assert_eq!(file_type("audio/mpeg"), "audio");
        assert_eq!(file_type("text/plain"), "text");
        assert_eq!(file_type("application/pdf"), "pdf");
        assert_eq!(file_type("application/msword"), "document");
        assert_eq!(file_type("application/vnd.ms-excel.sheet"), "spreadsheet");
        assert_eq!(file_type("application/zip"), "archive");
        assert_eq!(file_type("application/octet-stream"), "file");
        assert_eq!(file_type(""), "unknown");
    }
}
