/// Application context and dependency injection
///
/// Collaborator clients are constructed once at startup and shared
/// through this context; no service reaches for an ambient global.
use crate::{
    auth::CredentialResolver,
    completion::{CompletionBackend, HttpCompletionClient},
    config::ServerConfig,
    db::{self, uploads::UploadStore},
    error::ApiResult,
    object_store::{self, ObjectStore},
    services::{FileService, GenerationService},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub credentials: Arc<CredentialResolver>,
    pub files: Arc<FileService>,
    pub generation: Arc<GenerationService>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> ApiResult<Self> {
        config.validate()?;

        let objects = object_store::from_config(&config.objects.backend).await?;
        let completion: Arc<dyn CompletionBackend> =
            Arc::new(HttpCompletionClient::new(&config.completion));

        Self::with_collaborators(config, objects, completion).await
    }

    /// Wire the context around explicit collaborator handles.
    ///
    /// The production path goes through `new`; tests inject in-memory
    /// fakes here.
    pub async fn with_collaborators(
        config: ServerConfig,
        objects: Arc<dyn ObjectStore>,
        completion: Arc<dyn CompletionBackend>,
    ) -> ApiResult<Self> {
        let pool = db::create_pool(
            &config.metadata.database_path,
            db::DatabaseOptions {
                max_connections: config.metadata.max_connections,
                ..Default::default()
            },
        )
        .await?;

        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let credentials = Arc::new(CredentialResolver::from_config(&config));

        let uploads = UploadStore::new(pool.clone());
        let files = Arc::new(FileService::new(objects, uploads, &config));
        let generation = Arc::new(GenerationService::new(
            completion,
            config.completion.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            db: pool,
            credentials,
            files,
            generation,
        })
    }

    /// Local bind address as a URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.host, self.config.service.port
        )
    }
}
