/// Configuration management for the Bytrix backend
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub routes: RouteConfig,
    pub auth: AuthConfig,
    pub metadata: MetadataConfig,
    pub objects: ObjectStoreSettings,
    pub completion: CompletionConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Public origin used when composing retrieval URLs
    pub public_domain: String,
    pub environment: String,
    /// Maximum accepted upload size in bytes
    pub max_upload_size: usize,
}

/// Endpoint base paths; no path is hard-coded into routing logic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    pub api_base: String,
    pub files_base: String,
    pub gpt_base: String,
    /// Public vanity route serving 302 redirects to signed URLs
    pub public_file_base: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret granting trusted server-to-server access
    pub service_key: String,
    /// External identity provider; absent disables the remote scheme
    pub identity: Option<IdentityProviderConfig>,
    /// HS256 secret for locally issued session tokens; absent disables
    /// the local scheme
    pub local_jwt_secret: Option<String>,
}

/// Remote identity provider endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProviderConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Metadata database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreSettings {
    pub backend: ObjectBackendConfig,
    /// Lifetime of signed retrieval URLs, seconds
    pub signed_url_expiry: u64,
}

/// Backend selection for object storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectBackendConfig {
    S3 {
        bucket: String,
        region: String,
        access_key_id: String,
        secret_access_key: String,
        endpoint: Option<String>,
    },
    /// Ephemeral in-process store for development and tests
    Memory,
}

/// Completion API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> ApiResult<Self> {
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ApiError::Internal("Invalid port number".to_string()))?;
        let public_domain =
            env::var("DOMAIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let max_upload_size = env::var("MAX_FILE_SIZE")
            .unwrap_or_else(|_| "104857600".to_string())
            .parse()
            .unwrap_or(104_857_600);

        let api_base = env::var("API_BASE_PATH").unwrap_or_else(|_| "/api/v1".to_string());
        let files_base =
            env::var("FILE_ENDPOINT_BASE").unwrap_or_else(|_| format!("{}/files", api_base));
        let gpt_base =
            env::var("GPT_ENDPOINT_BASE").unwrap_or_else(|_| format!("{}/gpt", api_base));
        let public_file_base =
            env::var("PUBLIC_FILE_BASE").unwrap_or_else(|_| "/file".to_string());

        let service_key = env::var("SERVICE_API_KEY")
            .map_err(|_| ApiError::Internal("Service API key required".to_string()))?;

        let identity = if let Ok(base_url) = env::var("AUTH_API_URL") {
            Some(IdentityProviderConfig {
                base_url,
                api_key: env::var("AUTH_API_KEY")
                    .map_err(|_| ApiError::Internal("Identity provider key required".to_string()))?,
            })
        } else {
            None
        };

        let local_jwt_secret = env::var("LOCAL_JWT_SECRET").ok();

        let database_path: PathBuf = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "./data/uploads.sqlite".to_string())
            .into();
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let backend = if let Ok(bucket) = env::var("S3_BUCKET") {
            ObjectBackendConfig::S3 {
                bucket,
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                access_key_id: env::var("S3_ACCESS_KEY")
                    .map_err(|_| ApiError::Internal("S3 access key required".to_string()))?,
                secret_access_key: env::var("S3_SECRET_KEY")
                    .map_err(|_| ApiError::Internal("S3 secret key required".to_string()))?,
                endpoint: env::var("S3_ENDPOINT").ok(),
            }
        } else {
            ObjectBackendConfig::Memory
        };
        let signed_url_expiry = env::var("SIGNED_URL_EXPIRY")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        let completion = CompletionConfig {
            api_url: env::var("GPT_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("GPT_API_KEY").unwrap_or_default(),
            model: env::var("GPT_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            temperature: env::var("GPT_TEMPERATURE")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()
                .unwrap_or(0.7),
            max_tokens: env::var("GPT_MAX_TOKENS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
            timeout_secs: env::var("GPT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
        };

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                host,
                port,
                public_domain,
                environment,
                max_upload_size,
            },
            routes: RouteConfig {
                api_base,
                files_base,
                gpt_base,
                public_file_base,
            },
            auth: AuthConfig {
                service_key,
                identity,
                local_jwt_secret,
            },
            metadata: MetadataConfig {
                database_path,
                max_connections,
            },
            objects: ObjectStoreSettings {
                backend,
                signed_url_expiry,
            },
            completion,
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.auth.service_key.len() < 16 {
            return Err(ApiError::Internal(
                "Service API key must be at least 16 characters".to_string(),
            ));
        }

        if let Some(secret) = &self.auth.local_jwt_secret {
            if secret.len() < 32 {
                return Err(ApiError::Internal(
                    "Local JWT secret must be at least 32 characters".to_string(),
                ));
            }
        }

        if self.service.max_upload_size == 0 {
            return Err(ApiError::Internal(
                "Maximum upload size must be positive".to_string(),
            ));
        }

        if !self.routes.files_base.starts_with('/')
            || !self.routes.gpt_base.starts_with('/')
            || !self.routes.public_file_base.starts_with('/')
        {
            return Err(ApiError::Internal(
                "Endpoint base paths must start with '/'".to_string(),
            ));
        }

        Ok(())
    }
}
