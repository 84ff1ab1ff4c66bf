/// Credential resolution and authentication extractors
///
/// A request's bearer token is interpreted against an ordered list of
/// credential schemes; the first scheme that accepts it produces the
/// request's `Principal`. Scheme-level failures are logged and suppressed
/// so a caller probing the boundary never learns which interpretations
/// were attempted.
pub mod verifiers;

pub use verifiers::{
    CredentialVerifier, LocalTokenVerifier, RemoteIdentityVerifier, ServiceKeyVerifier,
};

use crate::{
    config::ServerConfig,
    context::AppContext,
    error::{ApiError, ApiResult},
    identity::IdentityClient,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};

/// Caller role attached to a resolved principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authenticated,
    /// Trusted server-to-server caller; owns nothing, bypasses ownership
    Service,
}

impl Role {
    pub fn is_service(&self) -> bool {
        matches!(self, Role::Service)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Authenticated => "authenticated",
            Role::Service => "service",
        }
    }
}

/// The authenticated caller, constructed fresh per request
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_service(&self) -> bool {
        self.role.is_service()
    }

    /// Ownership check; service principals see every owner's records
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_service() || self.id == owner_id
    }
}

/// Extract the bearer token from an Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from)
}

/// Ordered credential scheme chain
///
/// Built once at startup and shared; resolution is pure per-request work
/// with no retained state.
pub struct CredentialResolver {
    verifiers: Vec<Box<dyn CredentialVerifier>>,
}

impl CredentialResolver {
    /// Assemble the chain from configuration: service key, then the
    /// remote identity provider (when configured), then locally signed
    /// tokens (when a secret is configured).
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut verifiers: Vec<Box<dyn CredentialVerifier>> = vec![Box::new(
            ServiceKeyVerifier::new(config.auth.service_key.clone()),
        )];

        if let Some(identity) = &config.auth.identity {
            verifiers.push(Box::new(RemoteIdentityVerifier::new(IdentityClient::new(
                identity.clone(),
            ))));
        }

        if let Some(secret) = &config.auth.local_jwt_secret {
            verifiers.push(Box::new(LocalTokenVerifier::new(secret.clone())));
        }

        Self { verifiers }
    }

    /// Build a resolver from an explicit verifier list
    pub fn with_verifiers(verifiers: Vec<Box<dyn CredentialVerifier>>) -> Self {
        Self { verifiers }
    }

    /// Resolve a raw token against the chain, first match wins
    pub async fn resolve_token(&self, token: &str) -> ApiResult<Principal> {
        for verifier in &self.verifiers {
            if let Some(principal) = verifier.attempt(token).await {
                tracing::debug!(
                    scheme = verifier.scheme(),
                    principal = %principal.id,
                    role = principal.role.as_str(),
                    "credential resolved"
                );
                return Ok(principal);
            }
        }

        Err(ApiError::Authentication(
            "Invalid authentication token".to_string(),
        ))
    }

    /// Resolve from request headers, failing on a missing or malformed
    /// Authorization header
    pub async fn resolve(&self, headers: &HeaderMap) -> ApiResult<Principal> {
        let token = extract_bearer_token(headers).ok_or_else(|| {
            ApiError::Authentication("Missing or invalid authorization header".to_string())
        })?;

        self.resolve_token(&token).await
    }

    /// Optional mode: any failure yields "no principal" instead of an error
    pub async fn resolve_optional(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = extract_bearer_token(headers)?;
        match self.resolve_token(&token).await {
            Ok(principal) => Some(principal),
            Err(_) => {
                tracing::debug!("optional authentication skipped");
                None
            }
        }
    }
}

/// Required-auth extractor; rejects with 401 when no scheme matches
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppContext> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let principal = state.credentials.resolve(&parts.headers).await?;
        Ok(AuthPrincipal(principal))
    }
}

/// Optional-auth extractor; never rejects
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppContext> for MaybePrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let principal = state.credentials.resolve_optional(&parts.headers).await;
        Ok(MaybePrincipal(principal))
    }
}
