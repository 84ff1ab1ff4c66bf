/// Credential verification schemes
///
/// Each verifier interprets a raw bearer token under one scheme. A failed
/// attempt is logged and swallowed so the resolver can fall through to the
/// next scheme without leaking which interpretation was tried.
use crate::auth::{Principal, Role};
use crate::identity::IdentityClient;
use async_trait::async_trait;
use subtle::ConstantTimeEq;

/// One interpretation of a bearer credential
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Scheme name, for logging only
    fn scheme(&self) -> &'static str;

    /// Attempt to authenticate the token under this scheme.
    ///
    /// Returns the resolved principal on success; failures of any kind
    /// (mismatch, upstream error, malformed token) yield `None`.
    async fn attempt(&self, token: &str) -> Option<Principal>;
}

/// Scheme 1: shared service secret, granting trusted server-to-server access
pub struct ServiceKeyVerifier {
    service_key: String,
}

impl ServiceKeyVerifier {
    pub fn new(service_key: String) -> Self {
        Self { service_key }
    }
}

#[async_trait]
impl CredentialVerifier for ServiceKeyVerifier {
    fn scheme(&self) -> &'static str {
        "service-key"
    }

    async fn attempt(&self, token: &str) -> Option<Principal> {
        // Constant-time compare; slices of unequal length compare unequal.
        if self.service_key.as_bytes().ct_eq(token.as_bytes()).into() {
            Some(Principal {
                id: "service-role".to_string(),
                role: Role::Service,
            })
        } else {
            None
        }
    }
}

/// Scheme 2: token issued by the external identity provider
pub struct RemoteIdentityVerifier {
    client: IdentityClient,
}

impl RemoteIdentityVerifier {
    pub fn new(client: IdentityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialVerifier for RemoteIdentityVerifier {
    fn scheme(&self) -> &'static str {
        "remote-identity"
    }

    async fn attempt(&self, token: &str) -> Option<Principal> {
        match self.client.verify_token(token).await {
            Ok(user) => Some(Principal {
                id: user.id,
                role: Role::Authenticated,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "remote identity verification failed");
                None
            }
        }
    }
}

/// Scheme 3: locally signed HS256 session token
pub struct LocalTokenVerifier {
    secret: String,
}

impl LocalTokenVerifier {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl CredentialVerifier for LocalTokenVerifier {
    fn scheme(&self) -> &'static str {
        "local-token"
    }

    async fn attempt(&self, token: &str) -> Option<Principal> {
        use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        // Allow some clock skew (5 minutes)
        validation.leeway = 300;

        let data = match decode::<serde_json::Value>(token, &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!(error = %e, "local token verification failed");
                return None;
            }
        };

        let claims = &data.claims;
        let id = claims
            .get("id")
            .and_then(|v| v.as_str())
            .or_else(|| claims.get("user_id").and_then(|v| v.as_str()))
            .or_else(|| claims.get("sub").and_then(|v| v.as_str()))
            .unwrap_or("dev-user")
            .to_string();

        let role = match claims.get("role").and_then(|v| v.as_str()) {
            Some("service") => Role::Service,
            _ => Role::Authenticated,
        };

        Some(Principal { id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn mint(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn test_service_key_exact_match() {
        let verifier = ServiceKeyVerifier::new("sk-shared-secret".into());

        let principal = verifier.attempt("sk-shared-secret").await.unwrap();
        assert_eq!(principal.id, "service-role");
        assert!(principal.role.is_service());

        assert!(verifier.attempt("sk-shared-secret-x").await.is_none());
        assert!(verifier.attempt("sk-shared").await.is_none());
        assert!(verifier.attempt("").await.is_none());
    }

    #[tokio::test]
    async fn test_local_token_id_priority() {
        let verifier = LocalTokenVerifier::new(SECRET.into());

        // explicit id wins over user_id and sub
        let token = mint(json!({
            "id": "a", "user_id": "b", "sub": "c", "exp": far_future()
        }));
        assert_eq!(verifier.attempt(&token).await.unwrap().id, "a");

        let token = mint(json!({ "user_id": "b", "sub": "c", "exp": far_future() }));
        assert_eq!(verifier.attempt(&token).await.unwrap().id, "b");

        let token = mint(json!({ "sub": "c", "exp": far_future() }));
        assert_eq!(verifier.attempt(&token).await.unwrap().id, "c");

        let token = mint(json!({ "exp": far_future() }));
        assert_eq!(verifier.attempt(&token).await.unwrap().id, "dev-user");
    }

    #[tokio::test]
    async fn test_local_token_role_claim() {
        let verifier = LocalTokenVerifier::new(SECRET.into());

        let token = mint(json!({ "sub": "svc", "role": "service", "exp": far_future() }));
        assert!(verifier.attempt(&token).await.unwrap().role.is_service());

        let token = mint(json!({ "sub": "u1", "exp": far_future() }));
        assert!(!verifier.attempt(&token).await.unwrap().role.is_service());
    }

    #[tokio::test]
    async fn test_local_token_bad_signature_rejected() {
        let verifier = LocalTokenVerifier::new("another-secret-another-secret-xx".into());
        let token = mint(json!({ "sub": "u1", "exp": far_future() }));
        assert!(verifier.attempt(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_local_token_expired_rejected() {
        let verifier = LocalTokenVerifier::new(SECRET.into());
        let token = mint(json!({
            "sub": "u1",
            "exp": chrono::Utc::now().timestamp() - 3600
        }));
        assert!(verifier.attempt(&token).await.is_none());
    }
}
