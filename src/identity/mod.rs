/// Remote identity provider client
///
/// Verifies externally issued user tokens by passing them through to the
/// provider's user-introspection endpoint.
use crate::config::IdentityProviderConfig;
use crate::error::{ApiError, ApiResult};
use serde::Deserialize;
use std::time::Duration;

/// User record returned by the provider on a valid token
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// HTTP client for the identity provider
#[derive(Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    pub fn new(config: IdentityProviderConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        }
    }

    /// Verify a user token, returning the user it belongs to
    pub async fn verify_token(&self, token: &str) -> ApiResult<IdentityUser> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|e| ApiError::Authentication(format!("Identity request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::Authentication(format!(
                "Identity provider rejected token ({})",
                response.status()
            )));
        }

        response
            .json::<IdentityUser>()
            .await
            .map_err(|e| ApiError::Authentication(format!("Invalid identity response: {}", e)))
    }
}
