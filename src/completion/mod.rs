/// Completion API collaborator
///
/// Typed request/response surface over an OpenAI-compatible chat
/// completion endpoint, behind a trait so services can run against a
/// stub backend in tests.
pub mod prompt;

use crate::config::CompletionConfig;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One chat message in the completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Callable function descriptor advertised to the model
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDef {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: serde_json::Value,
}

/// Outbound completion request
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionDef>>,
    /// "auto" when functions are attached, letting the model decide
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<&'static str>,
}

/// Structured function-call request echoed by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// Token accounting reported by the completion API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Inbound completion response
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    #[serde(default)]
    pub created: Option<i64>,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Completion backend trait
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> ApiResult<CompletionResponse>;
}

/// HTTP client for an OpenAI-compatible completion endpoint
pub struct HttpCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpCompletionClient {
    pub fn new(config: &CompletionConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> ApiResult<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            has_functions = request.functions.is_some(),
            "Sending completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Completion(format!("Completion request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Completion(format!(
                "Completion API returned {}: {}",
                status, body
            )));
        }

        response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| ApiError::Completion(format!("Invalid completion response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization_omits_absent_functions() {
        let request = CompletionRequest {
            model: "gpt-3.5-turbo".into(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.7,
            max_tokens: 2000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            functions: None,
            function_call: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("functions").is_none());
        assert!(value.get("function_call").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_deserialization() {
        let body = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "hello" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 }
        });

        let response: CompletionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("hello"));
        assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.as_ref().unwrap().total_tokens, 5);
    }

    #[test]
    fn test_response_with_function_call() {
        let body = json!({
            "id": "chatcmpl-2",
            "model": "gpt-3.5-turbo",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "function_call": { "name": "list_files", "arguments": "{}" }
                },
                "finish_reason": "function_call"
            }]
        });

        let response: CompletionResponse = serde_json::from_value(body).unwrap();
        let call = response.choices[0].message.function_call.as_ref().unwrap();
        assert_eq!(call.name, "list_files");
    }
}
