/// Text generation service
///
/// Assembles the message list and sampling parameters, forwards them to
/// the completion collaborator, and extracts the first choice.
use crate::{
    completion::{
        prompt, ChatMessage, CompletionBackend, CompletionRequest, FunctionCall, TokenUsage,
    },
    config::CompletionConfig,
    error::{ApiError, ApiResult},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Caller-supplied generation parameters; each defaults independently
#[derive(Debug, Clone, Default)]
pub struct GenerationParams {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    /// Attach the file-action function descriptors
    pub include_actions: bool,
}

/// Result of one generation call
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutcome {
    pub id: String,
    pub model: String,
    pub created: Option<i64>,
    pub message: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: String,
    pub function_call: Option<FunctionCall>,
}

pub struct GenerationService {
    backend: Arc<dyn CompletionBackend>,
    config: CompletionConfig,
}

impl GenerationService {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: CompletionConfig) -> Self {
        Self { backend, config }
    }

    pub async fn generate(
        &self,
        prompt_text: &str,
        params: GenerationParams,
    ) -> ApiResult<GenerationOutcome> {
        if prompt_text.trim().is_empty() {
            return Err(ApiError::invalid(
                "prompt",
                "Prompt is required and must be a non-empty string",
            ));
        }

        debug!(
            prompt_length = prompt_text.len(),
            include_actions = params.include_actions,
            "Generating text"
        );

        let messages = vec![
            ChatMessage::system(prompt::file_assistant_instruction()),
            ChatMessage::user(prompt_text),
        ];

        let (functions, function_call) = if params.include_actions {
            (Some(prompt::file_action_functions()), Some("auto"))
        } else {
            (None, None)
        };

        let request = CompletionRequest {
            model: params.model.unwrap_or_else(|| self.config.model.clone()),
            messages,
            temperature: params.temperature.unwrap_or(self.config.temperature),
            max_tokens: params.max_tokens.unwrap_or(self.config.max_tokens),
            top_p: params.top_p.unwrap_or(1.0),
            frequency_penalty: params.frequency_penalty.unwrap_or(0.0),
            presence_penalty: params.presence_penalty.unwrap_or(0.0),
            functions,
            function_call,
        };

        let response = self.backend.complete(request).await?;

        info!(
            model = %response.model,
            tokens_used = response.usage.as_ref().map(|u| u.total_tokens),
            "Text generated"
        );

        let first = response.choices.into_iter().next();

        Ok(GenerationOutcome {
            id: response.id,
            model: response.model,
            created: response.created,
            message: first
                .as_ref()
                .and_then(|c| c.message.content.clone())
                .unwrap_or_default(),
            usage: response.usage,
            finish_reason: first
                .as_ref()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "stop".to_string()),
            function_call: first.and_then(|c| c.message.function_call),
        })
    }
}
