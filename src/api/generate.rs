/// Text generation endpoint
use crate::{
    auth::AuthPrincipal,
    context::AppContext,
    error::ApiResult,
    services::generation::GenerationParams,
    validation::{Field, Schema},
};
use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use serde_json::{json, Value};
use tracing::debug;

lazy_static! {
    static ref GENERATE_SCHEMA: Schema = Schema::new()
        .field(Field::string("prompt").required().min_len(1).max_len(4000))
        .field(Field::number("temperature").min(0.0).max(2.0))
        .field(Field::integer("max_tokens").min(1.0).max(4096.0))
        .field(Field::string("model").default_value(json!("gpt-3.5-turbo")))
        .field(Field::number("top_p").min(0.0).max(1.0))
        .field(Field::number("frequency_penalty").min(-2.0).max(2.0))
        .field(Field::number("presence_penalty").min(-2.0).max(2.0))
        .field(Field::boolean("include_actions"));
}

/// Build generation routes
pub fn routes() -> Router<AppContext> {
    Router::new().route("/generate", post(generate_text))
}

/// Generate text from a prompt
async fn generate_text(
    State(ctx): State<AppContext>,
    AuthPrincipal(_principal): AuthPrincipal,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let payload = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let validated = GENERATE_SCHEMA.checked(&payload)?;

    let prompt = validated
        .get("prompt")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    debug!(prompt_length = prompt.len(), "Generate text endpoint called");

    let params = GenerationParams {
        temperature: validated.get("temperature").and_then(Value::as_f64),
        max_tokens: validated
            .get("max_tokens")
            .and_then(Value::as_u64)
            .map(|v| v as u32),
        model: validated
            .get("model")
            .and_then(Value::as_str)
            .map(String::from),
        top_p: validated.get("top_p").and_then(Value::as_f64),
        frequency_penalty: validated.get("frequency_penalty").and_then(Value::as_f64),
        presence_penalty: validated.get("presence_penalty").and_then(Value::as_f64),
        include_actions: validated
            .get("include_actions")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    };

    let outcome = ctx.generation.generate(&prompt, params).await?;

    Ok(Json(json!({
        "status": "ok",
        "data": outcome,
    })))
}
