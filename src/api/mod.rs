/// API routes and handlers
pub mod actions;
pub mod files;
pub mod generate;

use crate::config::RouteConfig;
use crate::context::AppContext;
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::json;

/// Build API routes under the configured base paths
pub fn routes(config: &RouteConfig) -> Router<AppContext> {
    Router::new()
        .nest(&config.files_base, files::routes())
        .nest(
            &config.gpt_base,
            generate::routes().merge(actions::routes()),
        )
        .route(
            &format!("{}/:id", config.public_file_base),
            get(files::serve_public_file),
        )
        .route(&config.api_base, get(describe_service))
}

/// Service descriptor at the API root
async fn describe_service(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "Bytrix API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Backend service for file management with GPT integration",
        "endpoints": {
            "files": ctx.config.routes.files_base,
            "gpt": ctx.config.routes.gpt_base,
        },
    }))
}
