/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{not_found_body, ApiError, ApiResult},
};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method, StatusCode, Uri},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // Multipart framing needs headroom beyond the file itself
    let body_limit = ctx.config.service.max_upload_size + 1024 * 1024;
    let api_health = format!("{}/health", ctx.config.routes.api_base);

    Router::new()
        // Health check endpoints (top-level and under the API base)
        .route("/health", get(health_check))
        .route(&api_health, get(health_check))
        // API routes under configurable base paths
        .merge(crate::api::routes(&ctx.config.routes))
        .layer(DefaultBodyLimit::max(body_limit))
        // Provide state - converts Router<AppContext> to Router<()>
        .with_state(ctx)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Health check handler
async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Service is running",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": ctx.config.service.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// 404 handler
async fn not_found(uri: Uri) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(not_found_body(uri.path())))
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> ApiResult<()> {
    let addr = format!("{}:{}", ctx.config.service.host, ctx.config.service.port);

    info!("Bytrix backend listening on {}", addr);
    info!("   Public domain: {}", ctx.config.service.public_domain);
    info!("   API base: {}", ctx.config.routes.api_base);

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
