/// File management endpoints
use crate::{
    auth::AuthPrincipal,
    context::AppContext,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{debug, info};

/// Build file routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/upload", post(upload_file))
        .route("/:id", get(get_file).delete(delete_file))
        .route("/", get(list_files))
}

/// Upload a file (multipart form, field `file`)
async fn upload_file(
    State(ctx): State<AppContext>,
    AuthPrincipal(principal): AuthPrincipal,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid("file", &format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or("upload.bin")
            .to_string();
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid("file", &format!("Failed to read file field: {}", e)))?
            .to_vec();

        let result = ctx
            .files
            .upload(&principal.id, &filename, &mimetype, data)
            .await?;

        info!(file_id = %result.id, "File uploaded");

        let url = result.url.clone();
        return Ok((
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "message": "File uploaded successfully",
                "data": result,
                "url": url,
            })),
        ));
    }

    Err(ApiError::invalid("file", "No file provided"))
}

/// Fetch file metadata with a fresh signed URL (public)
async fn get_file(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let result = ctx.files.retrieve(&id).await?;

    info!(file_id = %id, "File retrieved");

    Ok(Json(json!({
        "status": "ok",
        "message": "File retrieved successfully",
        "data": result,
    })))
}

/// Listing endpoint, reserved for future implementation
async fn list_files(
    State(_ctx): State<AppContext>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<impl IntoResponse> {
    debug!(user_id = %principal.id, "List files endpoint called");

    Ok(Json(json!({
        "status": "ok",
        "message": "This endpoint is available for future implementation",
        "data": [],
    })))
}

/// Delete endpoint, reserved for future implementation
async fn delete_file(
    State(_ctx): State<AppContext>,
    AuthPrincipal(_principal): AuthPrincipal,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    debug!(file_id = %id, "Delete file endpoint called");

    Ok(Json(json!({
        "status": "ok",
        "message": "This endpoint is available for future implementation",
        "data": { "id": id },
    })))
}

/// Public vanity route: 302 redirect to a fresh signed URL
pub async fn serve_public_file(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let details = ctx.files.retrieve(&id).await?;

    let response = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, details.signed_url)
        .body(axum::body::Body::empty())
        .map_err(|e| ApiError::Internal(format!("Failed to build redirect: {}", e)))?;

    Ok(response)
}
