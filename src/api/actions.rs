/// Agent-facing file actions
///
/// Structured endpoints consumed by an LLM-driven agent through function
/// calls; every operation is ownership-scoped.
use crate::{
    auth::AuthPrincipal,
    context::AppContext,
    db::uploads::UploadFilters,
    error::ApiResult,
    validation::{Field, Format, Schema},
};
use axum::{
    body::Bytes,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use serde_json::{json, Value};
use tracing::debug;

lazy_static! {
    static ref FILE_ID_SCHEMA: Schema =
        Schema::new().field(Field::string("file_id").required().format(Format::Uuid));
    static ref QUERY_SCHEMA: Schema = Schema::new()
        .field(Field::string("filename"))
        .field(Field::string("mimetype"))
        .field(Field::integer("size_min").min(0.0))
        .field(Field::integer("size_max").min(0.0))
        .field(Field::string("after_date").format(Format::Date));
}

/// Build action routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/actions/files/list", get(list_files))
        .route("/actions/files/get", post(get_file))
        .route("/actions/files/delete", post(delete_file))
        .route("/actions/files/info", post(file_info))
        .route("/actions/query", post(query_files))
}

fn payload(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn file_id(validated: &serde_json::Map<String, Value>) -> String {
    validated
        .get("file_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// List every file the caller owns
async fn list_files(
    State(ctx): State<AppContext>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<impl IntoResponse> {
    debug!(user_id = %principal.id, "Listing files");

    let files = ctx.files.list_owned(&principal).await?;

    Ok(Json(json!({
        "status": "ok",
        "count": files.len(),
        "data": files,
    })))
}

/// Metadata plus signed download URL for one owned file
async fn get_file(
    State(ctx): State<AppContext>,
    AuthPrincipal(principal): AuthPrincipal,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let validated = FILE_ID_SCHEMA.checked(&payload(&body))?;
    let id = file_id(&validated);

    debug!(file_id = %id, user_id = %principal.id, "Getting file");

    let details = ctx.files.get_owned(&principal, &id).await?;

    Ok(Json(json!({
        "status": "ok",
        "data": details,
    })))
}

/// Delete one owned file
async fn delete_file(
    State(ctx): State<AppContext>,
    AuthPrincipal(principal): AuthPrincipal,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let validated = FILE_ID_SCHEMA.checked(&payload(&body))?;
    let id = file_id(&validated);

    debug!(file_id = %id, user_id = %principal.id, "Deleting file");

    ctx.files.delete_owned(&principal, &id).await?;

    Ok(Json(json!({
        "status": "ok",
        "message": "File deleted successfully",
        "data": { "id": id },
    })))
}

/// Detailed information about one owned file
async fn file_info(
    State(ctx): State<AppContext>,
    AuthPrincipal(principal): AuthPrincipal,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let validated = FILE_ID_SCHEMA.checked(&payload(&body))?;
    let id = file_id(&validated);

    debug!(file_id = %id, user_id = %principal.id, "Getting file info");

    let info = ctx.files.info_owned(&principal, &id).await?;

    Ok(Json(json!({
        "status": "ok",
        "data": info,
    })))
}

/// Search the caller's files by metadata
async fn query_files(
    State(ctx): State<AppContext>,
    AuthPrincipal(principal): AuthPrincipal,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let validated = QUERY_SCHEMA.checked(&payload(&body))?;

    let filters = UploadFilters {
        filename: validated
            .get("filename")
            .and_then(Value::as_str)
            .map(String::from),
        mimetype: validated
            .get("mimetype")
            .and_then(Value::as_str)
            .map(String::from),
        size_min: validated.get("size_min").and_then(Value::as_i64),
        size_max: validated.get("size_max").and_then(Value::as_i64),
        after_date: validated
            .get("after_date")
            .and_then(Value::as_str)
            .map(String::from),
    };

    debug!(user_id = %principal.id, ?filters, "Querying files");

    let files = ctx.files.query_owned(&principal, &filters).await?;

    debug!(user_id = %principal.id, results = files.len(), "Query completed");

    Ok(Json(json!({
        "status": "ok",
        "count": files.len(),
        "data": files,
    })))
}
