/// Unified error types for the Bytrix backend
use crate::validation::Violation;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Main error type for the service
///
/// Every failure a request can produce maps onto exactly one of these
/// categories. Collaborator variants keep the low-level cause for logging
/// but never expose it to the caller.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Caller-supplied data failed schema or business-rule validation
    #[error("{message}")]
    Validation {
        message: String,
        violations: Vec<Violation>,
    },

    /// Credential missing or invalid
    #[error("{0}")]
    Authentication(String),

    /// Resource does not exist, or the caller lacks visibility into it.
    /// Ownership mismatches use this variant too, so a foreign resource is
    /// indistinguishable from a missing one.
    #[error("{0}")]
    NotFound(String),

    /// Object store failure
    #[error("Object storage request failed")]
    Storage(String),

    /// Metadata database failure
    #[error("Metadata store request failed")]
    Metadata(String),

    /// Completion API failure
    #[error("Completion request failed")]
    Completion(String),

    /// Anything unclassified
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// Validation failure with a single field violation
    pub fn invalid(field: &str, message: &str) -> Self {
        ApiError::Validation {
            message: "Validation failed".to_string(),
            violations: vec![Violation {
                field: field.to_string(),
                message: message.to_string(),
            }],
        }
    }

    /// Machine-readable code for the category
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Authentication(_) => "AUTHENTICATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Metadata(_) => "METADATA_ERROR",
            ApiError::Completion(_) => "COMPLETION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Metadata(_) | ApiError::Completion(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The low-level cause, present only on collaborator/internal variants
    fn cause(&self) -> Option<&str> {
        match self {
            ApiError::Storage(cause)
            | ApiError::Metadata(cause)
            | ApiError::Completion(cause)
            | ApiError::Internal(cause) => Some(cause),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Metadata(e.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Uniform error envelope serialized to every failing response
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub status: &'static str,
    pub message: String,
    #[serde(rename = "errorCode")]
    pub error_code: &'static str,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Violation>,
}

/// Centralized formatter: every error funnels through here, no handler
/// writes its own error JSON shape.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        // The request span (TraceLayer) carries method and path.
        tracing::error!(
            error_code = code,
            status = status.as_u16(),
            original_error = self.cause(),
            "{}",
            self
        );

        let violations = match self {
            ApiError::Validation { ref violations, .. } => violations.clone(),
            _ => Vec::new(),
        };

        let body = Json(ErrorEnvelope {
            status: "error",
            message: self.to_string(),
            error_code: code,
            timestamp: chrono::Utc::now().to_rfc3339(),
            errors: violations,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Shared 404 payload for unmatched routes
pub fn not_found_body(path: &str) -> serde_json::Value {
    json!({
        "status": "error",
        "message": "Endpoint not found",
        "errorCode": "NOT_FOUND",
        "path": path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_code_mapping() {
        let cases: Vec<(ApiError, StatusCode, &str)> = vec![
            (
                ApiError::invalid("prompt", "required"),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                ApiError::Authentication("Invalid authentication token".into()),
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_ERROR",
            ),
            (
                ApiError::NotFound("File not found".into()),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                ApiError::Storage("connect refused".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
            ),
            (
                ApiError::Metadata("pool closed".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "METADATA_ERROR",
            ),
            (
                ApiError::Completion("upstream 503".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMPLETION_ERROR",
            ),
            (
                ApiError::Internal("oops".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_collaborator_errors_hide_cause() {
        // Display must stay generic, never the wrapped cause
        let err = ApiError::Storage("SIGNATURE_MISMATCH for key uploads/u1/x".into());
        assert_eq!(err.to_string(), "Object storage request failed");

        let err = ApiError::Completion("401 from upstream".into());
        assert_eq!(err.to_string(), "Completion request failed");
    }

    #[test]
    fn test_envelope_carries_all_violations() {
        let err = ApiError::Validation {
            message: "Validation failed".into(),
            violations: vec![
                Violation {
                    field: "prompt".into(),
                    message: "prompt is required".into(),
                },
                Violation {
                    field: "temperature".into(),
                    message: "temperature must be at most 2".into(),
                },
            ],
        };

        if let ApiError::Validation { violations, .. } = &err {
            assert_eq!(violations.len(), 2);
        }
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
