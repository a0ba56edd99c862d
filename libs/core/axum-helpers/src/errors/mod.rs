pub mod handlers;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::DatabaseError;
use serde::Serialize;
use thiserror::Error;

/// Body of every error response.
///
/// ```json
/// {
///   "error": "ServiceUnavailable",
///   "message": "db not connected"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Database(
                e @ (DatabaseError::NotConnected | DatabaseError::ConnectionFailed(_)),
            ) => (StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable", e.to_string()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "A database error occurred".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg.clone()),
            AppError::InternalServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalServerError",
                "An internal error occurred".to_string(),
            ),
            AppError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ServiceUnavailable", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = self.parts();

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::info!("{}", self);
        }

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            details: None,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_not_connected_maps_to_503() {
        let (status, body) = render(DatabaseError::NotConnected.into()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({"error": "ServiceUnavailable", "message": "db not connected"})
        );
    }

    #[tokio::test]
    async fn test_unresolved_model_hides_details() {
        let (status, body) =
            render(DatabaseError::UnresolvedModel("Note".to_string()).into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "InternalServerError");
    }

    #[tokio::test]
    async fn test_not_found_fallback() {
        let response = handlers::not_found().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
