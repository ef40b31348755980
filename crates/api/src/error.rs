use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use storage::repository::StorageError;
use thiserror::Error;

/// Errors surfaced by the HTTP boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(StorageError::Conflict) => StatusCode::CONFLICT,
            Self::Storage(StorageError::Serialization(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(StorageError::Connection(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(%status, error = %self, "request failed");
        let body = Json(json!({ "message": self.to_string(), "error": true }));
        (status, body).into_response()
    }
}
