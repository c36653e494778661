//! Error-kind to status-code mapping at the HTTP boundary.
//!
//! The observed system collapsed every failure into a 500; the error
//! taxonomy lets each kind pick its own status. The `{detail}` body shape
//! is unchanged.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use counsel_core::{ChatError, StorageError};
use serde_json::json;
use tracing::warn;

pub struct ApiError(ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(ChatError::Storage(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChatError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ChatError::Generation(_) => StatusCode::BAD_GATEWAY,
            ChatError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let detail = self.0.to_string();
        warn!("Request failed ({status}): {detail}");

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
