//! Server error types and their HTTP mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use careline_core::ChatError;
use serde_json::json;

/// Failures that stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Socket binding or serving failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The chat core failed to initialize.
    #[error("core error: {0}")]
    Core(#[from] ChatError),
}

/// A handler-level failure, rendered as a JSON error body.
#[derive(Debug)]
pub struct ApiError(ChatError);

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ChatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ChatError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ChatError::RoomNotFound(_) | ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ChatError::Conflict(_) | ChatError::RoomTerminal(_) => StatusCode::CONFLICT,
            ChatError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
