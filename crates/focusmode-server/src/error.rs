use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use focusmode_core::{SessionError, ValidationError};
use tracing::error;

/// A handler failure rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match &err {
            SessionError::Validation(_) => StatusCode::BAD_REQUEST,
            SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
            SessionError::Transport(_) => StatusCode::BAD_GATEWAY,
            SessionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !err.is_client_error() {
            error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<focusmode_core::DatabaseError> for ApiError {
    fn from(err: focusmode_core::DatabaseError) -> Self {
        SessionError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}
