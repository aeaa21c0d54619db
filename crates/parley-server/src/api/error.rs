//! Mapping of dialogue failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parley_dialog::DialogError;

/// A plain-text error response.
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

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<DialogError> for ApiError {
    fn from(err: DialogError) -> Self {
        let status = match &err {
            DialogError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            DialogError::NotStateful(_) | DialogError::FirstTurnRequired(_) => StatusCode::CONFLICT,
            DialogError::EngineCreation(_)
            | DialogError::QueryFailed { .. }
            | DialogError::ResetFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, format!("Error: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}
