use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use weather_core::QueryError;

/// Error returned by handlers, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Map an error and expose its own message on 500s.
    pub fn surface(err: QueryError) -> Self {
        let message = err.to_string();
        Self::map(err, message)
    }

    /// Map an error but hide internal failures behind `fallback`.
    pub fn generic(err: QueryError, fallback: &str) -> Self {
        let message = match &err {
            QueryError::Validation(m) | QueryError::NotFound(m) => m.clone(),
            _ => fallback.to_string(),
        };
        Self::map(err, message)
    }

    fn map(err: QueryError, message: String) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        } else {
            tracing::debug!(error = %err, %status, "request rejected");
        }
        Self::new(status, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Adapter failures (including "Location not found") are 500s; only store
/// lookups produce 404.
pub fn status_for(err: &QueryError) -> StatusCode {
    match err {
        QueryError::Validation(_) => StatusCode::BAD_REQUEST,
        QueryError::NotFound(_) => StatusCode::NOT_FOUND,
        QueryError::Upstream(_) | QueryError::Store(_) | QueryError::Adapter(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Malformed or mistyped JSON bodies are client errors.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "request body rejected");
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
