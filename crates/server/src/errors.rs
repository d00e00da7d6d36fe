use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use service::ServiceError;

/// JSON error body: `{"error": <title>, "message": <detail>}`
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &'static str, message: Option<String>) -> Self {
        Self { status, error, message }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(message.into()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({"error": self.error, "message": self.message});
        (self.status, Json(body)).into_response()
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let (status, title) = match &e {
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation Error"),
            ServiceError::InvalidPosition(_) => (StatusCode::BAD_REQUEST, "Invalid Position"),
            ServiceError::Conflict => (StatusCode::CONFLICT, "Version Conflict"),
            ServiceError::StorageUnavailable(_) => (StatusCode::BAD_GATEWAY, "Storage Unavailable"),
            ServiceError::InvalidDocument(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid Document"),
        };
        if status.is_server_error() {
            error!(code = e.code(), error = %e, "request failed");
        }
        Self::new(status, title, Some(e.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("storage backend unavailable: {0}")]
    Storage(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::Conflict, StatusCode::CONFLICT),
            (ServiceError::InvalidPosition("Q1".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::StorageUnavailable("timeout".into()), StatusCode::BAD_GATEWAY),
            (ServiceError::InvalidDocument("bad".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let api = JsonApiError::from(err);
            assert_eq!(api.status, status);
            assert!(api.message.is_some());
        }
    }

    #[test]
    fn storage_message_is_passed_through() {
        let api = JsonApiError::from(ServiceError::StorageUnavailable("GitHub API returned 401: Bad credentials".into()));
        assert!(api.message.unwrap().contains("Bad credentials"));
    }
}
