pub mod books;
pub mod health;
pub mod metrics;

// Common response types
use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::errors::{ApiError, DatabaseError, ValidationError};
use serde::Serialize;

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub trace_id: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
            trace_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        match self.error.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "method_not_allowed" => StatusCode::METHOD_NOT_ALLOWED,
            "request_timeout" => StatusCode::REQUEST_TIMEOUT,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let response = ErrorResponse::new(err.code, err.message);
        match err.details {
            Some(details) => response.with_details(details),
            None => response,
        }
    }
}

impl From<DatabaseError> for ErrorResponse {
    fn from(err: DatabaseError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<ValidationError> for ErrorResponse {
    fn from(err: ValidationError) -> Self {
        ApiError::from(err).into()
    }
}

impl From<JsonRejection> for ErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::InvalidJson(rejection.body_text()).into()
    }
}

/// Fallback for unknown routes
pub async fn not_found() -> ErrorResponse {
    ErrorResponse::new("not_found", "Not Found")
}

/// Give the empty 405 (routing) and 408 (timeout layer) responses the error envelope
pub async fn envelope_bare_errors(response: Response) -> Response {
    match response.status() {
        StatusCode::METHOD_NOT_ALLOWED => {
            let mut enveloped =
                ErrorResponse::new("method_not_allowed", "Method Not Allowed").into_response();
            if let Some(allow) = response.headers().get(header::ALLOW) {
                enveloped.headers_mut().insert(header::ALLOW, allow.clone());
            }
            enveloped
        }
        StatusCode::REQUEST_TIMEOUT => {
            tracing::warn!("Request timed out");
            ErrorResponse::new("request_timeout", "Request timed out").into_response()
        }
        _ => response,
    }
}
