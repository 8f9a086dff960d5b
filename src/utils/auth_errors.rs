// API error type shared by all handlers
// Every error surfaces as {"detail": {field: message}}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Error envelope returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: HashMap<String, String>,
}

impl ErrorResponse {
    pub fn single(field: &str, message: &str) -> Self {
        let mut detail = HashMap::new();
        detail.insert(field.to_string(), message.to_string());
        Self { detail }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(HashMap<String, String>),

    #[error("Incorrect login or password")]
    BadCredentials,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Missing or invalid authorization header")]
    MissingToken,

    #[error("Not enough permissions")]
    Forbidden(String),

    #[error("Conflict")]
    Conflict(HashMap<String, String>),

    #[error("{1}")]
    NotFound(&'static str, String),

    #[error("{1}")]
    BadRequest(&'static str, String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Backend unavailable")]
    BackendUnavailable,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn token(message: &str) -> Self {
        ApiError::TokenInvalid(message.to_string())
    }

    pub fn not_found(field: &'static str, message: &str) -> Self {
        ApiError::NotFound(field, message.to_string())
    }

    pub fn bad_request(field: &'static str, message: &str) -> Self {
        ApiError::BadRequest(field, message.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadCredentials => StatusCode::UNAUTHORIZED,
            ApiError::TokenInvalid(_) => StatusCode::UNAUTHORIZED,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_, _) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_, _) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn envelope(&self) -> ErrorResponse {
        match self {
            ApiError::Validation(fields) => ErrorResponse {
                detail: fields.clone(),
            },
            ApiError::BadCredentials => {
                ErrorResponse::single("authentication", "Incorrect login or password")
            }
            ApiError::TokenInvalid(message) => ErrorResponse::single("token", message),
            ApiError::MissingToken => {
                ErrorResponse::single("token", "Missing or invalid token")
            }
            ApiError::Forbidden(message) => ErrorResponse::single("permission", message),
            ApiError::Conflict(fields) => ErrorResponse {
                detail: fields.clone(),
            },
            ApiError::NotFound(field, message) => ErrorResponse::single(field, message),
            ApiError::BadRequest(field, message) => ErrorResponse::single(field, message),
            ApiError::RateLimited => ErrorResponse::single("rate_limit", "Too many requests"),
            ApiError::BackendUnavailable => {
                ErrorResponse::single("service", "Service temporarily unavailable")
            }
            ApiError::Internal => {
                // Detail suppressed for internal failures
                ErrorResponse::single("error", "An unexpected error occurred")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("nope".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ApiError::RateLimited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::BackendUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_bad_credentials_envelope_is_neutral() {
        let envelope = ApiError::BadCredentials.envelope();
        assert_eq!(
            envelope.detail.get("authentication").map(String::as_str),
            Some("Incorrect login or password")
        );
    }

    #[test]
    fn test_conflict_envelope_preserves_fields() {
        let mut fields = HashMap::new();
        fields.insert("login".to_string(), "taken".to_string());
        fields.insert("email".to_string(), "taken".to_string());

        let envelope = ApiError::Conflict(fields).envelope();
        assert_eq!(envelope.detail.len(), 2);
    }

    #[test]
    fn test_internal_detail_suppressed() {
        let envelope = ApiError::Internal.envelope();
        assert_eq!(
            envelope.detail.get("error").map(String::as_str),
            Some("An unexpected error occurred")
        );
    }
}
