use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::reset::ResetError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    RateLimited(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::RateLimited(msg) => write!(f, "Rate Limited: {msg}"),
            AppError::ServiceUnavailable(msg) => write!(f, "Service Unavailable: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

/// Boundary translation: collapse the token error kinds into one message so
/// the response never reveals whether a link was bogus, expired, or already
/// used, and keep store/notifier internals out of the payload.
impl From<ResetError> for AppError {
    fn from(err: ResetError) -> Self {
        match err {
            ResetError::TokenNotFound
            | ResetError::TokenExpired
            | ResetError::TokenAlreadyUsed => {
                AppError::BadRequest("Invalid or expired reset link".to_string())
            }
            ResetError::WeakPassword { min_len } => {
                AppError::BadRequest(format!("Password must be at least {min_len} characters"))
            }
            ResetError::Notification(msg) => {
                tracing::error!("Failed to send password reset email: {msg}");
                AppError::ServiceUnavailable(
                    "Could not send the reset email. Please try again.".to_string(),
                )
            }
            ResetError::Store(msg) => {
                tracing::error!("Store error: {msg}");
                AppError::ServiceUnavailable(
                    "Temporarily unavailable. Please try again.".to_string(),
                )
            }
            ResetError::Hash(msg) => AppError::Internal(msg),
            // Masked inside request_reset; reaching here is a bug.
            ResetError::AccountNotFound => {
                AppError::Internal("unmasked account lookup".to_string())
            }
        }
    }
}
