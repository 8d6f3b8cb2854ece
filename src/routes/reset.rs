use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The acknowledgement is identical whether or not the email is registered.
pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if let Err(retry_after) = state.reset_limiter.check(&req.email) {
        return Err(AppError::RateLimited(format!(
            "Too many reset requests. Try again in {retry_after} seconds."
        )));
    }

    state.reset.request_reset(&req.email).await?;

    Ok(Json(MessageResponse {
        message: "If that email is registered, a reset link has been sent.".to_string(),
    }))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if req.token.is_empty() {
        return Err(AppError::BadRequest(
            "Invalid or expired reset link".to_string(),
        ));
    }

    state.reset.reset_password(&req.token, &req.password).await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully.".to_string(),
    }))
}
