use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

/// Start a password reset. The answer is the same whether or not the email
/// belongs to an account.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> Result<ApiSuccess<PasswordResetResponseData>, ApiError> {
    state
        .auth_service
        .request_password_reset(&body.email)
        .await
        .map_err(ApiError::from)
        .map(|_| {
            ApiSuccess::new(
                StatusCode::ACCEPTED,
                PasswordResetResponseData {
                    message: "If the account exists, a password reset has been issued".to_string(),
                },
            )
        })
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ConfirmPasswordResetRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth_service
        .reset_password(&body.token, &body.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetRequest {
    email: String,
}

#[derive(Clone, Deserialize)]
pub struct ConfirmPasswordResetRequest {
    token: String,
    new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordResetResponseData {
    pub message: String,
}
