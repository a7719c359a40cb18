use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Replace the caller's password. Every session, including this one, is revoked.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth_service
        .change_password(&user.user_id, &body.current_password, &body.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Clone, Deserialize)]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}
