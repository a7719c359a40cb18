use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::register::AuthResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::user::models::LoginCommand;
use crate::inbound::http::metadata::ClientMetadata;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    ClientMetadata(metadata): ClientMetadata,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    let command = LoginCommand {
        email: body.email,
        password: body.password,
    };

    state
        .auth_service
        .login(command, metadata)
        .await
        .map_err(ApiError::from)
        .map(|result| ApiSuccess::new(StatusCode::OK, result.into()))
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}
