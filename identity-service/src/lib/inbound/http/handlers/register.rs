use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::AuthResult;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::UserProfile;
use crate::inbound::http::metadata::ClientMetadata;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    ClientMetadata(metadata): ClientMetadata,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    state
        .auth_service
        .register(body.try_into_command()?, metadata)
        .await
        .map_err(ApiError::from)
        .map(|result| ApiSuccess::new(StatusCode::CREATED, result.into()))
}

/// HTTP request body for registration (raw JSON)
#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseRegisterRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ParseRegisterRequestError> {
        let email = EmailAddress::new(self.email)?;
        let password = Password::new(self.password)?;
        Ok(RegisterCommand::new(
            email,
            password,
            self.first_name,
            self.last_name,
        ))
    }
}

impl From<ParseRegisterRequestError> for ApiError {
    fn from(err: ParseRegisterRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}

/// Body returned by registration and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResponseData {
    pub user: UserProfile,
    pub token: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthResult> for AuthResponseData {
    fn from(result: AuthResult) -> Self {
        Self {
            user: result.user,
            token: result.token,
            session_id: result.session_id.to_string(),
            expires_at: result.expires_at,
        }
    }
}
