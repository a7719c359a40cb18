use async_trait::async_trait;
use auth::Claims;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::AuthResult;
use crate::domain::session::models::SessionMetadata;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;

/// Port for authentication and session operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new principal and open its first session.
    ///
    /// # Arguments
    /// * `command` - Validated email, password and profile fields
    /// * `metadata` - Client details recorded on the session
    ///
    /// # Returns
    /// Safe identity view and a freshly issued token
    ///
    /// # Errors
    /// * `DuplicateEmail` - Email already registered (pre-check or store conflict)
    /// * `InfrastructureTimeout` - Store or hash exceeded its deadline
    async fn register(
        &self,
        command: RegisterCommand,
        metadata: SessionMetadata,
    ) -> Result<AuthResult, AuthError>;

    /// Authenticate with email and password and open a new session.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email, no credential, or wrong password
    /// * `AccountDisabled` - Password matched but the account is inactive
    /// * `InfrastructureTimeout` - Store or hash exceeded its deadline
    async fn login(
        &self,
        command: LoginCommand,
        metadata: SessionMetadata,
    ) -> Result<AuthResult, AuthError>;

    /// Validate a token against its signature, time window and session.
    ///
    /// # Returns
    /// Identity claims carried by the token
    ///
    /// # Errors
    /// * `TokenMalformed` / `TokenInvalidSignature` / `TokenExpired` / `TokenNotYetValid`
    /// * `SessionRevoked` - No active session for this token
    /// * `InfrastructureTimeout` - Session lookup exceeded its deadline
    async fn validate(&self, token: &str) -> Result<Claims, AuthError>;

    /// Revoke the session bound to a token.
    ///
    /// Idempotent: unknown or already revoked tokens succeed.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;

    /// Revoke every active session of a user.
    ///
    /// # Returns
    /// Number of sessions revoked
    async fn logout_all(&self, user_id: &UserId) -> Result<u64, AuthError>;

    /// Safe identity view of a user.
    ///
    /// # Errors
    /// * `UserNotFound` - No such user
    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError>;

    /// Replace the password after verifying the current one.
    ///
    /// Revokes every session of the user on success.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Current password wrong
    /// * `InvalidInput` - New password violates the policy
    async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Start a password reset.
    ///
    /// Succeeds whether or not the email belongs to an account.
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Complete a password reset with the token from `request_password_reset`.
    ///
    /// Revokes every session of the user on success.
    ///
    /// # Errors
    /// * `InvalidResetToken` - Unknown or expired token
    /// * `InvalidInput` - New password violates the policy
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;
}

/// Hook through which password reset tokens reach their owner.
#[async_trait]
pub trait PasswordResetNotifier: Send + Sync + 'static {
    /// Deliver a reset token.
    ///
    /// # Arguments
    /// * `user` - Account the reset was requested for
    /// * `token` - Plaintext single-use token
    /// * `expires_at` - Instant after which the token is rejected
    async fn notify_password_reset(
        &self,
        user: &User,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), anyhow::Error>;
}
