use auth::AuthenticationError;
use auth::JwtError;
use auth::PasswordError;
use auth::RandomError;
use thiserror::Error;

use crate::domain::errors::RepositoryError;
use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;

/// Top-level error for authentication and session operations.
///
/// Credential and token variants carry no detail about which check failed
/// beyond their kind; infrastructure variants carry full context for logs.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    // Input validation errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Credential errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Email already registered")]
    DuplicateEmail,

    // Token errors
    #[error("Token is malformed")]
    TokenMalformed,

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token signature is invalid")]
    TokenInvalidSignature,

    #[error("Token is not valid yet")]
    TokenNotYetValid,

    #[error("Session has been revoked")]
    SessionRevoked,

    #[error("Session already exists for token")]
    SessionConflict,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("User not found: {0}")]
    UserNotFound(String),

    // Infrastructure errors
    #[error("Infrastructure timeout: {0}")]
    InfrastructureTimeout(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::InfrastructureTimeout(_))
    }
}

impl From<EmailError> for AuthError {
    fn from(err: EmailError) -> Self {
        AuthError::InvalidInput(err.to_string())
    }
}

impl From<PasswordPolicyError> for AuthError {
    fn from(err: PasswordPolicyError) -> Self {
        AuthError::InvalidInput(err.to_string())
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::Credential(err.to_string())
    }
}

impl From<RandomError> for AuthError {
    fn from(err: RandomError) -> Self {
        AuthError::Credential(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Malformed(_) => AuthError::TokenMalformed,
            JwtError::InvalidSignature | JwtError::AlgorithmMismatch => {
                AuthError::TokenInvalidSignature
            }
            JwtError::TokenExpired => AuthError::TokenExpired,
            JwtError::NotYetValid => AuthError::TokenNotYetValid,
            JwtError::KeyTooShort { .. } => AuthError::Configuration(err.to_string()),
            JwtError::EncodingFailed(_) | JwtError::Entropy(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthenticationError> for AuthError {
    fn from(err: AuthenticationError) -> Self {
        match err {
            AuthenticationError::InvalidCredentials => AuthError::InvalidCredentials,
            AuthenticationError::PasswordError(e) => e.into(),
            AuthenticationError::JwtError(e) => e.into(),
        }
    }
}
