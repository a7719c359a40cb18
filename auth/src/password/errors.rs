use thiserror::Error;

use crate::random::RandomError;

/// Error type for password operations.
///
/// Verification never fails with an error; a malformed stored credential
/// simply does not verify.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Salt generation failed: {0}")]
    Entropy(#[from] RandomError),

    #[error("Invalid hashing parameters: {0}")]
    InvalidParameters(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
