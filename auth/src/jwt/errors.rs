use thiserror::Error;

use crate::random::RandomError;

/// Error type for JWT operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Signing key too short: minimum {min} bytes, got {actual}")]
    KeyTooShort { min: usize, actual: usize },

    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token identifier generation failed: {0}")]
    Entropy(#[from] RandomError),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token signing algorithm is not accepted")]
    AlgorithmMismatch,

    #[error("Token is expired")]
    TokenExpired,

    #[error("Token is not valid yet")]
    NotYetValid,
}
