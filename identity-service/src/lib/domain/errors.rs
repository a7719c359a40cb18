use thiserror::Error;

/// Error for record store operations.
///
/// Shared by the user and session repositories. Uniqueness violations are
/// reported as `Conflict` so callers can tell them apart from other failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),
}
