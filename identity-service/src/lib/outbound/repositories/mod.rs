pub mod memory;
pub mod session;
pub mod user;

pub use memory::InMemorySessionRepository;
pub use memory::InMemoryUserRepository;
pub use session::PostgresSessionRepository;
pub use user::PostgresUserRepository;

use crate::domain::errors::RepositoryError;

impl From<sqlx::Error> for RepositoryError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return RepositoryError::Conflict(
                    db_err.constraint().unwrap_or("unique").to_string(),
                );
            }
        }
        RepositoryError::Database(e.to_string())
    }
}
