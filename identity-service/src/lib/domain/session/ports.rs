use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::errors::RepositoryError;
use crate::domain::session::models::ReapMode;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::user::models::UserId;

/// Persistence operations for sessions.
///
/// Every mutation is a single-row (or single-statement) atomic update, and a
/// deactivation must be visible to any lookup that starts after it returns.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Persist a new session.
    ///
    /// # Errors
    /// * `Conflict` - A session already exists for this token
    /// * `Database` - Database operation failed
    async fn create(&self, session: Session) -> Result<Session, RepositoryError>;

    /// Find the active session bound to a token string.
    ///
    /// Expired rows that are still flagged active are returned; expiry is
    /// checked by the caller.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_active_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError>;

    /// Mark a session inactive.
    ///
    /// Idempotent: unknown or already inactive sessions are not an error.
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn deactivate(&self, id: &SessionId) -> Result<(), RepositoryError>;

    /// Mark every active session of a user inactive.
    ///
    /// # Returns
    /// Number of sessions deactivated
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn deactivate_all_for_user(&self, user_id: &UserId) -> Result<u64, RepositoryError>;

    /// Expire sessions whose expiry lies before `now`.
    ///
    /// # Arguments
    /// * `now` - Reference instant
    /// * `mode` - Deactivate active rows, or delete all expired rows
    ///
    /// # Returns
    /// Number of rows affected
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn purge_expired(&self, now: DateTime<Utc>, mode: ReapMode)
        -> Result<u64, RepositoryError>;
}
