use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::errors::RepositoryError;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;

/// Persistence operations for the user aggregate.
///
/// Email uniqueness is enforced here, not by callers.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Arguments
    /// * `user` - User entity to create
    ///
    /// # Returns
    /// Created user entity
    ///
    /// # Errors
    /// * `Conflict` - Email is already registered
    /// * `Database` - Database operation failed
    async fn create(&self, user: User) -> Result<User, RepositoryError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Retrieve user by email address.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError>;

    /// Update existing user in storage.
    ///
    /// Writes every mutable column. Credential and reset changes go through
    /// the narrower methods below so they cannot be overwritten by a stale copy.
    ///
    /// # Arguments
    /// * `user` - User entity with updated fields
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Conflict` - New email is already registered
    /// * `Database` - Database operation failed
    async fn update(&self, user: User) -> Result<User, RepositoryError>;

    /// Store a pending password reset without touching other columns.
    ///
    /// # Arguments
    /// * `id` - User holding the reset
    /// * `digest` - SHA-256 digest of the opaque reset token
    /// * `expires_at` - Instant after which the reset is no longer accepted
    /// * `at` - Modification timestamp
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Database operation failed
    async fn set_password_reset(
        &self,
        id: &UserId,
        digest: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Replace the stored credential and clear any pending reset.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Database operation failed
    async fn set_credential(
        &self,
        id: &UserId,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Consume a pending reset and store the new credential in one atomic step.
    ///
    /// A reset matches when its digest equals `digest` and it has not expired
    /// at `now`. At most one caller consumes a given reset.
    ///
    /// # Returns
    /// Updated user, or None if no unexpired reset matches
    ///
    /// # Errors
    /// * `Database` - Database operation failed
    async fn consume_password_reset(
        &self,
        digest: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError>;

    /// Stamp the last successful login without touching other columns.
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Database operation failed
    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}
