use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::errors::RepositoryError;
use crate::domain::session::models::ReapMode;
use crate::domain::session::models::Session;
use crate::domain::session::models::SessionId;
use crate::domain::session::ports::SessionRepository;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;

/// Process-local user store.
///
/// Uniqueness checks and inserts happen under one write lock, so concurrent
/// registrations of the same email resolve to exactly one winner.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;

        if users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict("users_email_key".to_string()));
        }
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict("users_pkey".to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn update(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound(user.id.to_string()));
        }
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.email == user.email)
        {
            return Err(RepositoryError::Conflict("users_email_key".to_string()));
        }

        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_password_reset(
        &self,
        id: &UserId,
        digest: &str,
        expires_at: DateTime<Utc>,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        user.password_reset_token_hash = Some(digest.to_string());
        user.password_reset_expires_at = Some(expires_at);
        user.updated_at = at;
        Ok(())
    }

    async fn set_credential(
        &self,
        id: &UserId,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        user.password_hash = Some(password_hash.to_string());
        user.password_reset_token_hash = None;
        user.password_reset_expires_at = None;
        user.updated_at = at;
        Ok(())
    }

    async fn consume_password_reset(
        &self,
        digest: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, RepositoryError> {
        let mut users = self.users.write().await;
        let Some(user) = users.values_mut().find(|user| {
            user.password_reset_token_hash.as_deref() == Some(digest)
                && user
                    .password_reset_expires_at
                    .is_some_and(|expires_at| expires_at >= now)
        }) else {
            return Ok(None);
        };

        user.password_hash = Some(password_hash.to_string());
        user.password_reset_token_hash = None;
        user.password_reset_expires_at = None;
        user.updated_at = now;
        Ok(Some(user.clone()))
    }

    async fn record_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        user.last_login_at = Some(at);
        Ok(())
    }
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored session, active or not.
    pub async fn all(&self) -> Vec<Session> {
        self.sessions.read().await.values().cloned().collect()
    }

    /// Overwrite the expiry of a stored session.
    pub async fn set_expiry(
        &self,
        id: &SessionId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        session.expires_at = expires_at;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, session: Session) -> Result<Session, RepositoryError> {
        let mut sessions = self.sessions.write().await;

        if sessions.values().any(|existing| existing.token == session.token) {
            return Err(RepositoryError::Conflict("sessions_token_key".to_string()));
        }
        if sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict("sessions_pkey".to_string()));
        }

        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_active_by_token(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .find(|session| session.is_active && session.token == token)
            .cloned())
    }

    async fn deactivate(&self, id: &SessionId) -> Result<(), RepositoryError> {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            if session.is_active {
                session.is_active = false;
                session.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn deactivate_all_for_user(&self, user_id: &UserId) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();
        let mut count = 0;

        for session in sessions
            .values_mut()
            .filter(|session| session.is_active && &session.user_id == user_id)
        {
            session.is_active = false;
            session.updated_at = now;
            count += 1;
        }

        Ok(count)
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        mode: ReapMode,
    ) -> Result<u64, RepositoryError> {
        let mut sessions = self.sessions.write().await;

        match mode {
            ReapMode::Deactivate => {
                let mut count = 0;
                for session in sessions
                    .values_mut()
                    .filter(|session| session.is_active && session.is_expired(now))
                {
                    session.is_active = false;
                    session.updated_at = now;
                    count += 1;
                }
                Ok(count)
            }
            ReapMode::Delete => {
                let before = sessions.len();
                sessions.retain(|_, session| !session.is_expired(now));
                Ok((before - sessions.len()) as u64)
            }
        }
    }
}
