use std::fmt;

use auth::random_array;
use auth::RandomError;
use auth::RandomSource;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::user::models::UserId;

/// Session unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a new random session ID from 16 bytes of entropy.
    pub fn generate(random: &dyn RandomSource) -> Result<Self, RandomError> {
        let bytes = random_array::<16>(random)?;
        Ok(Self(uuid::Builder::from_random_bytes(bytes).into_uuid()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Client details captured when a session is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMetadata {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// What the reaper does with expired sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReapMode {
    /// Mark expired active rows inactive
    Deactivate,
    /// Delete every expired row
    Delete,
}

/// Revocable record backing exactly one issued token.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub metadata: SessionMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Open a new active session for a freshly issued token.
    pub fn open(
        id: SessionId,
        user_id: UserId,
        token: String,
        expires_at: DateTime<Utc>,
        metadata: SessionMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            token,
            refresh_token: None,
            expires_at,
            is_active: true,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("is_active", &self.is_active)
            .field("metadata", &self.metadata)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
