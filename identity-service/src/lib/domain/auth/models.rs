use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::models::SessionId;
use crate::domain::user::models::UserProfile;

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: UserProfile,
    pub token: String,
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
}

/// Deadlines applied to every store call and every credential hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub store: std::time::Duration,
    pub hash: std::time::Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            store: std::time::Duration::from_secs(5),
            hash: std::time::Duration::from_secs(10),
        }
    }
}

/// Lifetimes of issued artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetimes {
    pub token: chrono::Duration,
    pub password_reset: chrono::Duration,
}

impl Default for Lifetimes {
    fn default() -> Self {
        Self {
            token: chrono::Duration::hours(24),
            password_reset: chrono::Duration::minutes(60),
        }
    }
}
