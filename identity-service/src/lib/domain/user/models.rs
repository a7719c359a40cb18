use std::fmt;
use std::str::FromStr;

use auth::random_array;
use auth::RandomError;
use auth::RandomSource;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::user::errors::EmailError;
use crate::domain::user::errors::PasswordPolicyError;
use crate::domain::user::errors::UserIdError;

/// User aggregate entity.
///
/// Represents a registered principal. The credential and reset fields never
/// leave the service; see [`UserProfile`] for the outward view.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub password_reset_token_hash: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a freshly registered, active user.
    ///
    /// Display name defaults to the first name, falling back to the local
    /// part of the email address.
    pub fn register(
        id: UserId,
        email: EmailAddress,
        password_hash: String,
        first_name: Option<String>,
        last_name: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let display_name = first_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| email.local_part().to_string());

        Self {
            id,
            email,
            password_hash: Some(password_hash),
            first_name,
            last_name,
            display_name: Some(display_name),
            is_active: true,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Arguments
    /// * `random` - Entropy source
    ///
    /// # Returns
    /// UserId holding a version 4 UUID built from 16 random bytes
    pub fn generate(random: &dyn RandomSource) -> Result<Self, RandomError> {
        let bytes = random_array::<16>(random)?;
        Ok(Self(uuid::Builder::from_random_bytes(bytes).into_uuid()))
    }

    /// Parse a user ID from string.
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Trimmed, lower-cased and validated with an RFC 5322 compliant parser, so
/// uniqueness in the store is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        let normalized = email.trim().to_lowercase();
        email_address::EmailAddress::from_str(&normalized)
            .map(|_| EmailAddress(normalized))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`.
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password that satisfies the password policy.
///
/// Never printed: `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    const MIN_LENGTH: usize = 8;
    const MAX_LENGTH: usize = 256;

    /// Validate a new password.
    ///
    /// # Errors
    /// * `TooShort` - Fewer than 8 characters
    /// * `TooLong` - More than 256 characters
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Command to register a new principal
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub password: Password,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl RegisterCommand {
    /// Construct a new registration command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `password` - Policy-checked password (hashed by the service)
    /// * `first_name` - Optional profile field
    /// * `last_name` - Optional profile field
    pub fn new(
        email: EmailAddress,
        password: Password,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            email,
            password,
            first_name,
            last_name,
        }
    }
}

/// Command to log in with raw credentials.
///
/// Left unvalidated: a malformed email must fail exactly like an unknown one.
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Safe identity view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub display_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.as_str().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            display_name: user.display_name.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login_at: user.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use auth::OsRandom;

    use super::*;

    #[test]
    fn test_email_is_normalized() {
        let email = EmailAddress::new("  Alice@Example.COM ".to_string()).unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
        assert_eq!(email.local_part(), "alice");
    }

    #[test]
    fn test_email_rejects_garbage() {
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
        assert!(EmailAddress::new("".to_string()).is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(matches!(
            Password::new("short".to_string()),
            Err(PasswordPolicyError::TooShort { min: 8, actual: 5 })
        ));
        assert!(Password::new("password123".to_string()).is_ok());
        assert!(matches!(
            Password::new("x".repeat(257)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("password123".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("password123"));
    }

    #[test]
    fn test_user_id_is_random_v4() {
        let a = UserId::generate(&OsRandom).unwrap();
        let b = UserId::generate(&OsRandom).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.0.get_version_num(), 4);
        assert_eq!(UserId::from_string(&a.to_string()).unwrap(), a);
    }

    #[test]
    fn test_register_defaults_display_name() {
        let id = UserId::generate(&OsRandom).unwrap();
        let email = EmailAddress::new("bob@x.com".to_string()).unwrap();

        let named = User::register(
            id,
            email.clone(),
            "hash".to_string(),
            Some("Robert".to_string()),
            None,
            Utc::now(),
        );
        assert_eq!(named.display_name.as_deref(), Some("Robert"));

        let anonymous = User::register(id, email, "hash".to_string(), None, None, Utc::now());
        assert_eq!(anonymous.display_name.as_deref(), Some("bob"));
        assert!(anonymous.is_active);
    }

    #[test]
    fn test_profile_hides_credentials() {
        let user = User::register(
            UserId::generate(&OsRandom).unwrap(),
            EmailAddress::new("a@x.com".to_string()).unwrap(),
            "secret-hash".to_string(),
            None,
            None,
            Utc::now(),
        );
        let json = serde_json::to_string(&UserProfile::from(&user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("a@x.com"));
    }
}
