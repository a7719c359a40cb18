use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Identity claims carried by an access token.
///
/// Standard RFC 7519 time claims are Unix timestamps in seconds.
/// `jti` is random per issuance so two tokens minted in the same second
/// for the same subject never collide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier)
    pub sub: String,

    /// Subject email
    pub email: String,

    /// Issued at
    pub iat: i64,

    /// Not before
    pub nbf: i64,

    /// Expiration time
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// Unique token identifier
    pub jti: String,
}

impl Claims {
    /// Build claims for a subject valid from `now` for `ttl`.
    ///
    /// # Arguments
    /// * `subject` - Unique user identifier
    /// * `email` - Subject email address
    /// * `issuer` - Issuing service name
    /// * `jti` - Random token identifier
    /// * `now` - Issuance instant
    /// * `ttl` - Lifetime of the token
    pub fn for_subject(
        subject: impl ToString,
        email: impl ToString,
        issuer: impl ToString,
        jti: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let issued_at = now.timestamp();

        Self {
            sub: subject.to_string(),
            email: email.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: (now + ttl).timestamp(),
            iss: issuer.to_string(),
            jti,
        }
    }

    /// Check if token is expired.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }

    /// Check if token is not valid yet.
    pub fn is_premature(&self, current_timestamp: i64) -> bool {
        self.nbf > current_timestamp
    }

    /// Expiration as an instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
