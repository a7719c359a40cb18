use std::sync::Arc;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::clock::Clock;
use crate::clock::SystemClock;
use crate::jwt::Claims;
use crate::jwt::IssuedToken;
use crate::jwt::JwtError;
use crate::jwt::TokenCodec;
use crate::password::CredentialHasher;
use crate::password::HashParams;
use crate::password::PasswordError;
use crate::random::OsRandom;
use crate::random::RandomSource;

/// Issuer written into every token unless overridden.
pub const DEFAULT_ISSUER: &str = "identity-service";

/// Authentication coordinator combining credential verification and token issuance.
///
/// Owns the injected clock and entropy source so every component built from
/// it shares the same notion of time and randomness.
pub struct Authenticator {
    password_hasher: CredentialHasher,
    token_codec: TokenCodec,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    decoy_credential: String,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create an authenticator with production defaults.
    ///
    /// Uses the system clock, the OS entropy source and the default Argon2id
    /// parameters.
    ///
    /// # Errors
    /// * `JwtError::KeyTooShort` - Secret shorter than 32 bytes
    pub fn new(jwt_secret: &[u8]) -> Result<Self, AuthenticationError> {
        Self::with_sources(
            jwt_secret,
            DEFAULT_ISSUER,
            HashParams::default(),
            Arc::new(SystemClock),
            Arc::new(OsRandom),
        )
    }

    /// Create an authenticator with explicit parameters and sources.
    ///
    /// # Arguments
    /// * `jwt_secret` - Token signing key, at least 32 bytes
    /// * `issuer` - Token issuer
    /// * `params` - Argon2id cost parameters
    /// * `clock` - Time source
    /// * `random` - Entropy source
    ///
    /// # Errors
    /// * `JwtError::KeyTooShort` - Secret shorter than 32 bytes
    /// * `PasswordError` - Invalid hashing parameters or entropy failure
    pub fn with_sources(
        jwt_secret: &[u8],
        issuer: &str,
        params: HashParams,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, AuthenticationError> {
        let token_codec = TokenCodec::new(jwt_secret, issuer, Arc::clone(&clock), Arc::clone(&random))?;
        let password_hasher = CredentialHasher::new(params, Arc::clone(&random))?;
        let decoy_credential = password_hasher.hash("decoy-credential")?;

        Ok(Self {
            password_hasher,
            token_codec,
            clock,
            random,
            decoy_credential,
        })
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Entropy or hashing failure
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a password against a stored credential.
    pub fn verify_password(&self, password: &str, stored_credential: &str) -> bool {
        self.password_hasher.verify(password, stored_credential)
    }

    /// Spend the same work as a real verification and fail.
    ///
    /// Used when no stored credential exists so that response time does not
    /// reveal whether the account exists.
    pub fn reject_without_credential(&self, password: &str) -> AuthenticationError {
        let _ = self.password_hasher.verify(password, &self.decoy_credential);
        AuthenticationError::InvalidCredentials
    }

    /// Verify credentials and issue a token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_credential` - Stored credential, if the account has one
    /// * `subject_id` - User identifier for the token
    /// * `subject_email` - User email for the token
    /// * `ttl` - Token lifetime
    ///
    /// # Errors
    /// * `InvalidCredentials` - No credential, or password does not match
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_credential: Option<&str>,
        subject_id: &str,
        subject_email: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, AuthenticationError> {
        let Some(stored_credential) = stored_credential else {
            return Err(self.reject_without_credential(password));
        };

        if !self.password_hasher.verify(password, stored_credential) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        Ok(self.token_codec.issue(subject_id, subject_email, ttl)?)
    }

    /// Issue a token without password verification.
    ///
    /// Used right after registration, where the credential was just created.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token(
        &self,
        subject_id: &str,
        subject_email: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, JwtError> {
        self.token_codec.issue(subject_id, subject_email, ttl)
    }

    /// Verify a token's signature and time window and return its claims.
    ///
    /// Does not consult any session state.
    ///
    /// # Errors
    /// * `JwtError` - Token invalid, expired or not yet valid
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        self.token_codec.parse(token)
    }

    /// Current instant from the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Injected entropy source.
    pub fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }
}
