use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::JwtError;
use crate::clock::Clock;
use crate::random::opaque_token;
use crate::random::RandomSource;

/// Minimum accepted signing key length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const JTI_BYTES: usize = 16;

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Issues and parses HS256-signed access tokens.
///
/// Time checks run against the injected clock with no leeway. Only HS256
/// is accepted on parse, whatever the token header claims.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl TokenCodec {
    /// Create a new codec with a shared secret.
    ///
    /// # Arguments
    /// * `secret` - Symmetric signing key, at least 32 bytes
    /// * `issuer` - Value written to and required in the `iss` claim
    /// * `clock` - Time source for issuance and expiry checks
    /// * `random` - Source for token identifiers
    ///
    /// # Errors
    /// * `KeyTooShort` - Secret shorter than `MIN_SECRET_LEN`
    pub fn new(
        secret: &[u8],
        issuer: impl ToString,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, JwtError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtError::KeyTooShort {
                min: MIN_SECRET_LEN,
                actual: secret.len(),
            });
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            issuer: issuer.to_string(),
            clock,
            random,
        })
    }

    /// Issue a signed token for a subject.
    ///
    /// # Arguments
    /// * `subject_id` - User identifier
    /// * `subject_email` - User email
    /// * `ttl` - Token lifetime
    ///
    /// # Errors
    /// * `Entropy` - Token identifier could not be generated
    /// * `EncodingFailed` - Signing failed
    pub fn issue(
        &self,
        subject_id: &str,
        subject_email: &str,
        ttl: Duration,
    ) -> Result<IssuedToken, JwtError> {
        let jti = opaque_token(self.random.as_ref(), JTI_BYTES)?;
        let claims = Claims::for_subject(
            subject_id,
            subject_email,
            &self.issuer,
            jti,
            self.clock.now(),
            ttl,
        );

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token and extract its claims.
    ///
    /// # Errors
    /// * `Malformed` - Not a decodable token, or claims missing
    /// * `AlgorithmMismatch` - Header names an algorithm other than HS256
    /// * `InvalidSignature` - Signature does not verify
    /// * `TokenExpired` - Expiry has elapsed
    /// * `NotYetValid` - Not-before lies in the future
    pub fn parse(&self, token: &str) -> Result<Claims, JwtError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation()).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                    ErrorKind::InvalidAlgorithm
                    | ErrorKind::InvalidAlgorithmName
                    | ErrorKind::MissingAlgorithm => JwtError::AlgorithmMismatch,
                    _ => JwtError::Malformed(e.to_string()),
                }
            })?;

        let claims = token_data.claims;
        let now = self.clock.now().timestamp();

        if claims.is_expired(now) {
            return Err(JwtError::TokenExpired);
        }
        if claims.is_premature(now) {
            return Err(JwtError::NotYetValid);
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        // Expiry and not-before are checked against the injected clock
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp", "nbf", "sub", "iss"].map(String::from));
        validation.set_issuer(&[self.issuer.as_str()]);
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::random::OsRandom;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    fn codec_with_clock(secret: &[u8], clock: Arc<ManualClock>) -> TokenCodec {
        TokenCodec::new(secret, "identity-service", clock, Arc::new(OsRandom)).unwrap()
    }

    #[test]
    fn test_issue_and_parse() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with_clock(SECRET, clock);

        let issued = codec
            .issue("user123", "a@x.com", Duration::hours(1))
            .expect("Failed to issue token");
        assert_eq!(issued.token.split('.').count(), 3);

        let claims = codec.parse(&issued.token).expect("Failed to parse token");
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.email, "a@x.com");
    }

    #[test]
    fn test_tokens_issued_same_instant_differ() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with_clock(SECRET, clock);

        let first = codec.issue("user123", "a@x.com", Duration::hours(1)).unwrap();
        let second = codec.issue("user123", "a@x.com", Duration::hours(1)).unwrap();

        assert_eq!(first.claims.iat, second.claims.iat);
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_short_key_rejected() {
        let result = TokenCodec::new(
            b"too-short",
            "identity-service",
            Arc::new(ManualClock::starting_now()),
            Arc::new(OsRandom),
        );
        assert!(matches!(
            result,
            Err(JwtError::KeyTooShort { min: 32, actual: 9 })
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with_clock(SECRET, Arc::clone(&clock));
        let ttl = Duration::minutes(30);

        let issued = codec.issue("user123", "a@x.com", ttl).unwrap();

        clock.advance(ttl - Duration::seconds(1));
        assert!(codec.parse(&issued.token).is_ok());

        clock.advance(Duration::seconds(2));
        assert_eq!(codec.parse(&issued.token), Err(JwtError::TokenExpired));
    }

    #[test]
    fn test_not_before_in_future_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with_clock(SECRET, Arc::clone(&clock));

        let issued = codec.issue("user123", "a@x.com", Duration::hours(1)).unwrap();

        clock.advance(Duration::seconds(-5));
        assert_eq!(codec.parse(&issued.token), Err(JwtError::NotYetValid));
    }

    #[test]
    fn test_parse_with_wrong_secret() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec1 = codec_with_clock(b"secret1_at_least_32_bytes_long_key!", Arc::clone(&clock));
        let codec2 = codec_with_clock(b"secret2_at_least_32_bytes_long_key!", clock);

        let issued = codec1.issue("user123", "a@x.com", Duration::hours(1)).unwrap();

        assert_eq!(codec2.parse(&issued.token), Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_tampered_claims_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with_clock(SECRET, clock);
        let issued = codec.issue("user123", "a@x.com", Duration::hours(1)).unwrap();
        let other = codec.issue("admin", "root@x.com", Duration::hours(1)).unwrap();

        let parts: Vec<&str> = issued.token.split('.').collect();
        let other_parts: Vec<&str> = other.token.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert_eq!(codec.parse(&forged), Err(JwtError::InvalidSignature));
    }

    #[test]
    fn test_other_hmac_algorithm_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with_clock(SECRET, Arc::clone(&clock));
        let issued = codec.issue("user123", "a@x.com", Duration::hours(1)).unwrap();

        // Same key, same claims, different algorithm in the header
        let forged = encode(
            &Header::new(Algorithm::HS512),
            &issued.claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert_eq!(codec.parse(&forged), Err(JwtError::AlgorithmMismatch));
    }

    #[test]
    fn test_unsigned_token_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with_clock(SECRET, clock);
        let issued = codec.issue("user123", "a@x.com", Duration::hours(1)).unwrap();
        let payload = issued.token.split('.').nth(1).unwrap();

        // {"alg":"none","typ":"JWT"}
        let forged = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{}.", payload);

        assert!(codec.parse(&forged).is_err());
    }

    #[test]
    fn test_parse_garbage() {
        let codec = codec_with_clock(SECRET, Arc::new(ManualClock::starting_now()));

        assert!(matches!(codec.parse("invalid.token.here"), Err(JwtError::Malformed(_))));
        assert!(matches!(codec.parse(""), Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let clock = Arc::new(ManualClock::starting_now());
        let ours = codec_with_clock(SECRET, Arc::clone(&clock));
        let theirs = TokenCodec::new(SECRET, "someone-else", clock, Arc::new(OsRandom)).unwrap();

        let issued = theirs.issue("user123", "a@x.com", Duration::hours(1)).unwrap();

        assert!(matches!(ours.parse(&issued.token), Err(JwtError::Malformed(_))));
    }
}
