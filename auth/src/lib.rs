//! Authentication primitives library
//!
//! Provides the I/O-free building blocks of the identity service:
//! - Credential hashing (Argon2id, salt ‖ key, constant-time verification)
//! - Signed access tokens (HS256 JWT with a random `jti`)
//! - Injected clock and entropy sources
//! - Authentication coordination
//!
//! Session state, revocation and persistence live in the service that
//! consumes this crate.
//!
//! # Examples
//!
//! ## Credential Hashing
//! ```
//! use std::sync::Arc;
//! use auth::{CredentialHasher, HashParams, OsRandom};
//!
//! let params = HashParams { memory_kib: 1024, iterations: 1, parallelism: 4 };
//! let hasher = CredentialHasher::new(params, Arc::new(OsRandom)).unwrap();
//! let credential = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &credential));
//! assert!(!hasher.verify("my_password", "garbage"));
//! ```
//!
//! ## Access Tokens
//! ```
//! use std::sync::Arc;
//! use auth::{OsRandom, SystemClock, TokenCodec};
//!
//! let codec = TokenCodec::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     "identity-service",
//!     Arc::new(SystemClock),
//!     Arc::new(OsRandom),
//! )
//! .unwrap();
//! let issued = codec.issue("user123", "a@x.com", chrono::Duration::hours(1)).unwrap();
//! let claims = codec.parse(&issued.token).unwrap();
//! assert_eq!(claims.email, "a@x.com");
//! ```

pub mod authenticator;
pub mod clock;
pub mod jwt;
pub mod password;
pub mod random;

// Re-export commonly used items
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::DEFAULT_ISSUER;
pub use clock::Clock;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use jwt::Claims;
pub use jwt::IssuedToken;
pub use jwt::JwtError;
pub use jwt::TokenCodec;
pub use jwt::MIN_SECRET_LEN;
pub use password::CredentialHasher;
pub use password::HashParams;
pub use password::PasswordError;
pub use random::opaque_token;
pub use random::random_array;
pub use random::token_digest;
pub use random::OsRandom;
pub use random::RandomError;
pub use random::RandomSource;
