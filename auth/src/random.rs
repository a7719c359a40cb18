use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::rand_core::RngCore;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

/// Error raised when the entropy source cannot produce bytes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Entropy source failure: {0}")]
pub struct RandomError(pub String);

/// Source of cryptographically secure random bytes.
///
/// Salts, token identifiers and entity identifiers are all drawn from an
/// injected source so tests can substitute a deterministic one.
pub trait RandomSource: Send + Sync + 'static {
    /// Fill `dest` entirely with random bytes.
    ///
    /// # Errors
    /// * `RandomError` - The underlying source failed
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), RandomError>;
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn try_fill(&self, dest: &mut [u8]) -> Result<(), RandomError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| RandomError(e.to_string()))
    }
}

/// Draw a fixed-width array from `source`.
pub fn random_array<const N: usize>(source: &dyn RandomSource) -> Result<[u8; N], RandomError> {
    let mut bytes = [0u8; N];
    source.try_fill(&mut bytes)?;
    Ok(bytes)
}

/// Generate an opaque URL-safe token carrying `byte_len` bytes of entropy.
///
/// # Arguments
/// * `source` - Entropy source
/// * `byte_len` - Number of random bytes before encoding
///
/// # Returns
/// Unpadded URL-safe base64 string
pub fn opaque_token(source: &dyn RandomSource, byte_len: usize) -> Result<String, RandomError> {
    let mut bytes = vec![0u8; byte_len];
    source.try_fill(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// SHA-256 digest of an opaque token, for storage in place of the token.
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
