use std::sync::Arc;

use ::argon2::Algorithm;
use ::argon2::Argon2;
use ::argon2::Params;
use ::argon2::Version;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;

use super::errors::PasswordError;
use crate::random::random_array;
use crate::random::RandomSource;

/// Length of the per-credential random salt.
pub const SALT_LEN: usize = 16;

/// Length of the derived key.
pub const KEY_LEN: usize = 32;

const ENCODED_LEN: usize = SALT_LEN + KEY_LEN;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 1,
            parallelism: 4,
        }
    }
}

/// Password credential hasher.
///
/// Produces `base64(salt ‖ argon2id(password, salt))` with a fresh 16-byte
/// salt per call and a 32-byte derived key. Each call is pure given its salt,
/// so a single hasher can be shared across threads.
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    random: Arc<dyn RandomSource>,
}

impl CredentialHasher {
    /// Create a new hasher.
    ///
    /// # Arguments
    /// * `params` - Argon2id cost parameters
    /// * `random` - Salt source
    ///
    /// # Errors
    /// * `InvalidParameters` - Parameters rejected by Argon2
    pub fn new(params: HashParams, random: Arc<dyn RandomSource>) -> Result<Self, PasswordError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| PasswordError::InvalidParameters(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            random,
        })
    }

    /// Hash a plaintext password for storage.
    ///
    /// # Returns
    /// Standard base64 encoding of salt followed by derived key
    ///
    /// # Errors
    /// * `Entropy` - Salt could not be generated
    /// * `HashingFailed` - Key derivation failed
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let salt: [u8; SALT_LEN] = random_array(self.random.as_ref())?;
        let key = self.derive(plaintext, &salt)?;

        let mut combined = [0u8; ENCODED_LEN];
        combined[..SALT_LEN].copy_from_slice(&salt);
        combined[SALT_LEN..].copy_from_slice(&key);

        Ok(STANDARD.encode(combined))
    }

    /// Verify a plaintext password against a stored credential.
    ///
    /// Returns false for any credential that does not decode to exactly
    /// salt length plus key length bytes. Key comparison is constant-time.
    pub fn verify(&self, plaintext: &str, encoded: &str) -> bool {
        let Ok(combined) = STANDARD.decode(encoded) else {
            return false;
        };

        if combined.len() != ENCODED_LEN {
            return false;
        }

        let (salt, stored_key) = combined.split_at(SALT_LEN);

        match self.derive(plaintext, salt) {
            Ok(derived) => derived[..].ct_eq(stored_key).into(),
            Err(_) => false,
        }
    }

    fn derive(&self, plaintext: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], PasswordError> {
        let mut key = [0u8; KEY_LEN];
        self.argon2
            .hash_password_into(plaintext.as_bytes(), salt, &mut key)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(key)
    }
}
