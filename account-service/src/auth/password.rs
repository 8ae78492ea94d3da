//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted password, in bytes. Longer input is rejected rather than truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("input is {len} bytes, longer than the {max} byte limit")]
    InputTooLong { len: usize, max: usize },

    #[error("stored hash is malformed: {0}")]
    MalformedHash(String),

    #[error("hashing failed: {0}")]
    Algorithm(String),
}

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    /// Create Argon2 instance with these parameters.
    fn to_argon2(self) -> Result<Argon2<'static>, HashError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| HashError::Algorithm(format!("create argon2 params: {e}")))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Check the parameters are accepted by Argon2.
    pub fn validate(self) -> Result<(), HashError> {
        self.to_argon2().map(|_| ())
    }
}

impl Default for Argon2Params {
    /// Secure defaults for production (Argon2id RFC recommendations)
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Stateless password hasher. Output is a salted PHC string, so hashing the same input twice
/// gives different strings that both verify.
#[derive(Debug, Clone, Copy)]
pub struct HashService {
    params: Argon2Params,
}

impl HashService {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    pub fn hash(&self, input: &str) -> Result<String, HashError> {
        if input.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::InputTooLong {
                len: input.len(),
                max: MAX_PASSWORD_BYTES,
            });
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .params
            .to_argon2()?
            .hash_password(input.as_bytes(), &salt)
            .map_err(|e| HashError::Algorithm(format!("hash string: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verify `input` against a stored hash. A mismatch is `Ok(false)`; only a hash that cannot be
    /// parsed is an error.
    ///
    /// Note: Verification uses the parameters embedded in the hash itself.
    pub fn verify(&self, input: &str, hashed: &str) -> Result<bool, HashError> {
        let parsed_hash = PasswordHash::new(hashed).map_err(|e| HashError::MalformedHash(e.to_string()))?;

        match Argon2::default().verify_password(input.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashError::Algorithm(format!("verify string: {e}"))),
        }
    }
}

impl Default for HashService {
    fn default() -> Self {
        Self::new(Argon2Params::default())
    }
}
