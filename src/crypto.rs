//! Password hashing logic.

use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::config::Argon2 as ArgonConfig;

type Result<T> = std::result::Result<T, CryptoError>;

#[derive(thiserror::Error, Debug)]
pub enum CryptoError {
    #[error("argon2 error: {0}")]
    Argon2(String),

    #[error("password mismatch")]
    Mismatch,
}

/// Argon2id password hasher with instance-wide parameters.
pub struct Crypto {
    argon2: Argon2<'static>,
}

impl Crypto {
    /// Create a new [`Crypto`] from the optional `argon2` config section.
    pub fn new(config: Option<ArgonConfig>) -> Result<Self> {
        let config = config.unwrap_or_default();
        let params = Params::new(
            config.memory_cost,
            config.iterations,
            config.parallelism,
            Some(config.hash_length),
        )
        .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        Ok(hash.to_string())
    }

    /// Check a password against a stored hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<()> {
        let parsed = PasswordHash::new(hash)
            .map_err(|err| CryptoError::Argon2(err.to_string()))?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| CryptoError::Mismatch)
    }
}
