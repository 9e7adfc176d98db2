use std::sync::Arc;

use rand::RngCore;
use sqlx::{Pool, Postgres};

use crate::crypto::{Crypto, CryptoError};
use crate::error::{Result, ServerError};
use crate::identity::{Identity, IdentityRepository};

/// Identity manager.
#[derive(Clone)]
pub struct IdentityService {
    pub repo: IdentityRepository,
    pub crypto: Arc<Crypto>,
}

impl IdentityService {
    /// Create a new [`IdentityService`].
    pub fn new(pool: Pool<Postgres>, crypto: Arc<Crypto>) -> Self {
        Self {
            repo: IdentityRepository::new(pool),
            crypto,
        }
    }

    /// Register a new identity with a hashed password.
    pub async fn register(
        &self,
        mut identity: Identity,
        password: &str,
    ) -> Result<Identity> {
        identity.password = self.crypto.hash_password(password)?;
        self.repo.insert(&identity).await?;

        Ok(identity)
    }

    /// Check credentials and return the matching identity.
    ///
    /// A missing account and a wrong password are indistinguishable on
    /// purpose.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity> {
        let identity = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or(ServerError::InvalidCredentials)?;

        match self.crypto.verify_password(password, &identity.password) {
            Ok(()) => Ok(identity),
            Err(CryptoError::Mismatch) => {
                Err(ServerError::InvalidCredentials)
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Open a new session and return its opaque token.
    pub async fn open_session(&self, identity: &Identity) -> Result<String> {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        self.repo.insert_session(&token, identity.id).await?;
        Ok(token)
    }

    /// Revoke a session. Idempotent.
    pub async fn close_session(&self, token: &str) -> Result<()> {
        self.repo.delete_session(token).await
    }

    /// Resolve a session token to its identity.
    pub async fn identity_for_session(
        &self,
        token: &str,
    ) -> Result<Option<Identity>> {
        self.repo.find_by_session(token).await
    }
}
