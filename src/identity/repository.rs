//! Handle database requests.

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error::{Result, ServerError};
use crate::identity::Identity;

#[derive(Clone)]
pub struct IdentityRepository {
    pool: Pool<Postgres>,
}

impl IdentityRepository {
    /// Create a new [`IdentityRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert [`Identity`] into database.
    ///
    /// A duplicate email surfaces as [`ServerError::EmailTaken`].
    pub async fn insert(&self, identity: &Identity) -> Result<()> {
        let result = sqlx::query(
            r#"INSERT INTO identities (id, email, first_name, last_name, password)
                VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(identity.id)
        .bind(&identity.email)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.password)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(ServerError::EmailTaken)
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Find current identity using `email` field.
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"SELECT id, email, first_name, last_name, password, created_at
                FROM identities
                WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    /// Find the identity bound to a session token.
    pub async fn find_by_session(
        &self,
        token: &str,
    ) -> Result<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>(
            r#"SELECT i.id, i.email, i.first_name, i.last_name, i.password, i.created_at
                FROM identities i
                JOIN sessions s ON s.identity_id = i.id
                WHERE s.token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    /// Insert a session token linked to an identity into database.
    pub async fn insert_session(
        &self,
        token: &str,
        identity_id: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO sessions (token, identity_id) VALUES ($1, $2)"#,
        )
        .bind(token)
        .bind(identity_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a session token. Deleting an absent token is a no-op.
    pub async fn delete_session(&self, token: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM sessions WHERE token = $1"#)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
