//! Remote profile store port and its Postgres implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use thiserror::Error;
use uuid::Uuid;

use crate::profile::ProfileRecord;

/// Remote store failure, distinct from "record not found".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("profile store request failed: {0}")]
    Backend(String),
}

/// Insert outcome beyond plain store failures.
#[derive(Debug, Error)]
pub enum InsertError {
    /// The store's uniqueness constraint rejected the row: another session
    /// already created the record.
    #[error("a profile record already exists for this identity")]
    Conflict,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Row-oriented store holding at most one [`ProfileRecord`] per identity.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Look up the record keyed by `identity_id`.
    async fn find_by_id(
        &self,
        identity_id: Uuid,
    ) -> Result<Option<ProfileRecord>, StoreError>;

    /// Insert a new record. Uniqueness is enforced by the store itself.
    async fn insert(&self, record: &ProfileRecord) -> Result<(), InsertError>;
}

/// [`ProfileStore`] backed by the `profiles` table.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: Pool<Postgres>,
}

impl PgProfileStore {
    /// Create a new [`PgProfileStore`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn find_by_id(
        &self,
        identity_id: Uuid,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        sqlx::query_as::<_, ProfileRecord>(
            r#"SELECT id, first_name, last_name, email
                FROM profiles
                WHERE id = $1"#,
        )
        .bind(identity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StoreError::Backend(err.to_string()))
    }

    async fn insert(&self, record: &ProfileRecord) -> Result<(), InsertError> {
        let result = sqlx::query(
            r#"INSERT INTO profiles (id, first_name, last_name, email)
                VALUES ($1, $2, $3, $4)"#,
        )
        .bind(record.id)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(&record.email)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                Err(InsertError::Conflict)
            },
            Err(err) => Err(StoreError::Backend(err.to_string()).into()),
        }
    }
}
