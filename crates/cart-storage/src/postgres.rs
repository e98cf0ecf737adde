use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    Result,
    store::{BlobStore, StoredBlob, validate_key},
};

/// PostgreSQL-backed blob store implementation.
#[derive(Clone)]
pub struct PostgresBlobStore {
    pool: PgPool,
}

impl PostgresBlobStore {
    /// Creates a new PostgreSQL blob store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_blob(row: PgRow) -> Result<StoredBlob> {
        Ok(StoredBlob {
            key: row.try_get("key")?,
            payload: row.try_get("payload")?,
            revision: row.try_get("revision")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl BlobStore for PostgresBlobStore {
    async fn load(&self, key: &str) -> Result<Option<StoredBlob>> {
        validate_key(key)?;

        let row = sqlx::query(
            r#"
            SELECT key, payload, revision, updated_at
            FROM cart_blobs
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_blob).transpose()
    }

    async fn save(&self, key: &str, payload: serde_json::Value) -> Result<StoredBlob> {
        validate_key(key)?;

        let row = sqlx::query(
            r#"
            INSERT INTO cart_blobs (key, payload, revision, updated_at)
            VALUES ($1, $2, 1, NOW())
            ON CONFLICT (key) DO UPDATE
            SET payload = EXCLUDED.payload,
                revision = cart_blobs.revision + 1,
                updated_at = NOW()
            RETURNING key, payload, revision, updated_at
            "#,
        )
        .bind(key)
        .bind(&payload)
        .fetch_one(&self.pool)
        .await?;

        let blob = Self::row_to_blob(row)?;
        tracing::debug!(key, revision = blob.revision, "blob saved");
        Ok(blob)
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;

        let result = sqlx::query("DELETE FROM cart_blobs WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
