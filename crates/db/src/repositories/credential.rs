use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};

use wardrobe_core::stores::{CredentialStore, RepositoryError};

use super::database;
use crate::DbPool;

/// Single-row store for the suggestion endpoint credential.
pub struct SqlCredentialStore {
    pool: DbPool,
}

impl SqlCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for SqlCredentialStore {
    async fn get(&self) -> Result<Option<SecretString>, RepositoryError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM credential WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(database)?;
        Ok(value.filter(|value| !value.trim().is_empty()).map(SecretString::from))
    }

    async fn set(&self, value: SecretString) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO credential (id, value, updated_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(value.expose_secret())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(database)?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM credential WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(database)?;
        Ok(())
    }
}
