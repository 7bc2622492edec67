use async_trait::async_trait;

use wardrobe_core::domain::catalog::{Category, Subcategory};
use wardrobe_core::stores::{CatalogStore, RepositoryError};

use super::{column, database};
use crate::DbPool;

pub struct SqlCatalogStore {
    pool: DbPool,
}

impl SqlCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn upsert_category(&self, category: &Category) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO category (id, name) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(&category.id)
        .bind(&category.name)
        .execute(&self.pool)
        .await
        .map_err(database)?;
        Ok(())
    }

    pub async fn upsert_subcategory(&self, subcategory: &Subcategory) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO subcategory (id, category_id, name) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET category_id = excluded.category_id, name = excluded.name",
        )
        .bind(&subcategory.id)
        .bind(&subcategory.category_id)
        .bind(&subcategory.name)
        .execute(&self.pool)
        .await
        .map_err(database)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name FROM category ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(database)?;

        rows.iter()
            .map(|row| Ok(Category { id: column(row, "id")?, name: column(row, "name")? }))
            .collect()
    }

    async fn subcategories(&self) -> Result<Vec<Subcategory>, RepositoryError> {
        let rows = sqlx::query("SELECT id, category_id, name FROM subcategory ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(database)?;

        rows.iter()
            .map(|row| {
                Ok(Subcategory {
                    id: column(row, "id")?,
                    category_id: column(row, "category_id")?,
                    name: column(row, "name")?,
                })
            })
            .collect()
    }
}
