use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;
use uuid::Uuid;

use wardrobe_core::domain::item::{ItemId, OwnerId};
use wardrobe_core::domain::outfit::{DayOfWeek, NewOutfit, Outfit, OutfitId};
use wardrobe_core::stores::{OutfitStore, RepositoryError};

use super::{column, database, parse_timestamp};
use crate::DbPool;

pub struct SqlOutfitStore {
    pool: DbPool,
}

impl SqlOutfitStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_outfit(row: &SqliteRow) -> Result<Outfit, RepositoryError> {
    let day: String = column(row, "day")?;
    let created_at: String = column(row, "created_at")?;

    Ok(Outfit {
        id: OutfitId(column(row, "id")?),
        owner_id: OwnerId(column(row, "owner_id")?),
        upper_id: ItemId(column(row, "upper_id")?),
        bottom_id: ItemId(column(row, "bottom_id")?),
        day: day.parse().map_err(|error| RepositoryError::Decode(format!("day: {error}")))?,
        created_at: parse_timestamp(&created_at)?,
    })
}

async fn insert_outfit(
    conn: &mut SqliteConnection,
    outfit: NewOutfit,
) -> Result<Outfit, RepositoryError> {
    let persisted = Outfit {
        id: OutfitId(Uuid::new_v4().to_string()),
        owner_id: outfit.owner_id,
        upper_id: outfit.upper_id,
        bottom_id: outfit.bottom_id,
        day: outfit.day,
        created_at: outfit.created_at,
    };

    sqlx::query(
        "INSERT INTO outfit (id, owner_id, upper_id, bottom_id, day, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&persisted.id.0)
    .bind(&persisted.owner_id.0)
    .bind(&persisted.upper_id.0)
    .bind(&persisted.bottom_id.0)
    .bind(persisted.day.as_str())
    .bind(persisted.created_at.to_rfc3339())
    .execute(&mut *conn)
    .await
    .map_err(database)?;

    Ok(persisted)
}

#[async_trait]
impl OutfitStore for SqlOutfitStore {
    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Outfit>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, owner_id, upper_id, bottom_id, day, created_at
             FROM outfit WHERE owner_id = ?",
        )
        .bind(&owner_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(database)?;

        let mut outfits = rows.iter().map(row_to_outfit).collect::<Result<Vec<_>, _>>()?;
        outfits.sort_by_key(|outfit| outfit.day);
        Ok(outfits)
    }

    async fn find_for_day(
        &self,
        owner_id: &OwnerId,
        day: DayOfWeek,
    ) -> Result<Option<Outfit>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, owner_id, upper_id, bottom_id, day, created_at
             FROM outfit WHERE owner_id = ? AND day = ?",
        )
        .bind(&owner_id.0)
        .bind(day.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        row.as_ref().map(row_to_outfit).transpose()
    }

    async fn replace_week(
        &self,
        owner_id: &OwnerId,
        outfits: Vec<NewOutfit>,
    ) -> Result<Vec<Outfit>, RepositoryError> {
        if let Some(foreign) = outfits.iter().find(|outfit| &outfit.owner_id != owner_id) {
            return Err(RepositoryError::Conflict(format!(
                "outfit for {} belongs to another owner",
                foreign.day
            )));
        }

        let mut tx = self.pool.begin().await.map_err(database)?;

        sqlx::query("DELETE FROM outfit WHERE owner_id = ?")
            .bind(&owner_id.0)
            .execute(&mut *tx)
            .await
            .map_err(database)?;

        let mut persisted = Vec::with_capacity(outfits.len());
        for outfit in outfits {
            persisted.push(insert_outfit(&mut *tx, outfit).await?);
        }

        tx.commit().await.map_err(database)?;
        Ok(persisted)
    }

    async fn replace_day(&self, outfit: NewOutfit) -> Result<Outfit, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database)?;

        sqlx::query("DELETE FROM outfit WHERE owner_id = ? AND day = ?")
            .bind(&outfit.owner_id.0)
            .bind(outfit.day.as_str())
            .execute(&mut *tx)
            .await
            .map_err(database)?;
        let persisted = insert_outfit(&mut *tx, outfit).await?;

        tx.commit().await.map_err(database)?;
        Ok(persisted)
    }

    async fn delete_for_owner(&self, owner_id: &OwnerId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM outfit WHERE owner_id = ?")
            .bind(&owner_id.0)
            .execute(&self.pool)
            .await
            .map_err(database)?;
        Ok(result.rows_affected())
    }
}
