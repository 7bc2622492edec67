use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;

use wardrobe_core::domain::item::{BodySlot, ClothingItem, ItemId, NewClothingItem, OwnerId};
use wardrobe_core::stores::{RepositoryError, WardrobeStore};

use super::{column, database, parse_timestamp};
use crate::DbPool;

const ITEM_COLUMNS: &str =
    "id, owner_id, name, image_ref, slot, category_id, subcategory_id, color, created_at";

pub struct SqlWardrobeStore {
    pool: DbPool,
}

impl SqlWardrobeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts an item with a caller-chosen id. Used by seeding.
    pub async fn insert(&self, item: &ClothingItem) -> Result<(), RepositoryError> {
        sqlx::query(&format!("INSERT INTO clothing_item ({ITEM_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"))
            .bind(&item.id.0)
            .bind(&item.owner_id.0)
            .bind(&item.name)
            .bind(&item.image_ref)
            .bind(item.slot.as_str())
            .bind(&item.category_id)
            .bind(&item.subcategory_id)
            .bind(&item.color)
            .bind(item.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(database)?;
        Ok(())
    }
}

fn row_to_item(row: &SqliteRow) -> Result<ClothingItem, RepositoryError> {
    let slot: String = column(row, "slot")?;
    let created_at: String = column(row, "created_at")?;

    Ok(ClothingItem {
        id: ItemId(column(row, "id")?),
        owner_id: OwnerId(column(row, "owner_id")?),
        name: column(row, "name")?,
        image_ref: column(row, "image_ref")?,
        slot: slot.parse().map_err(|error| RepositoryError::Decode(format!("slot: {error}")))?,
        category_id: column(row, "category_id")?,
        subcategory_id: column(row, "subcategory_id")?,
        color: column(row, "color")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl WardrobeStore for SqlWardrobeStore {
    async fn add_item(
        &self,
        owner_id: &OwnerId,
        item: NewClothingItem,
    ) -> Result<ClothingItem, RepositoryError> {
        let item = item.into_item(owner_id.clone(), Utc::now());
        self.insert(&item).await?;
        Ok(item)
    }

    async fn replace_item(&self, item: ClothingItem) -> Result<ClothingItem, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(database)?;

        let existing = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM clothing_item WHERE id = ? AND owner_id = ?"
        ))
        .bind(&item.id.0)
        .bind(&item.owner_id.0)
        .fetch_optional(&mut *tx)
        .await
        .map_err(database)?;

        let existing = match existing {
            Some(row) => row_to_item(&row)?,
            None => {
                return Err(RepositoryError::NotFound {
                    entity: "clothing item",
                    id: item.id.0.clone(),
                })
            }
        };
        if existing.slot != item.slot {
            return Err(RepositoryError::Conflict(format!(
                "body slot of item `{}` is immutable ({} -> {})",
                item.id, existing.slot, item.slot
            )));
        }

        sqlx::query(
            "UPDATE clothing_item
             SET name = ?, image_ref = ?, category_id = ?, subcategory_id = ?, color = ?
             WHERE id = ? AND owner_id = ?",
        )
        .bind(&item.name)
        .bind(&item.image_ref)
        .bind(&item.category_id)
        .bind(&item.subcategory_id)
        .bind(&item.color)
        .bind(&item.id.0)
        .bind(&item.owner_id.0)
        .execute(&mut *tx)
        .await
        .map_err(database)?;

        tx.commit().await.map_err(database)?;
        Ok(ClothingItem { created_at: existing.created_at, ..item })
    }

    async fn delete_item(&self, owner_id: &OwnerId, id: &ItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM clothing_item WHERE id = ? AND owner_id = ?")
            .bind(&id.0)
            .bind(&owner_id.0)
            .execute(&self.pool)
            .await
            .map_err(database)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound { entity: "clothing item", id: id.0.clone() });
        }
        Ok(())
    }

    async fn find_item(
        &self,
        owner_id: &OwnerId,
        id: &ItemId,
    ) -> Result<Option<ClothingItem>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM clothing_item WHERE id = ? AND owner_id = ?"
        ))
        .bind(&id.0)
        .bind(&owner_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(database)?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn list_items(
        &self,
        owner_id: &OwnerId,
        slot: Option<BodySlot>,
    ) -> Result<Vec<ClothingItem>, RepositoryError> {
        let rows = match slot {
            Some(slot) => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM clothing_item
                     WHERE owner_id = ? AND slot = ?
                     ORDER BY created_at, id"
                ))
                .bind(&owner_id.0)
                .bind(slot.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM clothing_item WHERE owner_id = ? ORDER BY created_at, id"
                ))
                .bind(&owner_id.0)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(database)?;

        rows.iter().map(row_to_item).collect()
    }
}

#[cfg(test)]
mod tests {
    use wardrobe_core::domain::item::{BodySlot, ItemId, NewClothingItem, OwnerId};
    use wardrobe_core::stores::{RepositoryError, WardrobeStore};

    use super::SqlWardrobeStore;
    use crate::repositories::test_support::setup;

    fn new_item(slot: BodySlot, category: &str, color: &str) -> NewClothingItem {
        NewClothingItem {
            name: None,
            image_ref: format!("images/{category}.jpg"),
            slot,
            category_id: category.to_string(),
            subcategory_id: String::new(),
            color: color.to_string(),
        }
    }

    #[tokio::test]
    async fn items_are_listed_per_owner_and_slot() {
        let store = SqlWardrobeStore::new(setup().await);
        let alice = OwnerId("alice".to_string());
        let bob = OwnerId("bob".to_string());

        store.add_item(&alice, new_item(BodySlot::Upper, "t-shirt", "#FFFFFF")).await.expect("add");
        store.add_item(&alice, new_item(BodySlot::Bottom, "jeans", "#0000FF")).await.expect("add");
        store.add_item(&bob, new_item(BodySlot::Upper, "hoodie", "#000000")).await.expect("add");

        let uppers = store.list_items(&alice, Some(BodySlot::Upper)).await.expect("list");
        assert_eq!(uppers.len(), 1);
        assert_eq!(uppers[0].category_id, "t-shirt");
        assert_eq!(store.list_items(&alice, None).await.expect("list").len(), 2);
        assert_eq!(store.list_items(&bob, Some(BodySlot::Bottom)).await.expect("list").len(), 0);
    }

    #[tokio::test]
    async fn replace_keeps_slot_and_created_at() {
        let store = SqlWardrobeStore::new(setup().await);
        let owner = OwnerId("alice".to_string());
        let added =
            store.add_item(&owner, new_item(BodySlot::Upper, "shirt", "#FFFFFF")).await.expect("add");

        let mut recolored = added.clone();
        recolored.color = "#000080".to_string();
        recolored.name = Some("Navy shirt".to_string());
        let replaced = store.replace_item(recolored).await.expect("replace");
        assert_eq!(replaced.created_at, added.created_at);

        let found = store.find_item(&owner, &added.id).await.expect("find").expect("present");
        assert_eq!(found.color, "#000080");
        assert_eq!(found.display_name(), "Navy shirt");

        let mut moved = found;
        moved.slot = BodySlot::Bottom;
        let error = store.replace_item(moved).await.expect_err("slot change must fail");
        assert!(matches!(error, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn other_owners_cannot_touch_items() {
        let store = SqlWardrobeStore::new(setup().await);
        let owner = OwnerId("alice".to_string());
        let intruder = OwnerId("mallory".to_string());
        let added =
            store.add_item(&owner, new_item(BodySlot::Bottom, "skirt", "#FFC0CB")).await.expect("add");

        assert!(store.find_item(&intruder, &added.id).await.expect("find").is_none());
        assert!(matches!(
            store.delete_item(&intruder, &added.id).await,
            Err(RepositoryError::NotFound { .. })
        ));

        store.delete_item(&owner, &added.id).await.expect("delete");
        assert!(matches!(
            store.delete_item(&owner, &ItemId(added.id.0.clone())).await,
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
