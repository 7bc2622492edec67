use async_trait::async_trait;
use chrono::Utc;

use wardrobe_core::domain::item::OwnerId;
use wardrobe_core::stores::{RepositoryError, SuggestionCacheStore};

use super::database;
use crate::DbPool;

/// One JSON document per owner; the shape is owned by the core cache.
pub struct SqlSuggestionCacheStore {
    pool: DbPool,
}

impl SqlSuggestionCacheStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SuggestionCacheStore for SqlSuggestionCacheStore {
    async fn load(&self, owner_id: &OwnerId) -> Result<Option<String>, RepositoryError> {
        sqlx::query_scalar::<_, String>("SELECT payload FROM suggestion_cache WHERE owner_id = ?")
            .bind(&owner_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database)
    }

    async fn save(&self, owner_id: &OwnerId, payload: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO suggestion_cache (owner_id, payload, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(owner_id) DO UPDATE SET
                 payload = excluded.payload,
                 updated_at = excluded.updated_at",
        )
        .bind(&owner_id.0)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(database)?;
        Ok(())
    }

    async fn clear(&self, owner_id: &OwnerId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM suggestion_cache WHERE owner_id = ?")
            .bind(&owner_id.0)
            .execute(&self.pool)
            .await
            .map_err(database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use wardrobe_core::cache::SuggestionCache;
    use wardrobe_core::clock::ManualClock;
    use wardrobe_core::domain::item::{BodySlot, ItemId, OwnerId};
    use wardrobe_core::domain::suggestion::Suggestion;
    use wardrobe_core::stores::SuggestionCacheStore;

    use super::SqlSuggestionCacheStore;
    use crate::repositories::test_support::setup;

    #[tokio::test]
    async fn payload_is_upserted_and_cleared_per_owner() {
        let store = SqlSuggestionCacheStore::new(setup().await);
        let alice = OwnerId("alice".to_string());
        let bob = OwnerId("bob".to_string());

        store.save(&alice, "{\"a\":1}").await.expect("save");
        store.save(&alice, "{\"a\":2}").await.expect("overwrite");
        store.save(&bob, "{}").await.expect("save bob");

        assert_eq!(store.load(&alice).await.expect("load").as_deref(), Some("{\"a\":2}"));
        store.clear(&alice).await.expect("clear");
        assert!(store.load(&alice).await.expect("load").is_none());
        assert_eq!(store.load(&bob).await.expect("load").as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn cache_entries_survive_a_fresh_cache_instance() {
        let pool = setup().await;
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).single().expect("valid time"),
        ));
        let owner = OwnerId("alice".to_string());
        let item = ItemId("upper-1".to_string());
        let suggestions =
            vec![Suggestion::new(BodySlot::Bottom, "jeans").with_color("blue")];

        let first = SuggestionCache::new(
            Arc::new(SqlSuggestionCacheStore::new(pool.clone())),
            clock.clone(),
            Duration::hours(24),
        );
        first.put(&owner, &item, suggestions.clone()).await;

        let second = SuggestionCache::new(
            Arc::new(SqlSuggestionCacheStore::new(pool)),
            clock.clone(),
            Duration::hours(24),
        );
        assert_eq!(second.get(&owner, &item).await, Some(suggestions));

        clock.advance(Duration::hours(24) + Duration::seconds(1));
        assert_eq!(second.get(&owner, &item).await, None);
    }
}
