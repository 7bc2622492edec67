use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::Utc;
use secrecy::SecretString;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CatalogStore, CredentialStore, OutfitStore, RepositoryError, SuggestionCacheStore,
    WardrobeStore,
};
use crate::domain::catalog::{Category, Subcategory};
use crate::domain::item::{BodySlot, ClothingItem, ItemId, NewClothingItem, OwnerId};
use crate::domain::outfit::{DayOfWeek, NewOutfit, Outfit, OutfitId};

#[derive(Default)]
pub struct InMemoryCatalogStore {
    categories: RwLock<Vec<Category>>,
    subcategories: RwLock<Vec<Subcategory>>,
}

impl InMemoryCatalogStore {
    pub fn with_reference_data(categories: Vec<Category>, subcategories: Vec<Subcategory>) -> Self {
        Self { categories: RwLock::new(categories), subcategories: RwLock::new(subcategories) }
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.categories.read().await.clone())
    }

    async fn subcategories(&self) -> Result<Vec<Subcategory>, RepositoryError> {
        Ok(self.subcategories.read().await.clone())
    }
}

#[derive(Default)]
pub struct InMemoryWardrobeStore {
    items: RwLock<HashMap<ItemId, ClothingItem>>,
}

impl InMemoryWardrobeStore {
    /// Seeds an item with a caller-chosen id.
    pub async fn insert(&self, item: ClothingItem) {
        self.items.write().await.insert(item.id.clone(), item);
    }
}

#[async_trait::async_trait]
impl WardrobeStore for InMemoryWardrobeStore {
    async fn add_item(
        &self,
        owner_id: &OwnerId,
        item: NewClothingItem,
    ) -> Result<ClothingItem, RepositoryError> {
        let item = item.into_item(owner_id.clone(), Utc::now());
        self.items.write().await.insert(item.id.clone(), item.clone());
        Ok(item)
    }

    async fn replace_item(&self, item: ClothingItem) -> Result<ClothingItem, RepositoryError> {
        let mut items = self.items.write().await;
        let existing = items
            .get(&item.id)
            .filter(|existing| existing.owner_id == item.owner_id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "clothing item",
                id: item.id.0.clone(),
            })?;
        if existing.slot != item.slot {
            return Err(RepositoryError::Conflict(format!(
                "body slot of item `{}` is immutable ({} -> {})",
                item.id, existing.slot, item.slot
            )));
        }
        let replaced = ClothingItem { created_at: existing.created_at, ..item };
        items.insert(replaced.id.clone(), replaced.clone());
        Ok(replaced)
    }

    async fn delete_item(&self, owner_id: &OwnerId, id: &ItemId) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        match items.get(id) {
            Some(item) if &item.owner_id == owner_id => {
                items.remove(id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound { entity: "clothing item", id: id.0.clone() }),
        }
    }

    async fn find_item(
        &self,
        owner_id: &OwnerId,
        id: &ItemId,
    ) -> Result<Option<ClothingItem>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(id).filter(|item| &item.owner_id == owner_id).cloned())
    }

    async fn list_items(
        &self,
        owner_id: &OwnerId,
        slot: Option<BodySlot>,
    ) -> Result<Vec<ClothingItem>, RepositoryError> {
        let items = self.items.read().await;
        let mut owned = items
            .values()
            .filter(|item| &item.owner_id == owner_id)
            .filter(|item| slot.map_or(true, |slot| item.slot == slot))
            .cloned()
            .collect::<Vec<_>>();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }
}

#[derive(Default)]
pub struct InMemoryOutfitStore {
    outfits: RwLock<HashMap<(OwnerId, DayOfWeek), Outfit>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryOutfitStore {
    /// Makes every subsequent write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of write operations that reached the store, failed or not.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn begin_write(&self) -> Result<(), RepositoryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database("outfit store is unavailable".to_string()));
        }
        Ok(())
    }
}

fn persist(outfit: NewOutfit) -> Outfit {
    Outfit {
        id: OutfitId(Uuid::new_v4().to_string()),
        owner_id: outfit.owner_id,
        upper_id: outfit.upper_id,
        bottom_id: outfit.bottom_id,
        day: outfit.day,
        created_at: outfit.created_at,
    }
}

#[async_trait::async_trait]
impl OutfitStore for InMemoryOutfitStore {
    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Outfit>, RepositoryError> {
        let outfits = self.outfits.read().await;
        let mut owned = outfits
            .values()
            .filter(|outfit| &outfit.owner_id == owner_id)
            .cloned()
            .collect::<Vec<_>>();
        owned.sort_by_key(|outfit| outfit.day);
        Ok(owned)
    }

    async fn find_for_day(
        &self,
        owner_id: &OwnerId,
        day: DayOfWeek,
    ) -> Result<Option<Outfit>, RepositoryError> {
        Ok(self.outfits.read().await.get(&(owner_id.clone(), day)).cloned())
    }

    async fn replace_week(
        &self,
        owner_id: &OwnerId,
        outfits: Vec<NewOutfit>,
    ) -> Result<Vec<Outfit>, RepositoryError> {
        self.begin_write()?;
        if let Some(foreign) = outfits.iter().find(|outfit| &outfit.owner_id != owner_id) {
            return Err(RepositoryError::Conflict(format!(
                "outfit for {} belongs to another owner",
                foreign.day
            )));
        }

        let mut stored = self.outfits.write().await;
        stored.retain(|(owner, _), _| owner != owner_id);
        let persisted = outfits.into_iter().map(persist).collect::<Vec<_>>();
        for outfit in &persisted {
            stored.insert((owner_id.clone(), outfit.day), outfit.clone());
        }
        Ok(persisted)
    }

    async fn replace_day(&self, outfit: NewOutfit) -> Result<Outfit, RepositoryError> {
        self.begin_write()?;
        let persisted = persist(outfit);
        self.outfits
            .write()
            .await
            .insert((persisted.owner_id.clone(), persisted.day), persisted.clone());
        Ok(persisted)
    }

    async fn delete_for_owner(&self, owner_id: &OwnerId) -> Result<u64, RepositoryError> {
        self.begin_write()?;
        let mut stored = self.outfits.write().await;
        let before = stored.len();
        stored.retain(|(owner, _), _| owner != owner_id);
        Ok((before - stored.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemorySuggestionCacheStore {
    payloads: RwLock<HashMap<OwnerId, String>>,
}

impl InMemorySuggestionCacheStore {
    pub async fn raw(&self, owner_id: &OwnerId) -> Option<String> {
        self.payloads.read().await.get(owner_id).cloned()
    }
}

#[async_trait::async_trait]
impl SuggestionCacheStore for InMemorySuggestionCacheStore {
    async fn load(&self, owner_id: &OwnerId) -> Result<Option<String>, RepositoryError> {
        Ok(self.raw(owner_id).await)
    }

    async fn save(&self, owner_id: &OwnerId, payload: &str) -> Result<(), RepositoryError> {
        self.payloads.write().await.insert(owner_id.clone(), payload.to_string());
        Ok(())
    }

    async fn clear(&self, owner_id: &OwnerId) -> Result<(), RepositoryError> {
        self.payloads.write().await.remove(owner_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCredentialStore {
    value: RwLock<Option<SecretString>>,
}

impl InMemoryCredentialStore {
    pub fn with_value(value: impl Into<String>) -> Self {
        Self { value: RwLock::new(Some(SecretString::from(value.into()))) }
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self) -> Result<Option<SecretString>, RepositoryError> {
        Ok(self.value.read().await.clone())
    }

    async fn set(&self, value: SecretString) -> Result<(), RepositoryError> {
        *self.value.write().await = Some(value);
        Ok(())
    }

    async fn clear(&self) -> Result<(), RepositoryError> {
        *self.value.write().await = None;
        Ok(())
    }
}
