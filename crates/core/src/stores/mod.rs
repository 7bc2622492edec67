//! Persistence seams consumed by the planner.
//!
//! SQLite implementations live in `wardrobe-db`; the in-memory ones here back
//! tests and single-process runs. Every call that touches owner data takes
//! the owner id explicitly so nothing can read across owners by accident.

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use crate::domain::catalog::{Category, Subcategory};
use crate::domain::item::{BodySlot, ClothingItem, ItemId, NewClothingItem, OwnerId};
use crate::domain::outfit::{DayOfWeek, NewOutfit, Outfit};

pub mod memory;

pub use memory::{
    InMemoryCatalogStore, InMemoryCredentialStore, InMemoryOutfitStore,
    InMemorySuggestionCacheStore, InMemoryWardrobeStore,
};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError>;
    async fn subcategories(&self) -> Result<Vec<Subcategory>, RepositoryError>;
}

#[async_trait]
pub trait WardrobeStore: Send + Sync {
    async fn add_item(
        &self,
        owner_id: &OwnerId,
        item: NewClothingItem,
    ) -> Result<ClothingItem, RepositoryError>;

    /// Full replace. Rejects a change of body slot with `Conflict`.
    async fn replace_item(&self, item: ClothingItem) -> Result<ClothingItem, RepositoryError>;

    async fn delete_item(&self, owner_id: &OwnerId, id: &ItemId) -> Result<(), RepositoryError>;

    async fn find_item(
        &self,
        owner_id: &OwnerId,
        id: &ItemId,
    ) -> Result<Option<ClothingItem>, RepositoryError>;

    async fn list_items(
        &self,
        owner_id: &OwnerId,
        slot: Option<BodySlot>,
    ) -> Result<Vec<ClothingItem>, RepositoryError>;
}

#[async_trait]
pub trait OutfitStore: Send + Sync {
    async fn list_for_owner(&self, owner_id: &OwnerId) -> Result<Vec<Outfit>, RepositoryError>;

    async fn find_for_day(
        &self,
        owner_id: &OwnerId,
        day: DayOfWeek,
    ) -> Result<Option<Outfit>, RepositoryError>;

    /// Atomically swaps the owner's whole week for `outfits`.
    async fn replace_week(
        &self,
        owner_id: &OwnerId,
        outfits: Vec<NewOutfit>,
    ) -> Result<Vec<Outfit>, RepositoryError>;

    /// Atomically swaps the single (owner, day) entry.
    async fn replace_day(&self, outfit: NewOutfit) -> Result<Outfit, RepositoryError>;

    async fn delete_for_owner(&self, owner_id: &OwnerId) -> Result<u64, RepositoryError>;
}

/// Opaque per-owner key-value slot for the serialized suggestion cache.
#[async_trait]
pub trait SuggestionCacheStore: Send + Sync {
    async fn load(&self, owner_id: &OwnerId) -> Result<Option<String>, RepositoryError>;
    async fn save(&self, owner_id: &OwnerId, payload: &str) -> Result<(), RepositoryError>;
    async fn clear(&self, owner_id: &OwnerId) -> Result<(), RepositoryError>;
}

/// Holds the single credential used for the external suggestion endpoint.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> Result<Option<SecretString>, RepositoryError>;
    async fn set(&self, value: SecretString) -> Result<(), RepositoryError>;
    async fn clear(&self) -> Result<(), RepositoryError>;
}
