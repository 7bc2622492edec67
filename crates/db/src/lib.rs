pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoWardrobeSeed, SeedResult, VerificationResult, DEMO_OWNER_ID};
pub use repositories::{
    SqlCatalogStore, SqlCredentialStore, SqlOutfitStore, SqlSuggestionCacheStore,
    SqlWardrobeStore,
};
