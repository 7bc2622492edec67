//! SQLite implementations of the store traits declared in `wardrobe-core`.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use wardrobe_core::stores::RepositoryError;

pub mod catalog;
pub mod credential;
pub mod item;
pub mod outfit;
pub mod suggestion_cache;

pub use catalog::SqlCatalogStore;
pub use credential::SqlCredentialStore;
pub use item::SqlWardrobeStore;
pub use outfit::SqlOutfitStore;
pub use suggestion_cache::SqlSuggestionCacheStore;

pub(crate) fn database(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(error.to_string())
}

pub(crate) fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name).map_err(|error| RepositoryError::Decode(format!("{name}: {error}")))
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("timestamp `{value}`: {error}")))
}
