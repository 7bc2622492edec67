//! Builds an [`OutfitPlanner`] from configuration and concrete stores.

use std::sync::Arc;

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};

use crate::cache::SuggestionCache;
use crate::clock::Clock;
use crate::config::{AppConfig, PlannerConfig};
use crate::labels::LabelCatalog;
use crate::notify::Notifier;
use crate::planner::OutfitPlanner;
use crate::stores::{
    CatalogStore, CredentialStore, OutfitStore, RepositoryError, SuggestionCacheStore,
    WardrobeStore,
};
use crate::suggestions::{CompletionClient, RateLimiter, RateLimiterSettings, SuggestionSource};

pub struct PlannerParts {
    pub wardrobe: Arc<dyn WardrobeStore>,
    pub outfits: Arc<dyn OutfitStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub cache: Arc<dyn SuggestionCacheStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl PlannerConfig {
    pub fn rate_limiter_settings(&self) -> RateLimiterSettings {
        RateLimiterSettings {
            max_calls: self.rate_limit_max_calls as usize,
            window: Duration::seconds(self.rate_limit_window_secs as i64),
            cooldown: Duration::seconds(self.cooldown_secs as i64),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::hours(i64::from(self.cache_ttl_hours))
    }
}

/// Stores `value` only when no credential is present. Returns whether it
/// was written.
pub async fn seed_credential(
    store: &dyn CredentialStore,
    value: &SecretString,
) -> Result<bool, RepositoryError> {
    if value.expose_secret().trim().is_empty() || store.get().await?.is_some() {
        return Ok(false);
    }
    store.set(value.clone()).await?;
    Ok(true)
}

/// `client` is dropped when the endpoint is disabled in config. A configured
/// API key seeds the credential store if it is empty; failures there are
/// logged and the planner still starts.
pub async fn assemble_planner(
    config: &AppConfig,
    parts: PlannerParts,
    client: Option<Arc<dyn CompletionClient>>,
) -> OutfitPlanner {
    if let Some(api_key) = &config.llm.api_key {
        match seed_credential(parts.credentials.as_ref(), api_key).await {
            Ok(true) => tracing::info!(
                event_name = "assembly.credential_seeded",
                "stored configured api key as the endpoint credential"
            ),
            Ok(false) => {}
            Err(error) => tracing::warn!(
                event_name = "assembly.credential_seed_failed",
                error = %error,
                "could not store configured api key"
            ),
        }
    }

    let client = if config.llm.enabled { client } else { None };
    tracing::info!(
        event_name = "assembly.planner",
        endpoint_enabled = client.is_some(),
        provider = config.llm.provider.as_str(),
        cache_ttl_hours = config.planner.cache_ttl_hours,
        "assembling outfit planner"
    );

    let limiter = Arc::new(RateLimiter::new(
        config.planner.rate_limiter_settings(),
        parts.clock.clone(),
    ));
    let source = SuggestionSource::new(client, parts.credentials, limiter)
        .with_max_suggestions(config.planner.max_suggestions as usize);
    let cache = SuggestionCache::new(parts.cache, parts.clock.clone(), config.planner.cache_ttl());
    let labels = LabelCatalog::load(parts.catalog.as_ref()).await;

    OutfitPlanner::new(
        parts.wardrobe,
        parts.outfits,
        source,
        cache,
        labels,
        parts.notifier,
        parts.clock,
    )
}
