use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::routes::AppState;
use wardrobe_agent::completion_client;
use wardrobe_core::config::AppConfig;
use wardrobe_core::{assemble_planner, Clock, PlannerParts, SystemClock, TracingNotifier};
use wardrobe_db::{
    connect_with_config, migrations, DbPool, SqlCatalogStore, SqlCredentialStore, SqlOutfitStore,
    SqlSuggestionCacheStore, SqlWardrobeStore,
};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let state = build_state(&config, db_pool.clone()).await;
    Ok(Application { config, db_pool, state })
}

async fn build_state(config: &AppConfig, pool: DbPool) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let wardrobe = Arc::new(SqlWardrobeStore::new(pool.clone()));
    let credentials = Arc::new(SqlCredentialStore::new(pool.clone()));

    let parts = PlannerParts {
        wardrobe: wardrobe.clone(),
        outfits: Arc::new(SqlOutfitStore::new(pool.clone())),
        catalog: Arc::new(SqlCatalogStore::new(pool.clone())),
        cache: Arc::new(SqlSuggestionCacheStore::new(pool)),
        credentials: credentials.clone(),
        notifier: Arc::new(TracingNotifier),
        clock: clock.clone(),
    };
    let planner = assemble_planner(config, parts, completion_client(&config.llm)).await;

    AppState { planner: Arc::new(planner), wardrobe, credentials, clock }
}
