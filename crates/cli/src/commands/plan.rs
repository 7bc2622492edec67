use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::commands::{open_migrated_pool, prepare, require_owner, CommandResult, StepFailure};
use wardrobe_agent::completion_client;
use wardrobe_core::config::AppConfig;
use wardrobe_core::{
    assemble_planner, OwnerId, PlanError, PlanReport, PlannerParts, SystemClock,
    TracingNotifier,
};
use wardrobe_db::{
    DbPool, SqlCatalogStore, SqlCredentialStore, SqlOutfitStore, SqlSuggestionCacheStore,
    SqlWardrobeStore,
};

pub fn run(owner: &str) -> CommandResult {
    let owner = match require_owner("plan", owner) {
        Ok(owner) => OwnerId(owner),
        Err(result) => return result,
    };
    let (config, runtime) = match prepare("plan") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    init_stderr_logging(&config);

    let result = runtime.block_on(async {
        let pool = open_migrated_pool(&config).await?;
        let outcome = generate(&config, pool.clone(), &owner).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(report) => {
            let message = format!(
                "weekly plan {} for {}: {} days",
                report.state.as_str(),
                owner,
                report.plan.len()
            );
            match serde_json::to_value(&report) {
                Ok(data) => CommandResult::success_with_data("plan", message, Some(data)),
                Err(error) => CommandResult::failure("plan", "serialization", error.to_string(), 8),
            }
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("plan", error_class, message, exit_code)
        }
    }
}

async fn generate(
    config: &AppConfig,
    pool: DbPool,
    owner: &OwnerId,
) -> Result<PlanReport, StepFailure> {
    let parts = PlannerParts {
        wardrobe: Arc::new(SqlWardrobeStore::new(pool.clone())),
        outfits: Arc::new(SqlOutfitStore::new(pool.clone())),
        catalog: Arc::new(SqlCatalogStore::new(pool.clone())),
        cache: Arc::new(SqlSuggestionCacheStore::new(pool.clone())),
        credentials: Arc::new(SqlCredentialStore::new(pool)),
        notifier: Arc::new(TracingNotifier),
        clock: Arc::new(SystemClock),
    };
    let planner = assemble_planner(config, parts, completion_client(&config.llm)).await;

    planner.generate_weekly_plan(owner).await.map_err(plan_failure)
}

fn plan_failure(error: PlanError) -> StepFailure {
    let (error_class, exit_code) = match &error {
        PlanError::InsufficientWardrobe { .. } => ("insufficient_wardrobe", 7u8),
        PlanError::Persistence(_) => ("persistence", 8u8),
        PlanError::GenerationInProgress => ("generation_in_progress", 9u8),
    };
    (error_class, error.to_string(), exit_code)
}

/// Diagnostics go to stderr so stdout stays a single JSON outcome line.
fn init_stderr_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
