//! Readiness of the planner: the wardrobe schema must be reachable for the
//! server to report ready. The suggestion endpoint is reported alongside but
//! never blocks readiness, since the mock generator covers every outage.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use wardrobe_core::config::{LlmConfig, LlmProvider};
use wardrobe_core::stores::CredentialStore;
use wardrobe_db::DbPool;

const WARDROBE_TABLES: &[&str] =
    &["category", "subcategory", "clothing_item", "outfit", "suggestion_cache", "credential"];

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    credentials: Arc<dyn CredentialStore>,
    /// `None` when the completion endpoint is switched off.
    provider: Option<LlmProvider>,
}

impl HealthState {
    pub fn new(db_pool: DbPool, credentials: Arc<dyn CredentialStore>, llm: &LlmConfig) -> Self {
        Self { db_pool, credentials, provider: llm.enabled.then_some(llm.provider) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: HealthCheck,
    pub suggestions: SuggestionEndpointCheck,
    pub checked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SuggestionEndpointCheck {
    /// `remote`, `mock_only` or `unknown`.
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<&'static str>,
    pub detail: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = schema_check(&state.db_pool).await;
    let ready = database.status == "ready";
    let suggestions = endpoint_check(&state).await;

    if !ready {
        tracing::warn!(
            event_name = "system.health.degraded",
            detail = %database.detail,
            "health check found the wardrobe schema unavailable"
        );
    }

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        database,
        suggestions,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn schema_check(pool: &DbPool) -> HealthCheck {
    let placeholders = vec!["?"; WARDROBE_TABLES.len()].join(", ");
    let sql = format!(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ({placeholders})"
    );
    let query = WARDROBE_TABLES
        .iter()
        .fold(sqlx::query_scalar::<_, String>(&sql), |query, table| query.bind(*table));

    match query.fetch_all(pool).await {
        Ok(present) => {
            let missing = WARDROBE_TABLES
                .iter()
                .filter(|table| !present.iter().any(|name| name == *table))
                .copied()
                .collect::<Vec<_>>();
            if missing.is_empty() {
                HealthCheck { status: "ready", detail: "wardrobe schema present".to_string() }
            } else {
                HealthCheck {
                    status: "degraded",
                    detail: format!("missing tables: {} (run migrations)", missing.join(", ")),
                }
            }
        }
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn endpoint_check(state: &HealthState) -> SuggestionEndpointCheck {
    let Some(provider) = state.provider else {
        return SuggestionEndpointCheck {
            mode: "mock_only",
            provider: None,
            detail: "completion endpoint disabled".to_string(),
        };
    };

    match state.credentials.get().await {
        Ok(Some(_)) => SuggestionEndpointCheck {
            mode: "remote",
            provider: Some(provider.as_str()),
            detail: "credential stored".to_string(),
        },
        Ok(None) => SuggestionEndpointCheck {
            mode: "mock_only",
            provider: Some(provider.as_str()),
            detail: "no credential stored".to_string(),
        },
        Err(error) => SuggestionEndpointCheck {
            mode: "unknown",
            provider: Some(provider.as_str()),
            detail: format!("credential lookup failed: {error}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use wardrobe_core::config::{AppConfig, LlmConfig};
    use wardrobe_core::stores::InMemoryCredentialStore;
    use wardrobe_db::{connect_with_settings, migrations, DbPool};

    use crate::health::{health, HealthState};

    async fn migrated_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn llm(enabled: bool) -> LlmConfig {
        let mut llm = AppConfig::default().llm;
        llm.enabled = enabled;
        llm
    }

    #[tokio::test]
    async fn ready_with_schema_and_stored_credential_reports_remote_mode() {
        let pool = migrated_pool().await;
        let credentials = Arc::new(InMemoryCredentialStore::with_value("sk-live"));
        let state = HealthState::new(pool.clone(), credentials, &llm(true));

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.suggestions.mode, "remote");
        assert!(payload.suggestions.provider.is_some());

        pool.close().await;
    }

    #[tokio::test]
    async fn missing_credential_or_disabled_endpoint_is_mock_only_but_ready() {
        let pool = migrated_pool().await;

        let state =
            HealthState::new(pool.clone(), Arc::new(InMemoryCredentialStore::default()), &llm(true));
        let (status, Json(payload)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.suggestions.mode, "mock_only");
        assert_eq!(payload.suggestions.detail, "no credential stored");

        let credentials = Arc::new(InMemoryCredentialStore::with_value("sk-live"));
        let state = HealthState::new(pool.clone(), credentials, &llm(false));
        let (status, Json(payload)) = health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.suggestions.mode, "mock_only");
        assert_eq!(payload.suggestions.provider, None);

        pool.close().await;
    }

    #[tokio::test]
    async fn unmigrated_database_is_degraded_and_names_missing_tables() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        let state =
            HealthState::new(pool.clone(), Arc::new(InMemoryCredentialStore::default()), &llm(false));

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert!(payload.database.detail.contains("clothing_item"));

        pool.close().await;
    }

    #[tokio::test]
    async fn closed_pool_is_degraded() {
        let pool = migrated_pool().await;
        pool.close().await;
        let state = HealthState::new(pool, Arc::new(InMemoryCredentialStore::default()), &llm(false));

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(payload.database.detail.starts_with("database query failed"));
    }
}
