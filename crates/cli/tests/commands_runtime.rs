use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use wardrobe_cli::commands::{config, migrate, plan, seed};

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("WARDROBE_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("WARDROBE_DATABASE_URL", "postgres://localhost/wardrobe")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_loads_demo_wardrobe_for_requested_owner() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("WARDROBE_DATABASE_URL", url.as_str())], || {
        let result = seed::run("alice");
        assert_eq!(result.exit_code, 0, "expected seed success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("alice"), "message should name the owner: {message}");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("WARDROBE_DATABASE_URL", url.as_str())], || {
        let first = seed::run("demo-owner");
        let second = seed::run("demo-owner");
        assert_eq!(first.exit_code, 0);
        assert_eq!(second.exit_code, 0);
        assert_eq!(
            parse_payload(&first.output)["message"],
            parse_payload(&second.output)["message"]
        );
    });
}

#[test]
fn blank_owner_is_rejected_before_touching_the_database() {
    with_env(&[("WARDROBE_DATABASE_URL", "postgres://not-used")], || {
        let result = plan::run("  ");
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "invalid_input");
    });
}

#[test]
fn plan_after_seed_prints_a_full_week() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("WARDROBE_DATABASE_URL", url.as_str()), ("WARDROBE_LLM_ENABLED", "false")], || {
        assert_eq!(seed::run("bob").exit_code, 0);

        let result = plan::run("bob");
        assert_eq!(result.exit_code, 0, "expected plan success: {}", result.output);
        assert_eq!(result.output.lines().count(), 1, "stdout must be one JSON line");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "plan");
        assert_eq!(payload["data"]["state"], "completed");
        assert_eq!(payload["data"]["days"].as_array().map(Vec::len), Some(7));
        assert!(payload["data"]["fallback_reasons"]
            .as_array()
            .is_some_and(|reasons| reasons.iter().any(|reason| reason == "endpoint_disabled")));
        assert!(payload["data"]["plan"]["days"]["monday"]["upper_id"].is_string());
    });
}

#[test]
fn plan_without_wardrobe_reports_insufficient_wardrobe() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = database_url(&dir);
    with_env(&[("WARDROBE_DATABASE_URL", url.as_str()), ("WARDROBE_LLM_ENABLED", "false")], || {
        let result = plan::run("nobody");
        assert_eq!(result.exit_code, 7);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "insufficient_wardrobe");
    });
}

#[test]
fn config_reports_sources_and_redacts_api_key() {
    with_env(
        &[("WARDROBE_LLM_API_KEY", "sk-live-secret"), ("WARDROBE_LOG_LEVEL", "debug")],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);
            assert!(!result.output.contains("live-secret"));

            let payload = parse_payload(&result.output);
            let fields = payload["data"].as_array().cloned().unwrap_or_default();
            let field = |key: &str| {
                fields.iter().find(|field| field["key"] == key).cloned().unwrap_or(Value::Null)
            };

            assert_eq!(field("llm.api_key")["value"], "sk-***");
            assert_eq!(field("llm.api_key")["source"], "env (WARDROBE_LLM_API_KEY)");
            assert_eq!(field("logging.level")["value"], "debug");
            assert_eq!(field("logging.level")["source"], "env (WARDROBE_LOG_LEVEL)");
            assert_eq!(field("planner.cache_ttl_hours")["value"], "24");
            assert_eq!(field("planner.cache_ttl_hours")["source"], "default");
        },
    );
}

#[test]
fn config_returns_failure_for_invalid_override() {
    with_env(&[("WARDROBE_PLANNER_MAX_SUGGESTIONS", "many")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

fn database_url(dir: &tempfile::TempDir) -> String {
    format!("sqlite://{}", dir.path().join("wardrobe.db").display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "WARDROBE_DATABASE_URL",
        "WARDROBE_DATABASE_MAX_CONNECTIONS",
        "WARDROBE_DATABASE_TIMEOUT_SECS",
        "WARDROBE_LLM_ENABLED",
        "WARDROBE_LLM_PROVIDER",
        "WARDROBE_LLM_API_KEY",
        "WARDROBE_LLM_BASE_URL",
        "WARDROBE_LLM_MODEL",
        "WARDROBE_LLM_TIMEOUT_SECS",
        "WARDROBE_PLANNER_CACHE_TTL_HOURS",
        "WARDROBE_PLANNER_RATE_LIMIT_MAX_CALLS",
        "WARDROBE_PLANNER_RATE_LIMIT_WINDOW_SECS",
        "WARDROBE_PLANNER_COOLDOWN_SECS",
        "WARDROBE_PLANNER_MAX_SUGGESTIONS",
        "WARDROBE_SERVER_BIND_ADDRESS",
        "WARDROBE_SERVER_PORT",
        "WARDROBE_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "WARDROBE_LOGGING_LEVEL",
        "WARDROBE_LOGGING_FORMAT",
        "WARDROBE_LOG_LEVEL",
        "WARDROBE_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
