use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde::Serialize;
use toml::Value;

use crate::commands::CommandResult;
use wardrobe_core::config::{resolve_config_path, AppConfig, LoadOptions};

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            )
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields: Vec<ConfigField> = effective_values(&config)
        .into_iter()
        .map(|(key, env_keys, value)| ConfigField {
            key,
            value,
            source: field_source(
                key,
                env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        })
        .collect();

    match serde_json::to_value(&fields) {
        Ok(data) => CommandResult::success_with_data(
            "config",
            "effective config (source precedence: env > file > default)",
            Some(data),
        ),
        Err(error) => CommandResult::failure("config", "serialization", error.to_string(), 2),
    }
}

type FieldRow = (&'static str, &'static [&'static str], String);

fn row(key: &'static str, env_keys: &'static [&'static str], value: String) -> FieldRow {
    (key, env_keys, value)
}

fn effective_values(config: &AppConfig) -> Vec<FieldRow> {
    let api_key = match &config.llm.api_key {
        Some(secret) => redact_token(secret.expose_secret()),
        None => "<unset>".to_string(),
    };

    vec![
        row("database.url", &["WARDROBE_DATABASE_URL"], config.database.url.clone()),
        row(
            "database.max_connections",
            &["WARDROBE_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        row(
            "database.timeout_secs",
            &["WARDROBE_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        row("llm.enabled", &["WARDROBE_LLM_ENABLED"], config.llm.enabled.to_string()),
        row("llm.provider", &["WARDROBE_LLM_PROVIDER"], config.llm.provider.as_str().to_string()),
        row("llm.model", &["WARDROBE_LLM_MODEL"], config.llm.model.clone()),
        row("llm.base_url", &["WARDROBE_LLM_BASE_URL"], config.llm.effective_base_url()),
        row("llm.api_key", &["WARDROBE_LLM_API_KEY"], api_key),
        row(
            "llm.timeout_secs",
            &["WARDROBE_LLM_TIMEOUT_SECS"],
            config.llm.timeout_secs.to_string(),
        ),
        row(
            "planner.cache_ttl_hours",
            &["WARDROBE_PLANNER_CACHE_TTL_HOURS"],
            config.planner.cache_ttl_hours.to_string(),
        ),
        row(
            "planner.rate_limit_max_calls",
            &["WARDROBE_PLANNER_RATE_LIMIT_MAX_CALLS"],
            config.planner.rate_limit_max_calls.to_string(),
        ),
        row(
            "planner.rate_limit_window_secs",
            &["WARDROBE_PLANNER_RATE_LIMIT_WINDOW_SECS"],
            config.planner.rate_limit_window_secs.to_string(),
        ),
        row(
            "planner.cooldown_secs",
            &["WARDROBE_PLANNER_COOLDOWN_SECS"],
            config.planner.cooldown_secs.to_string(),
        ),
        row(
            "planner.max_suggestions",
            &["WARDROBE_PLANNER_MAX_SUGGESTIONS"],
            config.planner.max_suggestions.to_string(),
        ),
        row(
            "server.bind_address",
            &["WARDROBE_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        row("server.port", &["WARDROBE_SERVER_PORT"], config.server.port.to_string()),
        row(
            "server.graceful_shutdown_secs",
            &["WARDROBE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        row(
            "logging.level",
            &["WARDROBE_LOGGING_LEVEL", "WARDROBE_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        row(
            "logging.format",
            &["WARDROBE_LOGGING_FORMAT", "WARDROBE_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ]
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config file"));
            return format!("file ({})", file_path.display());
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Keeps a recognisable key prefix (`sk-`, `sk-ant-`) and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
