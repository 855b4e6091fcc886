use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use quotecraft_core::config::{AppConfig, LoadOptions};
use toml::Value;

/// `(key path, primary env var, alias env var)` for every effective setting.
const FIELDS: &[(&str, &str, Option<&str>)] = &[
    ("database.url", "QUOTECRAFT_DATABASE_URL", None),
    ("database.max_connections", "QUOTECRAFT_DATABASE_MAX_CONNECTIONS", None),
    ("database.timeout_secs", "QUOTECRAFT_DATABASE_TIMEOUT_SECS", None),
    ("pricing.currency", "QUOTECRAFT_PRICING_CURRENCY", None),
    ("logging.level", "QUOTECRAFT_LOGGING_LEVEL", Some("QUOTECRAFT_LOG_LEVEL")),
    ("logging.format", "QUOTECRAFT_LOGGING_FORMAT", Some("QUOTECRAFT_LOG_FORMAT")),
];

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_key, alias) in FIELDS {
        let value = effective_value(&config, key_path);
        let source = field_source(
            key_path,
            &[Some(*env_key), *alias],
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn effective_value(config: &AppConfig, key_path: &str) -> String {
    match key_path {
        "database.url" => config.database.url.clone(),
        "database.max_connections" => config.database.max_connections.to_string(),
        "database.timeout_secs" => config.database.timeout_secs.to_string(),
        "pricing.currency" => config.pricing.currency.clone(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format),
        _ => "<unknown>".to_string(),
    }
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("quotecraft.toml"), PathBuf::from("config/quotecraft.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[Option<&str>],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys.iter().flatten() {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
