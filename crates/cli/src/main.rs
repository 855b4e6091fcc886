use std::process::ExitCode;

use anyhow::{anyhow, Result};
use quotecraft_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) -> Result<()> {
    use quotecraft_core::config::LogFormat::*;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG directives win over `logging.level`.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    // stdout carries the JSON command outcome; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    }
    .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn main() -> Result<ExitCode> {
    // A broken config is reported by the command itself as a structured failure.
    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config)?;
    }

    Ok(quotecraft_cli::run())
}
