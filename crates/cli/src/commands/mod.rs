pub mod config;
pub mod material;
pub mod migrate;
pub mod quote;
pub mod seed;
pub mod summary;

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use quotecraft_core::config::{AppConfig, LoadOptions};
use quotecraft_core::errors::{ApplicationError, InterfaceError};
use quotecraft_db::connection::connect_with_config;
use quotecraft_db::{migrations, DbPool};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// `(error_class, message, exit_code)` raised inside a database-backed command.
pub(crate) type CommandFailure = (&'static str, String, u8);

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(command: &str, message: impl Into<String>, data: Value) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Failure carrying the user-safe message and correlation id of an interface error.
    pub fn from_interface(command: &str, error: &InterfaceError) -> Self {
        let (error_class, exit_code) = match error {
            InterfaceError::BadRequest { .. } => ("bad_request", 7),
            InterfaceError::Forbidden { .. } => ("forbidden", 8),
            InterfaceError::NotFound { .. } => ("not_found", 9),
            InterfaceError::Conflict { .. } => ("conflict", 10),
            InterfaceError::ServiceUnavailable { .. } => ("service_unavailable", 11),
            InterfaceError::Internal { .. } => ("internal", 12),
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: format!("{} ({error})", error.user_message()),
            correlation_id: Some(error.correlation_id().to_string()),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn new_correlation_id() -> String {
    format!("cli-{}", uuid::Uuid::new_v4())
}

/// Logs a rejected command and renders it with the user-safe interface message.
pub(crate) fn interface_failure(
    command: &str,
    error: ApplicationError,
    correlation_id: &str,
) -> CommandResult {
    tracing::warn!(
        event_name = "cli.command_failed",
        correlation_id = %correlation_id,
        command,
        error = %error,
        "command rejected"
    );
    CommandResult::from_interface(command, &error.into_interface(correlation_id))
}

pub(crate) fn settle(result: Result<CommandResult, CommandResult>) -> CommandResult {
    match result {
        Ok(result) | Err(result) => result,
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value, CommandFailure> {
    serde_json::to_value(value).map_err(|error| ("serialization", error.to_string(), 12u8))
}

/// Loads config, opens the pool, applies pending migrations and runs `work` on a
/// current-thread runtime.
pub(crate) fn with_database<T, F, Fut>(command: &str, work: F) -> Result<T, CommandResult>
where
    F: FnOnce(AppConfig, DbPool) -> Fut,
    Fut: Future<Output = Result<T, CommandFailure>>,
{
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(command, "config_validation", format!("configuration issue: {error}"), 2)
    })?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        })?;

    let result = runtime.block_on(async move {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        tracing::debug!(event_name = "system.migrations_applied", "schema is current");

        let outcome = work(config, pool.clone()).await;
        pool.close().await;
        outcome
    });

    result.map_err(|(error_class, message, exit_code)| {
        CommandResult::failure(command, error_class, message, exit_code)
    })
}
