//! Tracing initialization from the runtime configuration.

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Map the configured level to a tracing directive. `fatal` and `panic` are
/// kept for compatibility and treated as `error`.
fn directive(level: &str) -> CliResult<&'static str> {
    Ok(match level {
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "fatal" | "panic" => "error",
        other => {
            return Err(CliError::Config(format!(
                "unknown log_level {other:?}, expected debug|info|warn|error|fatal|panic"
            )))
        }
    })
}

/// Install the global subscriber. Call once, before any work.
pub fn init(config: &AppConfig) -> CliResult<()> {
    let filter = EnvFilter::new(directive(&config.log_level)?);

    match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        "text" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        other => {
            return Err(CliError::Config(format!(
                "unknown log_format {other:?}, expected text|json"
            )))
        }
    }
    Ok(())
}
