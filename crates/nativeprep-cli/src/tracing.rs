//! Tracing configuration for the nativeprep CLI
//!
//! Every log line goes to stderr so stdout stays free for `--emit -`.

use crate::errors::CliError;
use std::io;
pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Tracing output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    /// Pretty-printed human-readable format
    Pretty,
    /// Compact single-line format
    Compact,
    /// Structured JSON format
    Json,
}

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    /// Show all logs (trace level)
    Trace,
    /// Show debug and above
    Debug,
    /// Show info and above
    Info,
    /// Show warnings and above (default)
    Warn,
    /// Show errors only
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// Tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub format: TracingFormat,
    pub level: Level,
    /// Explicit filter directive from `--log-filter`; overrides `RUST_LOG` and `level`
    pub filter: Option<String>,
}

/// Correlation ID shared by every event of this run
static CORRELATION_ID: std::sync::OnceLock<Uuid> = std::sync::OnceLock::new();

/// Get or create the correlation ID for the current run
pub fn correlation_id() -> Uuid {
    *CORRELATION_ID.get_or_init(Uuid::new_v4)
}

/// Filter directive for `level` across the CLI and the core library.
fn default_directive(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    format!("nativeprep={level},nativeprep_core={level}")
}

/// Event filter: `--log-filter`, else `RUST_LOG`, else `level` for our crates.
fn env_filter(config: &TracingConfig) -> Result<EnvFilter, CliError> {
    match &config.filter {
        Some(filter) => EnvFilter::try_new(filter),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_directive(config.level))),
    }
    .map_err(CliError::tracing)
}

/// Initialize tracing with the given configuration
pub fn init_tracing(config: TracingConfig) -> Result<(), CliError> {
    let correlation_id = correlation_id();

    let env_filter = env_filter(&config)?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format {
        TracingFormat::Pretty => {
            let layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stderr)
                .with_target(true);
            registry.with(layer).try_init()
        }
        TracingFormat::Compact => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(false);
            registry.with(layer).try_init()
        }
        TracingFormat::Json => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true);
            registry.with(layer).try_init()
        }
    }
    .map_err(CliError::tracing)?;

    tracing::debug!(
        correlation_id = %correlation_id,
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized for nativeprep"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(filter: Option<&str>) -> TracingConfig {
        TracingConfig {
            format: TracingFormat::Compact,
            level: Level::WARN,
            filter: filter.map(String::from),
        }
    }

    #[test]
    fn test_explicit_filter_overrides_rust_log() {
        temp_env::with_var("RUST_LOG", Some("off"), || {
            let filter = env_filter(&config(Some("nativeprep_core::gate=trace"))).unwrap();
            assert_eq!(filter.to_string(), "nativeprep_core::gate=trace");
        });
    }

    #[test]
    fn test_level_used_without_filter_or_rust_log() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = env_filter(&config(None)).unwrap();
            let directives = filter.to_string();
            assert!(directives.contains("nativeprep=warn"));
            assert!(directives.contains("nativeprep_core=warn"));
        });
    }

    #[test]
    fn test_invalid_filter_is_error() {
        assert!(env_filter(&config(Some("nativeprep=loudest"))).is_err());
    }

    #[test]
    fn test_default_directive_covers_core() {
        assert_eq!(
            default_directive(Level::DEBUG),
            "nativeprep=debug,nativeprep_core=debug"
        );
    }

    #[test]
    fn test_correlation_id_consistency() {
        assert_eq!(correlation_id(), correlation_id());
    }
}
