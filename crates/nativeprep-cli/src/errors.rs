//! CLI-specific error types
//!
//! Library failures already carry miette diagnostics and pass through
//! unchanged; these cover what only the binary does.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// CLI-specific error types with diagnostics
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Failed to write build plan to {}", path.display())]
    #[diagnostic(
        code(nativeprep::cli::emit_failed),
        help("Check that the parent directory exists and is writable")
    )]
    Emit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize build plan")]
    #[diagnostic(code(nativeprep::cli::serialize_failed))]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("Tracing initialization failed")]
    #[diagnostic(
        code(nativeprep::cli::tracing_error),
        help("Check --log-filter, NATIVEPREP_LOG and RUST_LOG")
    )]
    Tracing {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl CliError {
    pub fn emit(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Emit {
            path: path.into(),
            source,
        }
    }

    pub fn tracing(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Tracing {
            source: Box::new(source),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize { source }
    }
}
