//! Error types for nativeprep
//!
//! Absence of a tool or library is never an error here; probes report it as
//! `false`. These variants cover the hard failures that abort a build plan.

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for nativeprep operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A dependency requirement was not met; the build must not proceed
    #[error("{message}")]
    #[diagnostic(
        code(nativeprep::gate::failed),
        help("Install the missing requirement and re-run the build")
    )]
    DependencyCheck {
        /// Diagnostic naming the first failed requirement
        message: String,
    },

    /// The dynamic-linker cache has no entry for a library
    #[error("Library {name} was not found in the dynamic linker cache")]
    #[diagnostic(
        code(nativeprep::ldconfig::not_installed),
        help("Run `ldconfig -p` to list the libraries the linker can see")
    )]
    LibraryNotInstalled {
        /// Base name that was looked up (e.g. `libOpenCL`)
        name: String,
    },

    /// A required external command could not be run or produced unusable output
    #[error("Command `{command}` failed: {message}")]
    #[diagnostic(code(nativeprep::command::failed))]
    Command {
        /// Command line that was attempted
        command: String,
        /// What went wrong
        message: String,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(nativeprep::config::invalid))]
    Configuration {
        /// Error message describing the configuration problem
        message: String,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(nativeprep::io::error))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path involved, if any
        path: Option<Box<Path>>,
        /// Description of the operation that failed
        operation: String,
    },
}

impl Error {
    /// Create a dependency check failure
    #[must_use]
    pub fn dependency_check(message: impl Into<String>) -> Self {
        Self::DependencyCheck {
            message: message.into(),
        }
    }

    /// Create a library-not-installed error
    #[must_use]
    pub fn library_not_installed(name: impl Into<String>) -> Self {
        Self::LibraryNotInstalled { name: name.into() }
    }

    /// Create a command failure
    #[must_use]
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an I/O error tied to a path
    #[must_use]
    pub fn io(
        source: std::io::Error,
        path: Option<PathBuf>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }
}

/// Result type for nativeprep operations
pub type Result<T> = std::result::Result<T, Error>;
