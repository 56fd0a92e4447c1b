use crate::tracing::{LogLevel, TracingFormat};
use clap::Parser;
use nativeprep_core::PreflightConfig;
use std::path::PathBuf;

/// Where the JSON build plan goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitTarget {
    Stdout,
    File(PathBuf),
}

impl std::str::FromStr for EmitTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err("emit target must not be empty".to_string()),
            "-" => Ok(Self::Stdout),
            path => Ok(Self::File(PathBuf::from(path))),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "nativeprep")]
#[command(about = "Check native build dependencies and plan the extension builds")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, short = 'c', env = "NATIVEPREP_CONFIG", help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "NATIVEPREP_SOURCE_ROOT",
        help = "Root of the source tree holding the extension sources"
    )]
    pub source_root: Option<PathBuf>,

    #[arg(long, help = "Interpreter used for version detection and the import check")]
    pub interpreter: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Write the build plan as JSON to PATH, or to stdout with '-'"
    )]
    pub emit: Option<EmitTarget>,

    #[arg(
        short = 'l',
        long,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(long, help = "Log output format", default_value = "compact", value_enum)]
    pub format: TracingFormat,

    #[arg(
        long,
        env = "NATIVEPREP_LOG",
        value_name = "DIRECTIVES",
        help = "Tracing filter directives, e.g. 'nativeprep_core::gate=debug'; overrides --level and RUST_LOG"
    )]
    pub log_filter: Option<String>,
}

impl Cli {
    /// Configuration from `--config` (or defaults) with flag overrides applied.
    pub fn preflight_config(&self) -> nativeprep_core::Result<PreflightConfig> {
        let mut config = match &self.config {
            Some(path) => PreflightConfig::load(path)?,
            None => PreflightConfig::default(),
        };
        if let Some(root) = &self.source_root {
            config.source_root.clone_from(root);
        }
        if let Some(interpreter) = &self.interpreter {
            config.runtime.interpreter.clone_from(interpreter);
        }
        Ok(config)
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
