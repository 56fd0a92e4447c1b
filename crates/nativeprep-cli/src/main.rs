// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]
// The binary reports diagnostics on stderr and may emit the plan on stdout
#![allow(clippy::print_stdout, clippy::print_stderr)]

//! nativeprep: verify native build dependencies, then plan the extension builds.

mod cli;
mod errors;
mod tracing;

use crate::cli::{Cli, EmitTarget, parse};
use crate::errors::CliError;
use crate::tracing::TracingConfig;
use nativeprep_core::{BuildUnitDescriptor, DependencyGate, PreflightContext, plan};
use std::io::Write;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:?}");
        std::process::exit(1);
    }
}

fn run() -> miette::Result<()> {
    let cli = parse();

    crate::tracing::init_tracing(TracingConfig {
        format: cli.format,
        level: cli.level.into(),
        filter: cli.log_filter.clone(),
    })?;

    run_preflight(&cli)
}

fn run_preflight(cli: &Cli) -> miette::Result<()> {
    let _span = ::tracing::info_span!(
        "preflight",
        correlation_id = %crate::tracing::correlation_id()
    )
    .entered();

    let config = cli.preflight_config()?;
    let ctx = PreflightContext::builder(config).build()?;

    DependencyGate::new(&ctx).check().into_result()?;

    let units = plan(&ctx)?;
    if let Some(target) = &cli.emit {
        emit(&units, target)?;
    }
    Ok(())
}

fn emit(units: &[BuildUnitDescriptor], target: &EmitTarget) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(units)?;
    match target {
        EmitTarget::Stdout => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}").map_err(|e| CliError::emit("<stdout>", e))
        }
        EmitTarget::File(path) => {
            std::fs::write(path, format!("{json}\n")).map_err(|e| CliError::emit(path, e))
        }
    }
}
