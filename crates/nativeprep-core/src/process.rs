//! Blocking subprocess plumbing and command probing.
//!
//! Every external tool the pipeline consults goes through a [`CommandRunner`].
//! Production code uses [`SystemRunner`]; tests script the runner to simulate
//! a machine without touching the real one.

use crate::environment::Environment;
use std::fmt;
use std::process::{Command, Stdio};
use tracing::debug;

/// A single external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,
    /// Arguments in order
    pub args: Vec<String>,
    /// Complete environment for the child; `None` inherits the parent's
    pub env: Option<Environment>,
}

impl Invocation {
    /// Create an invocation that inherits the parent environment.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: None,
        }
    }

    /// Run the child with exactly this environment.
    #[must_use]
    pub fn with_env(mut self, env: &Environment) -> Self {
        self.env = Some(env.clone());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the command exited with status 0
    pub success: bool,
    /// Exit code, if the command was not killed by a signal
    pub code: Option<i32>,
    /// Standard output, lossily decoded
    pub stdout: String,
}

impl CommandOutput {
    /// A successful run printing `stdout`.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
        }
    }

    /// A run that exited with a non-zero `code` and no output.
    #[must_use]
    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
        }
    }

    /// Standard output with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> &str {
        self.stdout.trim()
    }
}

/// Runs external commands to completion.
pub trait CommandRunner {
    /// Run `invocation` and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the program could not be launched at all.
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        (**self).run(invocation)
    }
}

impl<R: CommandRunner + ?Sized> CommandRunner for Box<R> {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        (**self).run(invocation)
    }
}

/// Runs commands on the host with `std::process`.
///
/// Stdin is closed and stderr is discarded; only stdout is captured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null());

        if let Some(env) = &invocation.env {
            cmd.env_clear().envs(env.iter_os());
        }

        let output = cmd.output()?;
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

/// Result of asking whether something exists on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The probe ran and found it
    Found,
    /// The probe ran and did not find it
    NotFound,
    /// The probe itself could not run
    ProbeError(String),
}

impl ProbeOutcome {
    /// Whether the resource counts as present.
    ///
    /// A probe that could not run counts as absent.
    #[must_use]
    pub fn is_present(&self) -> bool {
        match self {
            Self::Found => true,
            Self::NotFound => false,
            Self::ProbeError(reason) => {
                debug!(%reason, "Probe failed to run; treating as not found");
                false
            }
        }
    }
}

/// Ask the OS whether `name` is an executable on `PATH`.
pub fn probe_command<R: CommandRunner + ?Sized>(runner: &R, name: &str) -> ProbeOutcome {
    let invocation = Invocation::new("which", [name]);
    match runner.run(&invocation) {
        Ok(output) if output.success => ProbeOutcome::Found,
        Ok(_) => ProbeOutcome::NotFound,
        Err(e) => ProbeOutcome::ProbeError(format!("failed to run `{invocation}`: {e}")),
    }
}

/// Check if a command is callable on the system.
pub fn have_command<R: CommandRunner + ?Sized>(runner: &R, name: &str) -> bool {
    let present = probe_command(runner, name).is_present();
    debug!(command = %name, present, "Probed command");
    present
}
