//! The language runtime the native extensions are built against.
//!
//! The extensions link against the runtime's C API, so its version decides
//! header locations, the `pkg-config` package, the dev-config tool and the
//! module search directories.

use crate::environment::Environment;
use crate::process::{CommandRunner, Invocation};
use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Variable holding the runtime's module search path.
pub const MODULE_SEARCH_PATH: &str = "PYTHONPATH";

const VERSION_PROBE: &str = "import sys; print('%d.%d' % sys.version_info[:2])";

/// A detected runtime interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    /// Interpreter command (e.g. `python2`)
    pub interpreter: String,
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
}

impl Runtime {
    /// Create a runtime description without probing.
    #[must_use]
    pub fn new(interpreter: impl Into<String>, major: u32, minor: u32) -> Self {
        Self {
            interpreter: interpreter.into(),
            major,
            minor,
        }
    }

    /// Ask `interpreter` for its version.
    ///
    /// # Errors
    ///
    /// Returns an error if the interpreter cannot be run or prints something
    /// other than `major.minor`.
    pub fn detect<R: CommandRunner + ?Sized>(runner: &R, interpreter: &str) -> Result<Self> {
        let invocation = Invocation::new(interpreter, ["-c", VERSION_PROBE]);
        let output = runner
            .run(&invocation)
            .map_err(|e| Error::command(invocation.to_string(), e.to_string()))?;
        if !output.success {
            return Err(Error::command(
                invocation.to_string(),
                format!("exited with {:?}", output.code),
            ));
        }

        let (major, minor) = parse_version(output.trimmed()).ok_or_else(|| {
            Error::command(
                invocation.to_string(),
                format!("unrecognised version `{}`", output.trimmed()),
            )
        })?;
        debug!(%interpreter, major, minor, "Detected runtime");
        Ok(Self::new(interpreter, major, minor))
    }

    /// `major.minor`, e.g. `2.7`.
    #[must_use]
    pub fn version_tag(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// The runtime's dev-config tool, e.g. `python2.7-config`.
    #[must_use]
    pub fn dev_config_tool(&self) -> String {
        format!("python{}-config", self.version_tag())
    }

    /// Versioned `pkg-config` package, e.g. `python-2.7`.
    #[must_use]
    pub fn pkg_config_name(&self) -> String {
        format!("python-{}", self.version_tag())
    }

    /// Versioned library name, e.g. `python2.7`.
    #[must_use]
    pub fn library_name(&self) -> String {
        format!("python{}", self.version_tag())
    }

    /// Versioned module directory relative to a `lib` dir, e.g. `python2.7/site-packages`.
    #[must_use]
    pub fn site_packages_suffix(&self) -> PathBuf {
        PathBuf::from(self.library_name()).join("site-packages")
    }

    /// Local and system module directories, in search priority order.
    ///
    /// Debian-based systems use `dist-packages` instead of `site-packages`.
    #[must_use]
    pub fn site_package_dirs(&self) -> Vec<PathBuf> {
        let lib = self.library_name();
        let lib = &lib;
        ["/usr/local/lib", "/usr/lib"]
            .iter()
            .flat_map(|root| {
                ["site-packages", "dist-packages"]
                    .iter()
                    .map(move |leaf| PathBuf::from(root).join(lib).join(leaf))
            })
            .collect()
    }

    /// Install prefix reported by `<dev-config> --prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot run or prints nothing.
    pub fn prefix<R: CommandRunner + ?Sized>(&self, runner: &R, env: &Environment) -> Result<PathBuf> {
        let invocation = Invocation::new(self.dev_config_tool(), ["--prefix"]).with_env(env);
        let output = runner
            .run(&invocation)
            .map_err(|e| Error::command(invocation.to_string(), e.to_string()))?;
        let prefix = output.trimmed();
        if !output.success || prefix.is_empty() {
            return Err(Error::command(invocation.to_string(), "no prefix reported"));
        }
        Ok(PathBuf::from(prefix))
    }

    /// Whether `module` imports once `search_dirs` lead the module search path.
    pub fn can_import<R: CommandRunner + ?Sized>(
        &self,
        runner: &R,
        env: &Environment,
        module: &str,
        search_dirs: &[PathBuf],
    ) -> bool {
        let dirs: Vec<String> = search_dirs
            .iter()
            .map(|d| d.to_string_lossy().into_owned())
            .collect();
        let env = env.prepend_search_path(MODULE_SEARCH_PATH, &dirs);
        let invocation =
            Invocation::new(&self.interpreter, ["-c".to_string(), format!("import {module}")])
                .with_env(&env);

        match runner.run(&invocation) {
            Ok(output) => output.success,
            Err(e) => {
                debug!(command = %invocation, error = %e, "Import check could not run");
                false
            }
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interpreter, self.version_tag())
    }
}

/// Parse `major.minor` (trailing components ignored).
#[must_use]
pub fn parse_version(text: &str) -> Option<(u32, u32)> {
    let mut parts = text.trim().split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    Some((major, minor))
}
