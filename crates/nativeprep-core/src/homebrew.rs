//! Homebrew discovery.
//!
//! Homebrew is optional everywhere: when it cannot be found the pipeline
//! simply does not add its directories.

use crate::environment::Environment;
use crate::process::{CommandRunner, Invocation, have_command};
use crate::runtime::Runtime;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Homebrew executable.
pub const BREW: &str = "brew";

/// Variable read when `brew` itself cannot report a prefix.
pub const HOMEBREW_PREFIX: &str = "HOMEBREW_PREFIX";

/// A discovered Homebrew installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homebrew {
    prefix: PathBuf,
}

impl Homebrew {
    /// Use an installation rooted at `prefix`.
    #[must_use]
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Locate Homebrew via `brew --prefix`, falling back to `HOMEBREW_PREFIX`.
    ///
    /// Any failure of `brew` (not installed, non-zero exit, no output) is
    /// treated as "not installed" and only the variable is consulted.
    pub fn discover<R: CommandRunner + ?Sized>(runner: &R, env: &Environment) -> Option<Self> {
        let invocation = Invocation::new(BREW, ["--prefix"]).with_env(env);
        let from_brew = match runner.run(&invocation) {
            Ok(output) if output.success && !output.trimmed().is_empty() => {
                Some(PathBuf::from(output.trimmed()))
            }
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "brew could not run");
                None
            }
        };

        let prefix = from_brew.or_else(|| {
            let fallback = env
                .get(HOMEBREW_PREFIX)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from);
            if let Some(prefix) = &fallback {
                warn!(prefix = %prefix.display(), "brew gave no prefix; using {HOMEBREW_PREFIX}");
            }
            fallback
        });
        debug!(prefix = ?prefix, "Homebrew discovery");
        prefix.map(Self::new)
    }

    /// Install prefix.
    #[must_use]
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// `<prefix>/include`.
    #[must_use]
    pub fn include_dir(&self) -> PathBuf {
        self.prefix.join("include")
    }

    /// `<prefix>/lib`.
    #[must_use]
    pub fn lib_dir(&self) -> PathBuf {
        self.prefix.join("lib")
    }

    /// `<prefix>/lib/pythonX.Y/site-packages`.
    ///
    /// Formulae that ship runtime bindings install them here, built against
    /// the first interpreter on `PATH`.
    #[must_use]
    pub fn site_packages(&self, runtime: &Runtime) -> PathBuf {
        self.lib_dir().join(runtime.site_packages_suffix())
    }
}

/// Whether `formula` is installed, per `brew ls --versions`.
pub fn formula_installed<R: CommandRunner + ?Sized>(
    runner: &R,
    env: &Environment,
    formula: &str,
) -> bool {
    if !have_command(runner, BREW) {
        return false;
    }
    let invocation = Invocation::new(BREW, ["ls", "--versions", formula]).with_env(env);
    runner
        .run(&invocation)
        .is_ok_and(|output| !output.trimmed().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::CommandOutput;
    use std::io;

    /// Answers `brew` subcommands by their last argument.
    struct Brew {
        prefix: Option<&'static str>,
        numpy: bool,
    }

    impl CommandRunner for Brew {
        fn run(&self, inv: &Invocation) -> io::Result<CommandOutput> {
            match (inv.program.as_str(), inv.args.last().map(String::as_str)) {
                ("which", _) | ("brew", Some("--prefix")) => match self.prefix {
                    Some(prefix) => Ok(CommandOutput::ok(format!("{prefix}\n"))),
                    None => Err(io::Error::new(io::ErrorKind::NotFound, "no brew")),
                },
                ("brew", Some("numpy")) if self.numpy => Ok(CommandOutput::ok("numpy 1.16.6\n")),
                _ => Ok(CommandOutput::ok("")),
            }
        }
    }

    #[test]
    fn test_discover_from_brew() {
        let runner = Brew {
            prefix: Some("/opt/homebrew"),
            numpy: false,
        };
        let env = Environment::from_vars([(HOMEBREW_PREFIX, "/ignored")]);
        let brew = Homebrew::discover(&runner, &env).unwrap();
        assert_eq!(brew.prefix(), Path::new("/opt/homebrew"));
    }

    #[test]
    fn test_discover_falls_back_to_variable() {
        let runner = Brew {
            prefix: None,
            numpy: false,
        };
        let env = Environment::from_vars([(HOMEBREW_PREFIX, "/usr/local")]);
        assert_eq!(
            Homebrew::discover(&runner, &env),
            Some(Homebrew::new("/usr/local"))
        );
        assert_eq!(Homebrew::discover(&runner, &Environment::new()), None);
    }

    #[test]
    fn test_formula_installed() {
        let env = Environment::new();
        let with_numpy = Brew {
            prefix: Some("/opt/homebrew"),
            numpy: true,
        };
        assert!(formula_installed(&with_numpy, &env, "numpy"));
        assert!(!formula_installed(&with_numpy, &env, "scipy"));

        let no_brew = Brew {
            prefix: None,
            numpy: true,
        };
        assert!(!formula_installed(&no_brew, &env, "numpy"));
    }

    #[test]
    fn test_paths() {
        let brew = Homebrew::new("/opt/homebrew");
        let rt = Runtime::new("python2", 2, 7);
        assert_eq!(brew.include_dir(), PathBuf::from("/opt/homebrew/include"));
        assert_eq!(brew.lib_dir(), PathBuf::from("/opt/homebrew/lib"));
        assert_eq!(
            brew.site_packages(&rt),
            PathBuf::from("/opt/homebrew/lib/python2.7/site-packages")
        );
    }
}
