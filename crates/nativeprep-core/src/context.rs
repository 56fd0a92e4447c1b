//! Per-run configuration context.
//!
//! Everything the pipeline reads from the host is gathered here once: the
//! platform, an environment snapshot and its augmented copy, the runtime
//! version and the Homebrew prefix. Components borrow the context instead of
//! consulting process-wide state.

use crate::config::PreflightConfig;
use crate::environment::Environment;
use crate::homebrew::Homebrew;
use crate::ldconfig::LinkerCache;
use crate::library::LibraryResolver;
use crate::pkg_config::PkgConfig;
use crate::platform::{Platform, PlatformStrategy, strategy_for};
use crate::process::{CommandRunner, SystemRunner};
use crate::runtime::Runtime;
use crate::{Error, Result};
use tracing::debug;

/// Everything a preflight run needs, built once.
pub struct PreflightContext {
    runner: Box<dyn CommandRunner>,
    platform: Platform,
    strategy: Box<dyn PlatformStrategy>,
    env: Environment,
    augmented: Environment,
    runtime: Runtime,
    homebrew: Option<Homebrew>,
    config: PreflightConfig,
}

impl PreflightContext {
    /// Start building a context for `config`.
    #[must_use]
    pub fn builder(config: PreflightConfig) -> PreflightContextBuilder {
        PreflightContextBuilder::new(config)
    }

    /// Runner for all external commands.
    #[must_use]
    pub fn runner(&self) -> &dyn CommandRunner {
        self.runner.as_ref()
    }

    /// Target platform.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Strategy for the target platform.
    #[must_use]
    pub fn strategy(&self) -> &dyn PlatformStrategy {
        self.strategy.as_ref()
    }

    /// Environment snapshot taken when the context was built.
    #[must_use]
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Snapshot with the local package-config directories added.
    #[must_use]
    pub fn augmented_env(&self) -> &Environment {
        &self.augmented
    }

    /// Detected runtime.
    #[must_use]
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Homebrew installation, if one was found.
    #[must_use]
    pub fn homebrew(&self) -> Option<&Homebrew> {
        self.homebrew.as_ref()
    }

    /// Loaded configuration.
    #[must_use]
    pub fn config(&self) -> &PreflightConfig {
        &self.config
    }

    /// `pkg-config` under the augmented environment.
    #[must_use]
    pub fn pkg_config(&self) -> PkgConfig<'_, dyn CommandRunner> {
        PkgConfig::new(&*self.runner, &self.augmented)
    }

    /// Dynamic-linker cache queries.
    #[must_use]
    pub fn linker_cache(&self) -> LinkerCache<'_, dyn CommandRunner> {
        LinkerCache::new(&*self.runner, self.platform.arch)
    }

    /// Library presence checks for the target platform.
    #[must_use]
    pub fn libraries(&self) -> LibraryResolver<'_, dyn CommandRunner> {
        LibraryResolver::new(&*self.runner, &self.augmented, self.platform)
    }
}

impl std::fmt::Debug for PreflightContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreflightContext")
            .field("platform", &self.platform)
            .field("runtime", &self.runtime)
            .field("homebrew", &self.homebrew)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`PreflightContext`].
///
/// Anything not supplied is discovered from the host in [`build`](Self::build).
pub struct PreflightContextBuilder {
    config: PreflightConfig,
    runner: Option<Box<dyn CommandRunner>>,
    platform: Option<Platform>,
    env: Option<Environment>,
    runtime: Option<Runtime>,
    homebrew: Option<Option<Homebrew>>,
}

impl PreflightContextBuilder {
    /// Create a builder for `config`.
    #[must_use]
    pub fn new(config: PreflightConfig) -> Self {
        Self {
            config,
            runner: None,
            platform: None,
            env: None,
            runtime: None,
            homebrew: None,
        }
    }

    /// Run commands with `runner` instead of the host.
    #[must_use]
    pub fn runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Some(Box::new(runner));
        self
    }

    /// Target `platform` instead of the host's.
    #[must_use]
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use `env` instead of a snapshot of the process environment.
    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    /// Use a known runtime instead of asking the interpreter.
    #[must_use]
    pub fn runtime(mut self, runtime: Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Use a known Homebrew installation (or none) instead of discovering it.
    #[must_use]
    pub fn homebrew(mut self, homebrew: Option<Homebrew>) -> Self {
        self.homebrew = Some(homebrew);
        self
    }

    /// Discover whatever was not supplied and build the context.
    ///
    /// # Errors
    ///
    /// Returns an error if the host platform is unsupported or the runtime
    /// version cannot be determined.
    pub fn build(self) -> Result<PreflightContext> {
        let runner = self.runner.unwrap_or_else(|| Box::new(SystemRunner));
        let platform = match self.platform {
            Some(platform) => platform,
            None => Platform::current().ok_or_else(|| {
                Error::configuration("unsupported platform: only Linux and Darwin are supported")
            })?,
        };
        let env = self.env.unwrap_or_else(Environment::from_process);
        let augmented = env.augmented();

        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Runtime::detect(runner.as_ref(), &self.config.runtime.interpreter)?,
        };
        let homebrew = match self.homebrew {
            Some(homebrew) => homebrew,
            None => Homebrew::discover(runner.as_ref(), &augmented),
        };

        debug!(%platform, %runtime, homebrew = ?homebrew, "Built preflight context");

        Ok(PreflightContext {
            strategy: strategy_for(platform.os),
            runner,
            platform,
            env,
            augmented,
            runtime,
            homebrew,
            config: self.config,
        })
    }
}
