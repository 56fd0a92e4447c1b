//! The dependency gate.
//!
//! Requirements are checked in a fixed order and the gate stops at the first
//! one that fails:
//!
//! 1. runtime major version
//! 2. external tools
//! 3. shared libraries
//! 4. object files inside libraries
//! 5. the runtime binding module for the image-processing library
//!
//! Later checks assume earlier ones passed (object-file checks call
//! `pkg-config`, for instance), so the order is part of the contract.

use crate::context::PreflightContext;
use crate::ldconfig::LDCONFIG;
use crate::pkg_config::PKG_CONFIG;
use crate::platform::Os;
use crate::process::have_command;
use crate::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, info};

/// Outcome of a gate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheckResult {
    /// Whether every requirement was met
    pub passed: bool,
    /// Names the first failed requirement; `None` on success
    pub message: Option<String>,
}

impl DependencyCheckResult {
    /// All requirements met.
    #[must_use]
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: None,
        }
    }

    /// A requirement failed.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }

    /// Convert a failure into [`Error::DependencyCheck`].
    ///
    /// # Errors
    ///
    /// Returns the failure diagnostic if the gate did not pass.
    pub fn into_result(self) -> Result<()> {
        if self.passed {
            Ok(())
        } else {
            Err(Error::dependency_check(
                self.message
                    .unwrap_or_else(|| "dependency check failed".to_string()),
            ))
        }
    }
}

/// Pass/fail gate over every build requirement.
pub struct DependencyGate<'a> {
    ctx: &'a PreflightContext,
}

impl<'a> DependencyGate<'a> {
    /// Gate the build described by `ctx`.
    #[must_use]
    pub fn new(ctx: &'a PreflightContext) -> Self {
        Self { ctx }
    }

    /// Tools that must be on `PATH`, in check order.
    #[must_use]
    pub fn required_tools(&self) -> Vec<String> {
        let mut tools = vec![PKG_CONFIG.to_string()];
        // ldconfig is not guaranteed outside Linux
        if self.ctx.platform().os == Os::Linux {
            tools.push(LDCONFIG.to_string());
        }
        tools.push(self.ctx.runtime().dev_config_tool());
        tools.extend(self.ctx.config().requirements.tools.iter().cloned());
        tools
    }

    /// Module search directories tried for the binding import, highest
    /// priority first.
    ///
    /// Homebrew's site-packages leads when Homebrew is installed, since
    /// formulae build their bindings against Homebrew's interpreter.
    #[must_use]
    pub fn binding_search_dirs(&self) -> Vec<PathBuf> {
        let runtime = self.ctx.runtime();
        self.ctx
            .homebrew()
            .map(|brew| brew.site_packages(runtime))
            .into_iter()
            .chain(runtime.site_package_dirs())
            .collect()
    }

    /// Run every check in order, stopping at the first failure.
    #[must_use]
    pub fn check(&self) -> DependencyCheckResult {
        let result = self.evaluate();
        match &result.message {
            None => info!("All build dependencies are satisfied"),
            Some(message) => info!(%message, "Dependency check failed"),
        }
        result
    }

    fn evaluate(&self) -> DependencyCheckResult {
        let runtime = self.ctx.runtime();
        let config = self.ctx.config();
        let required_major = config.runtime.required_major;

        if runtime.major != required_major {
            return DependencyCheckResult::fail(format!(
                "Python {} is not version {required_major}.x",
                runtime.version_tag()
            ));
        }

        for tool in self.required_tools() {
            if !have_command(self.ctx.runner(), &tool) {
                return DependencyCheckResult::fail(format!(
                    "{tool} is needed to complete the build process"
                ));
            }
        }

        let libraries = self.ctx.libraries();
        for library in &config.requirements.libraries {
            if !libraries.resolve(library) {
                return DependencyCheckResult::fail(format!(
                    "{library} library is needed to complete the build process"
                ));
            }
        }

        for req in &config.requirements.object_files {
            if !libraries.resolve_object_file(&req.package, &req.object) {
                return DependencyCheckResult::fail(format!(
                    "{} library is missing object file {}",
                    req.package, req.object
                ));
            }
        }

        let module = &config.runtime.binding_module;
        let search_dirs = self.binding_search_dirs();
        debug!(%module, dirs = ?search_dirs, "Checking binding import");
        if !runtime.can_import(
            self.ctx.runner(),
            self.ctx.env(),
            module,
            &search_dirs,
        ) {
            return DependencyCheckResult::fail(format!(
                "{module} could not be imported: opencv built with BUILD_opencv_python=ON required"
            ));
        }

        DependencyCheckResult::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_conversions() {
        assert!(DependencyCheckResult::pass().into_result().is_ok());

        let err = DependencyCheckResult::fail("pkg-config is needed to complete the build process")
            .into_result()
            .unwrap_err();
        assert!(matches!(err, Error::DependencyCheck { .. }));
        assert_eq!(
            err.to_string(),
            "pkg-config is needed to complete the build process"
        );
    }
}
