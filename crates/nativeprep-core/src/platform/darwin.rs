//! Darwin-family flags.
//!
//! Several runtimes are commonly installed side by side on macOS (system,
//! Homebrew, framework builds). The runtime library is linked by full path so
//! the `/usr/lib` search directory cannot pull in a different one.

use super::{ComputeLink, Os, PlatformFlags, PlatformStrategy, path_string};
use crate::Result;
use crate::context::PreflightContext;
use crate::homebrew::formula_installed;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Framework providing the parallel-compute library.
pub const COMPUTE_FRAMEWORK: &str = "OpenCL";

/// Homebrew formula whose headers the array-conversion code needs.
pub const ARRAY_FORMULA: &str = "numpy";

/// Flags for macOS.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarwinStrategy;

impl PlatformStrategy for DarwinStrategy {
    fn os(&self) -> Os {
        Os::Darwin
    }

    fn assemble(&self, ctx: &PreflightContext) -> Result<PlatformFlags> {
        let mut flags = PlatformFlags::base();
        flags
            .link_flags
            .extend(["-arch".to_string(), ctx.platform().arch.to_string()]);

        if let Some(brew) = ctx.homebrew() {
            flags.include_dirs.push(path_string(&brew.include_dir()));
            flags.lib_dirs.push(path_string(&brew.lib_dir()));
        }

        let runtime = ctx.runtime();
        let prefix = runtime.prefix(ctx.runner(), ctx.augmented_env())?;
        debug!(prefix = %prefix.display(), "Runtime prefix");

        let lib_dir = prefix.join("lib");
        flags.lib_dirs.push(path_string(&lib_dir));
        flags.include_dirs.push(path_string(
            &prefix.join("include").join(runtime.library_name()),
        ));
        flags.link_flags.push(path_string(
            &lib_dir.join(format!("lib{}.dylib", runtime.library_name())),
        ));
        Ok(flags)
    }

    fn compute_link(&self, ctx: &PreflightContext) -> Result<ComputeLink> {
        let runtime = ctx.runtime();
        // Homebrew puts headers of runtime packages under site-packages
        let array_headers = match ctx.homebrew() {
            Some(brew)
                if formula_installed(ctx.runner(), ctx.augmented_env(), ARRAY_FORMULA) =>
            {
                brew.site_packages(runtime).join("numpy/core/include")
            }
            brew => {
                if brew.is_some() {
                    warn!(formula = ARRAY_FORMULA, "Formula not installed; using system array headers");
                }
                PathBuf::from(format!(
                    "/System/Library/Frameworks/Python.framework/Versions/{}/Extras/lib/python/numpy/core/include",
                    runtime.version_tag()
                ))
            }
        };
        debug!(headers = %array_headers.display(), "Array headers");

        Ok(ComputeLink {
            link_flags: vec!["-framework".to_string(), COMPUTE_FRAMEWORK.to_string()],
            include_dirs: vec![path_string(&array_headers)],
            ..ComputeLink::default()
        })
    }
}
