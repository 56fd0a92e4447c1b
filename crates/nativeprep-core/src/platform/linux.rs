//! Linux-family flags.

use super::{ComputeLink, Os, PlatformFlags, PlatformStrategy, path_string};
use crate::Result;
use crate::context::PreflightContext;
use tracing::debug;

/// Base name of the parallel-compute library in the linker cache.
pub const COMPUTE_LIBRARY: &str = "libOpenCL";

/// Linker flags for a loadable module that resolves runtime symbols at load time.
pub const LINK_FLAGS: [&str; 2] = ["-shared", "-Wl,--export-dynamic"];

/// Flags for Linux and other ELF systems with `ldconfig`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxStrategy;

impl PlatformStrategy for LinuxStrategy {
    fn os(&self) -> Os {
        Os::Linux
    }

    fn assemble(&self, ctx: &PreflightContext) -> Result<PlatformFlags> {
        let mut flags = PlatformFlags::base();
        flags.link_flags.extend(LINK_FLAGS.map(String::from));

        let package = ctx.runtime().pkg_config_name();
        let pkg_config = ctx.pkg_config();
        let cflags = pkg_config.cflags(&package)?;
        let libs = pkg_config.libs(&package)?;
        debug!(%package, cflags = ?cflags.tokens(), libs = ?libs.tokens(), "Runtime pkg-config flags");

        flags.include_dirs.extend(cflags.include_dirs());
        flags.lib_dirs.extend(libs.library_dirs());
        flags.libraries.extend(libs.libraries());
        Ok(flags)
    }

    /// Links the exact installed file, since distributions often ship only
    /// the versioned `libOpenCL.so.1` without the development symlink.
    fn compute_link(&self, ctx: &PreflightContext) -> Result<ComputeLink> {
        let cache = ctx.linker_cache();
        let namespec = cache.namespec(COMPUTE_LIBRARY)?;
        let dir = cache.install_dir(COMPUTE_LIBRARY)?;
        debug!(%namespec, dir = %dir.display(), "Compute library link");

        Ok(ComputeLink {
            libraries: vec![namespec],
            lib_dirs: vec![path_string(&dir)],
            ..ComputeLink::default()
        })
    }
}
