//! Dynamic-linker cache lookups (Linux family only).
//!
//! `ldconfig -p` prints one entry per line:
//!
//! ```text
//! 1342 libs found in cache `/etc/ld.so.cache'
//! 	libOpenCL.so.1 (libc6,x86-64) => /usr/lib/x86_64-linux-gnu/libOpenCL.so.1
//! ```
//!
//! Multiarch hosts list libraries of several ABIs side by side. Only entries
//! tagged with the target architecture's ABI count.

use crate::platform::Arch;
use crate::process::{CommandRunner, Invocation};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the dynamic-linker cache tool.
pub const LDCONFIG: &str = "ldconfig";

/// Iterate over `(entry name, installed path)` pairs of `ldconfig -p` output.
pub fn cache_entries(output: &str) -> impl Iterator<Item = (&str, &str)> {
    output.lines().filter_map(|line| {
        let (name, path) = line.trim_start().split_once("=>")?;
        Some((name.trim(), path.trim()))
    })
}

/// ABI tag `ldconfig` prints for native libraries of `arch`.
#[must_use]
pub fn abi_tag(arch: Arch) -> &'static str {
    match arch {
        Arch::X86_64 => "libc6,x86-64",
        Arch::Arm64 => "libc6,AArch64",
    }
}

/// Whether an entry name such as `libOpenCL.so.1 (libc6,x86-64)` carries the
/// ABI tag of `arch`.
///
/// Trailing attributes after the tag (`, OS ABI: ...`, `, hwcap: ...`) are
/// allowed; a bare `(libc6)` or `(libc6,x32)` entry does not match x86-64.
#[must_use]
pub fn matches_abi(entry: &str, arch: Arch) -> bool {
    let tag = abi_tag(arch);
    entry
        .split_once('(')
        .and_then(|(_, flags)| flags.trim_end().strip_suffix(')'))
        .and_then(|flags| flags.strip_prefix(tag))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(','))
}

/// Find the installed path of the first `arch` cache entry starting with
/// `base_name`.
#[must_use]
pub fn parse_cache(output: &str, base_name: &str, arch: Arch) -> Option<PathBuf> {
    cache_entries(output)
        .find(|(name, _)| name.starts_with(base_name) && matches_abi(name, arch))
        .map(|(_, path)| PathBuf::from(path))
}

/// Queries against the dynamic-linker cache.
pub struct LinkerCache<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    arch: Arch,
}

impl<'a, R: CommandRunner + ?Sized> LinkerCache<'a, R> {
    /// Bind to `runner`, matching entries built for `arch`.
    pub fn new(runner: &'a R, arch: Arch) -> Self {
        Self { runner, arch }
    }

    /// Full `ldconfig -p` listing, or `None` if the tool is unavailable.
    pub fn listing(&self) -> Option<String> {
        let invocation = Invocation::new(LDCONFIG, ["-p"]);
        match self.runner.run(&invocation) {
            Ok(output) if output.success => Some(output.stdout),
            Ok(output) => {
                debug!(code = ?output.code, "ldconfig -p exited non-zero");
                None
            }
            Err(e) => {
                debug!(error = %e, "ldconfig could not run");
                None
            }
        }
    }

    /// Installed path of a library, e.g. `lookup("libOpenCL")`.
    pub fn lookup(&self, base_name: &str) -> Option<PathBuf> {
        let found = parse_cache(&self.listing()?, base_name, self.arch);
        debug!(library = %base_name, arch = %self.arch, path = ?found, "Linker cache lookup");
        found
    }

    /// Linker namespec `:<filename>` for the installed library file.
    ///
    /// Lets the linker target an exact file when the unversioned development
    /// symlink (`libOpenCL.so`) is missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LibraryNotInstalled`] when the cache has no entry.
    pub fn namespec(&self, base_name: &str) -> Result<String> {
        let path = self
            .lookup(base_name)
            .ok_or_else(|| Error::library_not_installed(base_name))?;
        let file_name = file_name_of(&path)
            .ok_or_else(|| Error::library_not_installed(base_name))?;
        Ok(format!(":{file_name}"))
    }

    /// Directory containing the installed library file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LibraryNotInstalled`] when the cache has no entry.
    pub fn install_dir(&self, base_name: &str) -> Result<PathBuf> {
        self.lookup(base_name)
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .ok_or_else(|| Error::library_not_installed(base_name))
    }
}

fn file_name_of(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
