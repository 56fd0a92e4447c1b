//! Library presence resolution.
//!
//! A library counts as present when the OS dynamic-library search finds it
//! or, failing that, when `pkg-config --exists` knows the package.

use crate::environment::Environment;
use crate::ldconfig::{LinkerCache, cache_entries, matches_abi};
use crate::name::normalize;
use crate::pkg_config::PkgConfig;
use crate::platform::{Os, Platform};
use crate::process::CommandRunner;
use std::path::PathBuf;
use tracing::debug;

const DYLD_FALLBACK_LIBRARY_PATH: [&str; 3] = ["/usr/local/lib", "/lib", "/usr/lib"];

const DYLD_FALLBACK_FRAMEWORK_PATH: [&str; 3] = [
    "/Library/Frameworks",
    "/Network/Library/Frameworks",
    "/System/Library/Frameworks",
];

/// Resolves library presence for one target platform.
pub struct LibraryResolver<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    env: &'a Environment,
    platform: Platform,
}

impl<'a, R: CommandRunner + ?Sized> LibraryResolver<'a, R> {
    /// Bind to `runner`, running `pkg-config` under `env`.
    ///
    /// Search paths and `HOME` are read from `env`.
    pub fn new(runner: &'a R, env: &'a Environment, platform: Platform) -> Self {
        Self {
            runner,
            env,
            platform,
        }
    }

    /// Search for a shared library by canonical short name.
    ///
    /// Returns the library's file name (Linux) or path (Darwin).
    pub fn find_library(&self, short_name: &str) -> Option<String> {
        if short_name.is_empty() {
            return None;
        }
        match self.platform.os {
            Os::Linux => self.find_in_linker_cache(short_name),
            Os::Darwin => self.find_with_dyld_rules(short_name),
        }
    }

    /// Whether the library `name` is installed.
    ///
    /// `name` may be a flag, file name or package name. The dynamic search
    /// uses its canonical form; the `pkg-config` fallback uses `name` as given.
    pub fn resolve(&self, name: &str) -> bool {
        let short_name = normalize(name);
        if let Some(found) = self.find_library(&short_name) {
            debug!(library = %name, %found, "Found library by dynamic search");
            return true;
        }

        let exists = PkgConfig::new(self.runner, self.env).exists(name);
        debug!(library = %name, exists, "Checked library with pkg-config");
        exists
    }

    /// Whether package `package` links the object file `object`.
    ///
    /// Returns `false` when the package itself does not resolve.
    pub fn resolve_object_file(&self, package: &str, object: &str) -> bool {
        if !self.resolve(package) {
            return false;
        }

        let wanted = normalize(object);
        match PkgConfig::new(self.runner, self.env).libs_normalized(package) {
            Ok(names) => {
                let found = names.iter().any(|n| *n == wanted);
                debug!(%package, %object, found, "Checked object file");
                found
            }
            Err(e) => {
                debug!(%package, error = %e, "pkg-config --libs could not run");
                false
            }
        }
    }

    fn find_in_linker_cache(&self, short_name: &str) -> Option<String> {
        let arch = self.platform.arch;
        let listing = LinkerCache::new(self.runner, arch).listing()?;
        let prefix = format!("lib{short_name}.");
        cache_entries(&listing)
            .filter(|(entry, _)| matches_abi(entry, arch))
            .filter_map(|(entry, _)| entry.split_whitespace().next())
            .find(|file| file.starts_with(&prefix))
            .map(str::to_string)
    }

    fn find_with_dyld_rules(&self, short_name: &str) -> Option<String> {
        let candidates = [
            format!("lib{short_name}.dylib"),
            format!("{short_name}.dylib"),
        ];
        let framework = PathBuf::from(format!("{short_name}.framework")).join(short_name);

        let library_dirs = self.search_dirs("DYLD_LIBRARY_PATH", &DYLD_FALLBACK_LIBRARY_PATH, "lib");
        let framework_dirs = self.search_dirs(
            "DYLD_FRAMEWORK_PATH",
            &DYLD_FALLBACK_FRAMEWORK_PATH,
            "Library/Frameworks",
        );

        library_dirs
            .iter()
            .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
            .chain(framework_dirs.iter().map(|dir| dir.join(&framework)))
            .find(|path| path.exists())
            .map(|path| path.to_string_lossy().into_owned())
    }

    /// `$var` entries, then `~/<home_leaf>`, then the fallback dirs.
    fn search_dirs(&self, var: &str, fallback: &[&str], home_leaf: &str) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self
            .env
            .get(var)
            .map(|v| {
                v.split(crate::environment::PATH_SEPARATOR)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();
        if let Some(home) = self.home_dir() {
            dirs.push(home.join(home_leaf));
        }
        dirs.extend(fallback.iter().map(PathBuf::from));
        dirs
    }

    /// `HOME` from the snapshot, else the current user's home directory.
    fn home_dir(&self) -> Option<PathBuf> {
        self.env
            .get("HOME")
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
    }
}
