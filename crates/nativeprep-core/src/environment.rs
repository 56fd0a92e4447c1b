//! Environment snapshots for subprocess calls.
//!
//! The process environment is captured once and never mutated. Every
//! augmentation produces a new [`Environment`] that is handed to child
//! processes explicitly.
//!
//! Augmentation exists because privileged installs commonly run with a
//! scrubbed environment, in which `pkg-config` no longer sees libraries under
//! `/usr/local`.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use tracing::warn;

/// Variable holding the package-config search path.
pub const PKG_CONFIG_PATH: &str = "PKG_CONFIG_PATH";

/// Local package-config directories appended to [`PKG_CONFIG_PATH`], in order.
pub const LOCAL_PKG_CONFIG_DIRS: [&str; 3] = [
    "/usr/local/lib/pkgconfig",
    "/usr/local/pkgconfig",
    "/usr/share/pkgconfig",
];

/// Separator between entries of a search-path variable.
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
/// Separator between entries of a search-path variable.
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

/// An immutable set of environment variables.
///
/// Variables that are not valid Unicode are kept apart: child processes
/// receive them unchanged, but lookups by name do not see them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    opaque: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// Create an empty environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment.
    #[must_use]
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os())
    }

    /// Build an environment from raw pairs, keeping non-Unicode ones opaque.
    pub fn from_os_vars(vars: impl IntoIterator<Item = (OsString, OsString)>) -> Self {
        let mut env = Self::default();
        for (key, value) in vars {
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => {
                    env.vars.insert(key, value);
                }
                (key, value) => {
                    let key = key.map_or_else(|raw| raw, OsString::from);
                    let value = value.map_or_else(|raw| raw, OsString::from);
                    warn!(
                        variable = %key.to_string_lossy(),
                        "Environment variable is not valid Unicode; passing it through unread"
                    );
                    env.opaque.insert(key, value);
                }
            }
        }
        env
    }

    /// Build an environment from explicit pairs.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            opaque: BTreeMap::new(),
        }
    }

    /// Get a variable's value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Check whether a Unicode variable is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Number of variables, opaque ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len() + self.opaque.len()
    }

    /// Whether no variables are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the Unicode variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over every variable as handed to a child process.
    pub fn iter_os(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.iter()
            .map(|(k, v)| (OsStr::new(k), OsStr::new(v)))
            .chain(self.opaque.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str())))
    }

    /// Return a copy with `key` set to `value`.
    #[must_use]
    pub fn with_var(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let mut env = self.clone();
        env.opaque.remove(OsStr::new(&key));
        env.vars.insert(key, value.into());
        env
    }

    /// Return a copy whose package-config search path also covers the local
    /// install directories.
    ///
    /// The local directories are appended after any existing entries, so a
    /// caller-provided path keeps priority.
    #[must_use]
    pub fn augmented(&self) -> Self {
        self.append_search_path(PKG_CONFIG_PATH, &LOCAL_PKG_CONFIG_DIRS)
    }

    /// Return a copy with `dirs` appended to the search-path variable `key`.
    #[must_use]
    pub fn append_search_path<S: AsRef<str>>(&self, key: &str, dirs: &[S]) -> Self {
        let joined = join_search_path(dirs);
        let value = match self.get(key) {
            Some(existing) => format!("{existing}{PATH_SEPARATOR}{joined}"),
            None => joined,
        };
        self.with_var(key, value)
    }

    /// Return a copy with `dirs` placed ahead of the search-path variable `key`.
    #[must_use]
    pub fn prepend_search_path<S: AsRef<str>>(&self, key: &str, dirs: &[S]) -> Self {
        let joined = join_search_path(dirs);
        let value = match self.get(key) {
            Some(existing) if !existing.is_empty() => {
                format!("{joined}{PATH_SEPARATOR}{existing}")
            }
            _ => joined,
        };
        self.with_var(key, value)
    }
}

fn join_search_path<S: AsRef<str>>(dirs: &[S]) -> String {
    dirs.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}
