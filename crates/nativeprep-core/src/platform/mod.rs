//! Platform identification and per-platform flag assembly.
//!
//! Compile and link flags differ between the Linux and Darwin families. Each
//! family is a [`PlatformStrategy`]; the strategy is chosen once, when the
//! [`PreflightContext`](crate::context::PreflightContext) is built, and every
//! platform-specific decision goes through it.
//!
//! Strategies assume the dependency gate already passed and do not re-check
//! tool presence.

mod darwin;
mod linux;

pub use darwin::DarwinStrategy;
pub use linux::LinuxStrategy;

use crate::Result;
use crate::context::PreflightContext;
use serde::{Deserialize, Serialize};

/// Debug and warning flags shared by every unit.
pub const BASE_COMPILE_FLAGS: [&str; 2] = ["-g", "-Wall"];

/// Header directories searched on every platform.
pub const BASE_INCLUDE_DIRS: [&str; 2] = ["/usr/include", "/usr/local/include"];

/// Library directories searched on every platform.
pub const BASE_LIB_DIRS: [&str; 2] = ["/usr/lib", "/usr/local/lib"];

/// Platform identifier combining OS and architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system family
    pub os: Os,
    /// CPU architecture
    pub arch: Arch,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The platform this binary runs on, if supported.
    #[must_use]
    pub fn current() -> Option<Self> {
        Some(Self {
            os: Os::current()?,
            arch: Arch::current()?,
        })
    }

    /// Parse from string like "darwin-arm64".
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s.split_once('-')?;
        Some(Self {
            os: Os::parse(os)?,
            arch: Arch::parse(arch)?,
        })
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// macOS
    Darwin,
    /// Linux and other `ldconfig` systems
    Linux,
}

impl Os {
    /// The OS family this binary runs on.
    #[must_use]
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::Darwin)
        } else if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else {
            None
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "darwin" | "macos" => Some(Self::Darwin),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }
}

impl std::fmt::Display for Os {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Darwin => write!(f, "darwin"),
            Self::Linux => write!(f, "linux"),
        }
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// 64-bit ARM
    Arm64,
    /// 64-bit x86
    X86_64,
}

impl Arch {
    /// The architecture this binary runs on.
    #[must_use]
    pub fn current() -> Option<Self> {
        if cfg!(target_arch = "aarch64") {
            Some(Self::Arm64)
        } else if cfg!(target_arch = "x86_64") {
            Some(Self::X86_64)
        } else {
            None
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "arm64" | "aarch64" => Some(Self::Arm64),
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Arm64 => write!(f, "arm64"),
            Self::X86_64 => write!(f, "x86_64"),
        }
    }
}

/// Flags and search directories shared by every build unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFlags {
    /// Compiler arguments, in order
    pub compile_flags: Vec<String>,
    /// Linker arguments, in order
    pub link_flags: Vec<String>,
    /// Header search directories
    pub include_dirs: Vec<String>,
    /// Library search directories
    pub lib_dirs: Vec<String>,
    /// Runtime libraries to link by name
    pub libraries: Vec<String>,
}

impl PlatformFlags {
    /// Start from the flags and directories common to all platforms.
    #[must_use]
    pub fn base() -> Self {
        Self {
            compile_flags: BASE_COMPILE_FLAGS.map(String::from).to_vec(),
            link_flags: Vec::new(),
            include_dirs: BASE_INCLUDE_DIRS.map(String::from).to_vec(),
            lib_dirs: BASE_LIB_DIRS.map(String::from).to_vec(),
            libraries: Vec::new(),
        }
    }
}

/// How the parallel-compute library is linked into the motion unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputeLink {
    /// Library names or `:file` namespecs
    pub libraries: Vec<String>,
    /// Extra library search directories
    pub lib_dirs: Vec<String>,
    /// Extra linker arguments
    pub link_flags: Vec<String>,
    /// Extra header directories (array-conversion headers)
    pub include_dirs: Vec<String>,
}

/// Platform-specific flag derivation.
pub trait PlatformStrategy {
    /// OS family this strategy serves.
    fn os(&self) -> Os;

    /// Flags and directories shared by every unit, runtime included.
    ///
    /// # Errors
    ///
    /// Returns an error if a required tool produced unusable output.
    fn assemble(&self, ctx: &PreflightContext) -> Result<PlatformFlags>;

    /// Link instructions for the parallel-compute library.
    ///
    /// # Errors
    ///
    /// Returns an error if the library's installed location cannot be found.
    fn compute_link(&self, ctx: &PreflightContext) -> Result<ComputeLink>;
}

/// Select the strategy for an OS family.
#[must_use]
pub fn strategy_for(os: Os) -> Box<dyn PlatformStrategy> {
    match os {
        Os::Linux => Box::new(LinuxStrategy),
        Os::Darwin => Box::new(DarwinStrategy),
    }
}

pub(crate) fn path_string(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}
