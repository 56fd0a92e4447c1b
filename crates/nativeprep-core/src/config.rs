//! Preflight configuration.
//!
//! Defaults describe the media and motion extensions; a TOML file may
//! override any section.
//!
//! ```toml
//! source_root = "/src/butterflow"
//!
//! [runtime]
//! interpreter = "python2"
//! required_major = 2
//! binding_module = "cv2"
//!
//! [requirements]
//! libraries = ["opencv", "avformat", "avcodec", "avutil", "OpenCL"]
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Runtime expectations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Interpreter command used for version detection and the import check
    pub interpreter: String,
    /// Major version the extensions are ABI-compatible with
    pub required_major: u32,
    /// Binding module that must be importable
    pub binding_module: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: "python2".to_string(),
            required_major: 2,
            binding_module: "cv2".to_string(),
        }
    }
}

/// An object file that a library package must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectFileRequirement {
    /// `pkg-config` package name
    pub package: String,
    /// Object file expected among the package's link flags
    pub object: String,
}

impl ObjectFileRequirement {
    /// Create a requirement.
    #[must_use]
    pub fn new(package: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            object: object.into(),
        }
    }
}

/// Tools, libraries and object files the build needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Requirements {
    /// Extra tools checked after the built-in ones
    pub tools: Vec<String>,
    /// Shared libraries, checked in order
    pub libraries: Vec<String>,
    /// Object files inside libraries, checked in order
    pub object_files: Vec<ObjectFileRequirement>,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            tools: Vec::new(),
            libraries: ["opencv", "avformat", "avcodec", "avutil", "OpenCL"]
                .map(String::from)
                .to_vec(),
            object_files: vec![
                ObjectFileRequirement::new("opencv", "libopencv_ocl.so"),
                ObjectFileRequirement::new("opencv", "libopencv_core.so"),
                ObjectFileRequirement::new("opencv", "libopencv_imgproc.so"),
            ],
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreflightConfig {
    /// Root of the source tree holding the extension sources
    pub source_root: PathBuf,
    /// Runtime expectations
    pub runtime: RuntimeConfig,
    /// Dependency requirements
    pub requirements: Requirements,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            runtime: RuntimeConfig::default(),
            requirements: Requirements::default(),
        }
    }
}

impl PreflightConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::configuration(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// A relative `source_root` is resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, Some(path.to_path_buf()), "read configuration"))?;
        let mut config = Self::from_toml(&text)?;
        if config.source_root.is_relative()
            && let Some(dir) = path.parent()
        {
            config.source_root = dir.join(&config.source_root);
        }
        Ok(config)
    }
}
