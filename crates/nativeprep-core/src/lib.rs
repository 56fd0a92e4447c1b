// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! Build preflight for native runtime extensions.
//!
//! Before the media and motion extensions are compiled, nativeprep verifies
//! that every external requirement is installed and then computes the
//! compiler and linker configuration for each extension on the current
//! platform.
//!
//! ```ignore
//! use nativeprep_core::{PreflightConfig, PreflightContext, DependencyGate, build_unit};
//!
//! fn main() -> nativeprep_core::Result<()> {
//!     let ctx = PreflightContext::builder(PreflightConfig::default()).build()?;
//!     DependencyGate::new(&ctx).check().into_result()?;
//!     for unit in build_unit::plan(&ctx)? {
//!         println!("{}: {:?}", unit.name, unit.libraries);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! All host interaction goes through [`process::CommandRunner`], so the whole
//! pipeline can run against a scripted machine.

pub mod build_unit;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod gate;
pub mod homebrew;
pub mod ldconfig;
pub mod library;
pub mod name;
pub mod pkg_config;
pub mod platform;
pub mod process;
pub mod runtime;

pub use build_unit::{BuildUnitDescriptor, Language, plan};
pub use config::PreflightConfig;
pub use context::PreflightContext;
pub use error::{Error, Result};
pub use gate::{DependencyCheckResult, DependencyGate};
pub use platform::{Arch, Os, Platform};
