//! Build-unit descriptors for the external compiler toolchain.
//!
//! Each native component is described by a [`UnitSpec`] holding what is
//! specific to it. [`BuildUnitAssembler`] merges each of them with the shared
//! platform flags into a [`BuildUnitDescriptor`].
//!
//! Flags, sources and headers are positional toolchain arguments and keep
//! their order. Include directories, libraries and library directories are
//! search sets and are deduplicated.

use crate::context::PreflightContext;
use crate::platform::{ComputeLink, PlatformFlags, path_string};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Audio/video codec libraries used by the metadata reader.
pub const CODEC_LIBRARIES: [&str; 3] = ["avcodec", "avformat", "avutil"];

/// Image-processing libraries used by the motion engine.
pub const IMAGE_LIBRARIES: [&str; 3] = ["opencv_core", "opencv_ocl", "opencv_imgproc"];

/// `pkg-config` package of the image-processing library.
pub const IMAGE_PACKAGE: &str = "opencv";

/// Source language of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    /// C
    #[serde(rename = "c")]
    C,
    /// C++
    #[serde(rename = "c++")]
    Cxx,
}

/// Unit-specific inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    /// Fully qualified module name
    pub name: String,
    /// Source language
    pub language: Language,
    /// Compiler arguments added after the shared ones
    pub compile_flags: Vec<String>,
    /// Header directories owned by the unit
    pub include_dirs: Vec<String>,
    /// Libraries the unit links by name
    pub libraries: Vec<String>,
    /// Translation units, in order
    pub sources: Vec<PathBuf>,
    /// Headers the sources depend on, in order
    pub headers: Vec<PathBuf>,
    /// Whether the unit links the parallel-compute library
    pub needs_compute: bool,
}

impl UnitSpec {
    /// The video metadata reader, written in C against the codec libraries.
    #[must_use]
    pub fn libav_info(source_root: &Path) -> Self {
        let media = source_root.join("butterflow").join("media");
        Self {
            name: "butterflow.media.py_libav_info".to_string(),
            language: Language::C,
            compile_flags: Vec::new(),
            include_dirs: vec![path_string(&media)],
            libraries: CODEC_LIBRARIES.map(String::from).to_vec(),
            sources: vec![media.join("py_libav_info.c")],
            headers: vec![media.join("py_libav_info.h")],
            needs_compute: false,
        }
    }

    /// The motion interpolation engine, written in C++ against the
    /// image-processing and parallel-compute libraries.
    ///
    /// `image_include_dirs` are the image-processing library's header dirs.
    #[must_use]
    pub fn motion(source_root: &Path, image_include_dirs: &[String]) -> Self {
        let package = source_root.join("butterflow");
        let motion = package.join("motion");
        let conversion = package.join("3rdparty").join("opencv-ndarray-conversion");

        let mut include_dirs = vec![
            path_string(&package.join("3rdparty")),
            path_string(&motion),
        ];
        include_dirs.extend(image_include_dirs.iter().cloned());

        Self {
            name: "butterflow.motion.py_motion".to_string(),
            language: Language::Cxx,
            compile_flags: vec!["-std=c++11".to_string()],
            include_dirs,
            libraries: IMAGE_LIBRARIES.map(String::from).to_vec(),
            sources: vec![
                conversion.join("conversion.cpp"),
                motion.join("ocl_interpolate.cpp"),
                motion.join("ocl_optical_flow.cpp"),
                motion.join("py_motion.cpp"),
            ],
            headers: vec![
                conversion.join("conversion.h"),
                motion.join("ocl_interpolate.h"),
                motion.join("ocl_optical_flow.h"),
                motion.join("py_motion.h"),
            ],
            needs_compute: true,
        }
    }
}

/// Compile/link configuration of one native component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildUnitDescriptor {
    /// Fully qualified module name
    pub name: String,
    /// Compiler arguments, in order
    pub compile_flags: Vec<String>,
    /// Linker arguments, in order
    pub link_flags: Vec<String>,
    /// Header search directories
    pub include_dirs: BTreeSet<String>,
    /// Libraries linked by name or `:file` namespec
    pub libraries: BTreeSet<String>,
    /// Library search directories
    pub library_dirs: BTreeSet<String>,
    /// Translation units, in order
    pub sources: Vec<PathBuf>,
    /// Header dependencies, in order
    pub headers: Vec<PathBuf>,
    /// Source language
    pub language: Language,
}

/// Merges units with the shared platform flags.
#[derive(Debug, Clone)]
pub struct BuildUnitAssembler {
    flags: PlatformFlags,
    compute: Option<ComputeLink>,
}

impl BuildUnitAssembler {
    /// Assemble against `flags`; units needing the compute library use `compute`.
    #[must_use]
    pub fn new(flags: PlatformFlags, compute: Option<ComputeLink>) -> Self {
        Self { flags, compute }
    }

    /// Produce one descriptor per unit, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if a unit needs the compute library but no compute
    /// link was provided.
    pub fn build(&self, specs: &[UnitSpec]) -> Result<Vec<BuildUnitDescriptor>> {
        specs.iter().map(|spec| self.build_unit(spec)).collect()
    }

    fn build_unit(&self, spec: &UnitSpec) -> Result<BuildUnitDescriptor> {
        let shared = &self.flags;
        let compute = if spec.needs_compute {
            Some(self.compute.as_ref().ok_or_else(|| {
                Error::configuration(format!(
                    "{} needs the parallel-compute library but no link was configured",
                    spec.name
                ))
            })?)
        } else {
            None
        };

        let compile_flags = shared
            .compile_flags
            .iter()
            .chain(&spec.compile_flags)
            .cloned()
            .collect();
        let link_flags = shared
            .link_flags
            .iter()
            .chain(compute.into_iter().flat_map(|c| &c.link_flags))
            .cloned()
            .collect();

        let include_dirs = spec
            .include_dirs
            .iter()
            .chain(&shared.include_dirs)
            .chain(compute.into_iter().flat_map(|c| &c.include_dirs))
            .cloned()
            .collect();
        let libraries = spec
            .libraries
            .iter()
            .chain(&shared.libraries)
            .chain(compute.into_iter().flat_map(|c| &c.libraries))
            .cloned()
            .collect();
        let library_dirs = shared
            .lib_dirs
            .iter()
            .chain(compute.into_iter().flat_map(|c| &c.lib_dirs))
            .cloned()
            .collect();

        let descriptor = BuildUnitDescriptor {
            name: spec.name.clone(),
            compile_flags,
            link_flags,
            include_dirs,
            libraries,
            library_dirs,
            sources: spec.sources.clone(),
            headers: spec.headers.clone(),
            language: spec.language,
        };
        debug!(unit = %descriptor.name, libraries = ?descriptor.libraries, "Assembled build unit");
        Ok(descriptor)
    }
}

/// Derive platform flags and assemble both extension units.
///
/// Must only run after the dependency gate passed.
///
/// # Errors
///
/// Returns an error if a required tool produced unusable output or the
/// compute library's installed file cannot be located.
pub fn plan(ctx: &PreflightContext) -> Result<Vec<BuildUnitDescriptor>> {
    let strategy = ctx.strategy();
    let flags = strategy.assemble(ctx)?;
    let compute = strategy.compute_link(ctx)?;
    let image_includes = ctx.pkg_config().cflags(IMAGE_PACKAGE)?.include_dirs();

    let root = &ctx.config().source_root;
    let specs = [
        UnitSpec::libav_info(root),
        UnitSpec::motion(root, &image_includes),
    ];
    let units = BuildUnitAssembler::new(flags, Some(compute)).build(&specs)?;
    info!(platform = %ctx.platform(), units = units.len(), "Planned build units");
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_flags() -> PlatformFlags {
        let mut flags = PlatformFlags::base();
        flags.link_flags = vec!["-shared".into(), "-Wl,--export-dynamic".into()];
        flags.include_dirs.push("/usr/include/python2.7".into());
        flags.include_dirs.push("/usr/include".into());
        flags.libraries.push("python2.7".into());
        flags
    }

    fn compute() -> ComputeLink {
        ComputeLink {
            libraries: vec![":libOpenCL.so.1".into()],
            lib_dirs: vec!["/usr/lib/x86_64-linux-gnu".into()],
            ..ComputeLink::default()
        }
    }

    #[test]
    fn test_media_unit_gets_codecs_and_runtime() {
        let assembler = BuildUnitAssembler::new(shared_flags(), None);
        let units = assembler
            .build(&[UnitSpec::libav_info(Path::new("/src"))])
            .unwrap();
        let unit = &units[0];

        assert_eq!(unit.language, Language::C);
        assert_eq!(unit.compile_flags, vec!["-g", "-Wall"]);
        assert_eq!(unit.link_flags, vec!["-shared", "-Wl,--export-dynamic"]);
        for lib in ["avcodec", "avformat", "avutil", "python2.7"] {
            assert!(unit.libraries.contains(lib), "missing {lib}");
        }
        assert!(unit.include_dirs.contains("/src/butterflow/media"));
        assert_eq!(
            unit.sources,
            vec![PathBuf::from("/src/butterflow/media/py_libav_info.c")]
        );
    }

    #[test]
    fn test_include_dirs_are_deduplicated() {
        let assembler = BuildUnitAssembler::new(shared_flags(), None);
        let units = assembler
            .build(&[UnitSpec::libav_info(Path::new("/src"))])
            .unwrap();
        let count = units[0]
            .include_dirs
            .iter()
            .filter(|d| *d == "/usr/include")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_motion_unit_keeps_source_order_and_links_compute() {
        let assembler = BuildUnitAssembler::new(shared_flags(), Some(compute()));
        let units = assembler
            .build(&[UnitSpec::motion(
                Path::new("/src"),
                &["/usr/include/opencv".to_string()],
            )])
            .unwrap();
        let unit = &units[0];

        assert_eq!(unit.language, Language::Cxx);
        assert_eq!(unit.compile_flags, vec!["-g", "-Wall", "-std=c++11"]);
        assert!(unit.libraries.contains(":libOpenCL.so.1"));
        assert!(!unit.libraries.contains("OpenCL"));
        assert!(unit.library_dirs.contains("/usr/lib/x86_64-linux-gnu"));
        assert!(unit.include_dirs.contains("/usr/include/opencv"));
        assert_eq!(unit.sources.len(), 4);
        assert!(unit.sources[0].ends_with("conversion.cpp"));
        assert!(unit.sources[3].ends_with("py_motion.cpp"));
        assert_eq!(unit.headers.len(), 4);
    }

    #[test]
    fn test_compute_unit_without_link_is_error() {
        let assembler = BuildUnitAssembler::new(shared_flags(), None);
        let err = assembler
            .build(&[UnitSpec::motion(Path::new("/src"), &[])])
            .unwrap_err();
        assert!(err.to_string().contains("butterflow.motion.py_motion"));
    }

    #[test]
    fn test_descriptor_serializes_language_tag() {
        let assembler = BuildUnitAssembler::new(shared_flags(), Some(compute()));
        let units = assembler
            .build(&[
                UnitSpec::libav_info(Path::new("/src")),
                UnitSpec::motion(Path::new("/src"), &[]),
            ])
            .unwrap();
        let json = serde_json::to_value(&units).unwrap();
        assert_eq!(json[0]["language"], "c");
        assert_eq!(json[1]["language"], "c++");
    }
}
