//! Canonical library names.
//!
//! A library can be referred to as a linker flag (`-lavcodec`), a file
//! (`/usr/lib/libopencv_core.so.3.4`) or a package name (`opencv`). The
//! canonical short name drops all of that decoration so the three forms can
//! be compared.

/// Suffixes at which a name is cut, checked in this order.
const LIBRARY_SUFFIXES: [&str; 3] = [".so", ".dylib", ".a"];

/// Reduce a raw library reference to its canonical short name.
///
/// # Examples
///
/// ```
/// use nativeprep_core::name::normalize;
///
/// assert_eq!(normalize("-lavcodec"), "avcodec");
/// assert_eq!(normalize("libopencv_core.so.3.4"), "opencv_core");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut name = trimmed.rsplit('/').next().unwrap_or(trimmed);

    if let Some(rest) = name.strip_prefix("-l") {
        name = rest;
    }
    if let Some(rest) = name.strip_prefix("lib") {
        name = rest;
    }
    for suffix in LIBRARY_SUFFIXES {
        if let Some(idx) = name.find(suffix) {
            name = &name[..idx];
        }
    }

    name.to_string()
}
