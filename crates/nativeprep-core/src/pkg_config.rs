//! `pkg-config` queries and flag classification.
//!
//! The tool's output is a whitespace separated list of compiler or linker
//! flags. [`tokenize`] turns it into tagged [`FlagToken`]s without any
//! subprocess involvement; [`PkgConfig`] runs the tool and feeds the output
//! through the tokenizer.

use crate::environment::Environment;
use crate::name::normalize;
use crate::process::{CommandRunner, Invocation};
use crate::{Error, Result};
use tracing::debug;

/// Name of the package-config executable.
pub const PKG_CONFIG: &str = "pkg-config";

/// A single classified token of `pkg-config` output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagToken {
    /// `-l<name>`, value normalized
    LibraryName(String),
    /// `-L<dir>`
    LibraryDir(String),
    /// `-I<dir>`
    IncludeDir(String),
    /// Anything else, normalized (e.g. `-DFOO` becomes `DFOO`)
    Other(String),
}

impl FlagToken {
    /// The token's value without its classification.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::LibraryName(v) | Self::LibraryDir(v) | Self::IncludeDir(v) | Self::Other(v) => v,
        }
    }
}

/// Classify one non-empty token.
///
/// Returns `None` for a token that is empty once its leading `-` is removed.
#[must_use]
pub fn classify(token: &str) -> Option<FlagToken> {
    let token = token.trim();
    let body = token.strip_prefix('-').unwrap_or(token);
    let mut chars = body.chars();
    let kind = chars.next()?;
    let rest = chars.as_str();

    Some(match kind {
        'l' => FlagToken::LibraryName(normalize(rest)),
        'L' => FlagToken::LibraryDir(rest.to_string()),
        'I' => FlagToken::IncludeDir(rest.to_string()),
        _ => FlagToken::Other(normalize(body)),
    })
}

/// Split tool output on whitespace and classify every token, keeping order.
#[must_use]
pub fn tokenize(output: &str) -> Vec<FlagToken> {
    output.split_whitespace().filter_map(classify).collect()
}

/// Classified output of one `pkg-config` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgConfigFlags {
    tokens: Vec<FlagToken>,
}

impl PkgConfigFlags {
    /// Tokenize raw tool output.
    #[must_use]
    pub fn parse(output: &str) -> Self {
        Self {
            tokens: tokenize(output),
        }
    }

    /// All tokens in output order.
    #[must_use]
    pub fn tokens(&self) -> &[FlagToken] {
        &self.tokens
    }

    /// Whether the tool printed nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Values of `-I` tokens.
    #[must_use]
    pub fn include_dirs(&self) -> Vec<String> {
        self.collect(|t| matches!(t, FlagToken::IncludeDir(_)))
    }

    /// Values of `-L` tokens.
    #[must_use]
    pub fn library_dirs(&self) -> Vec<String> {
        self.collect(|t| matches!(t, FlagToken::LibraryDir(_)))
    }

    /// Values of `-l` tokens.
    #[must_use]
    pub fn libraries(&self) -> Vec<String> {
        self.collect(|t| matches!(t, FlagToken::LibraryName(_)))
    }

    /// Values of unclassified tokens.
    #[must_use]
    pub fn other(&self) -> Vec<String> {
        self.collect(|t| matches!(t, FlagToken::Other(_)))
    }

    /// Every value, classified or not, in output order.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.collect(|_| true)
    }

    fn collect(&self, keep: impl Fn(&FlagToken) -> bool) -> Vec<String> {
        self.tokens
            .iter()
            .filter(|t| keep(t))
            .map(|t| t.value().to_string())
            .collect()
    }
}

/// `pkg-config` bound to a runner and the environment it must run under.
pub struct PkgConfig<'a, R: CommandRunner + ?Sized> {
    runner: &'a R,
    env: &'a Environment,
}

impl<'a, R: CommandRunner + ?Sized> PkgConfig<'a, R> {
    /// Bind to `runner`, running every call under `env`.
    ///
    /// `env` should be the augmented environment.
    pub fn new(runner: &'a R, env: &'a Environment) -> Self {
        Self { runner, env }
    }

    /// Run `pkg-config` with `options` and classify its output.
    ///
    /// A non-zero exit is not an error: whatever was printed is classified,
    /// which for a failing query is usually nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if `pkg-config` cannot be launched.
    pub fn query(&self, options: &[&str]) -> Result<PkgConfigFlags> {
        let invocation = Invocation::new(PKG_CONFIG, options.iter().copied()).with_env(self.env);
        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| Error::command(invocation.to_string(), e.to_string()))?;

        if !output.success {
            debug!(command = %invocation, code = ?output.code, "pkg-config query exited non-zero");
        }
        Ok(PkgConfigFlags::parse(&output.stdout))
    }

    /// `pkg-config --cflags <package>`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pkg-config` cannot be launched.
    pub fn cflags(&self, package: &str) -> Result<PkgConfigFlags> {
        self.query(&["--cflags", package])
    }

    /// `pkg-config --libs <package>`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pkg-config` cannot be launched.
    pub fn libs(&self, package: &str) -> Result<PkgConfigFlags> {
        self.query(&["--libs", package])
    }

    /// Raw `--libs` output tokens, each normalized, without classification.
    ///
    /// # Errors
    ///
    /// Returns an error if `pkg-config` cannot be launched.
    pub fn libs_normalized(&self, package: &str) -> Result<Vec<String>> {
        let invocation = Invocation::new(PKG_CONFIG, ["--libs", package]).with_env(self.env);
        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| Error::command(invocation.to_string(), e.to_string()))?;
        Ok(output.stdout.split_whitespace().map(normalize).collect())
    }

    /// `pkg-config --exists <package>`; a launch failure counts as absent.
    pub fn exists(&self, package: &str) -> bool {
        let invocation = Invocation::new(PKG_CONFIG, ["--exists", package]).with_env(self.env);
        match self.runner.run(&invocation) {
            Ok(output) => output.success,
            Err(e) => {
                debug!(command = %invocation, error = %e, "pkg-config could not run");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_kinds() {
        assert_eq!(
            classify("-I/usr/include/foo"),
            Some(FlagToken::IncludeDir("/usr/include/foo".into()))
        );
        assert_eq!(
            classify("-L/usr/local/lib"),
            Some(FlagToken::LibraryDir("/usr/local/lib".into()))
        );
        assert_eq!(
            classify("-lopencv_core"),
            Some(FlagToken::LibraryName("opencv_core".into()))
        );
        assert_eq!(classify("-DFOO"), Some(FlagToken::Other("DFOO".into())));
    }

    #[test]
    fn test_library_values_are_normalized() {
        assert_eq!(
            classify("-llibfoo.so"),
            Some(FlagToken::LibraryName("foo".into()))
        );
    }

    #[test]
    fn test_bare_paths_are_normalized() {
        assert_eq!(
            classify("/usr/lib/libopencv_ocl.so"),
            Some(FlagToken::Other("opencv_ocl".into()))
        );
    }

    #[test]
    fn test_lone_dash_is_dropped() {
        assert_eq!(classify("-"), None);
    }

    #[test]
    fn test_tokenize_preserves_order_and_skips_blanks() {
        let tokens = tokenize("  -I/a   -lfoo\n-L/b  -I/a \n");
        assert_eq!(
            tokens,
            vec![
                FlagToken::IncludeDir("/a".into()),
                FlagToken::LibraryName("foo".into()),
                FlagToken::LibraryDir("/b".into()),
                FlagToken::IncludeDir("/a".into()),
            ]
        );
    }

    #[test]
    fn test_flags_accessors() {
        let flags = PkgConfigFlags::parse("-I/usr/include/python2.7 -L/usr/lib -lpython2.7 -pthread");
        assert_eq!(flags.include_dirs(), vec!["/usr/include/python2.7"]);
        assert_eq!(flags.library_dirs(), vec!["/usr/lib"]);
        assert_eq!(flags.libraries(), vec!["python2.7"]);
        assert_eq!(flags.other(), vec!["pthread"]);
        assert_eq!(flags.values().len(), 4);
    }
}
