//! Property-based tests for library name normalization and flag tokenizing.

use nativeprep_core::name::normalize;
use nativeprep_core::pkg_config::{FlagToken, tokenize};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

/// Bare library names. A leading `l` would be ambiguous with a stripped `-l`.
fn short_name_strategy() -> impl Strategy<Value = String> {
    "[a-km-z][a-z0-9_]{0,15}".prop_map(String::from)
}

/// A short name dressed up as a flag, file name or path.
fn decorated_strategy() -> impl Strategy<Value = (String, String)> {
    (
        short_name_strategy(),
        prop_oneof![
            Just("{}".to_string()),
            Just("-l{}".to_string()),
            Just("lib{}.so".to_string()),
            Just("lib{}.so.1.2".to_string()),
            Just("lib{}.dylib".to_string()),
            Just("lib{}.a".to_string()),
            Just("/usr/lib/lib{}.so.3".to_string()),
            Just("  -l{}\n".to_string()),
        ],
    )
        .prop_map(|(name, template)| (template.replace("{}", &name), name))
}

fn flag_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        short_name_strategy().prop_map(|n| format!("-l{n}")),
        "/[a-z]{1,8}(/[a-z]{1,8}){0,2}".prop_map(|d| format!("-L{d}")),
        "/[a-z]{1,8}(/[a-z]{1,8}){0,2}".prop_map(|d| format!("-I{d}")),
        "[A-Z]{1,8}".prop_map(|d| format!("-D{d}")),
    ]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_normalize_recovers_short_name((raw, name) in decorated_strategy()) {
        prop_assert_eq!(normalize(&raw), name);
    }

    #[test]
    fn prop_normalize_is_idempotent((raw, _) in decorated_strategy()) {
        let once = normalize(&raw);
        prop_assert_eq!(normalize(&once), once.clone());
    }

    #[test]
    fn prop_tokenize_preserves_order(flags in prop::collection::vec(flag_strategy(), 0..12)) {
        let output = flags.join(" ");
        let tokens = tokenize(&output);

        prop_assert_eq!(tokens.len(), flags.len());
        for (flag, token) in flags.iter().zip(&tokens) {
            let expected_kind = match &flag[..2] {
                "-l" => matches!(token, FlagToken::LibraryName(_)),
                "-L" => matches!(token, FlagToken::LibraryDir(_)),
                "-I" => matches!(token, FlagToken::IncludeDir(_)),
                _ => matches!(token, FlagToken::Other(_)),
            };
            prop_assert!(expected_kind, "{} classified as {:?}", flag, token);
        }
    }

    #[test]
    fn prop_directory_tokens_keep_raw_path(dir in "/[a-z]{1,8}(/[a-z]{1,8}){0,2}") {
        let tokens = tokenize(&format!("-L{dir} -I{dir}"));
        prop_assert_eq!(
            tokens,
            vec![FlagToken::LibraryDir(dir.clone()), FlagToken::IncludeDir(dir)]
        );
    }
}
