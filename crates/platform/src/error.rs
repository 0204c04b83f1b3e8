//! Error types for platform resolution

// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Error type for platform resolution
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum Error {
    /// The label does not name any known platform
    #[error("Unknown platform label '{label}'")]
    #[diagnostic(code(gettext_ci::platform::unknown))]
    UnknownPlatform {
        /// The label as given on the command line
        label: String,
        /// Close matches and the list of valid labels
        #[help]
        help: String,
    },

    /// No label was given at all
    #[error("No platform label given")]
    #[diagnostic(
        code(gettext_ci::platform::missing),
        help("Pass one of the labels shown by `gettext-ci --list`")
    )]
    MissingPlatform,
}

impl Error {
    /// Create an unknown-platform error with suggestions drawn from `known`
    #[must_use]
    pub fn unknown_platform<'a>(
        label: impl Into<String>,
        known: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let label = label.into();
        let available: Vec<&str> = known.into_iter().collect();

        let suggestions: Vec<&str> = available
            .iter()
            .filter(|candidate| is_similar(&label, candidate))
            .copied()
            .collect();

        let mut help = String::new();
        if !suggestions.is_empty() {
            help.push_str("Did you mean one of these?\n");
            for s in &suggestions {
                help.push_str(&format!("  - {s}\n"));
            }
            help.push('\n');
        }
        help.push_str("Available platforms:\n");
        for p in &available {
            help.push_str(&format!("  - {p}\n"));
        }

        Self::UnknownPlatform {
            label,
            help: help.trim_end().to_string(),
        }
    }
}

/// Result type for platform resolution
pub type Result<T> = std::result::Result<T, Error>;

fn is_similar(input: &str, candidate: &str) -> bool {
    if input.is_empty() {
        return false;
    }

    let input_lower = input.to_lowercase();
    let candidate_lower = candidate.to_lowercase();

    if candidate_lower.starts_with(&input_lower) || input_lower.starts_with(&candidate_lower) {
        return true;
    }

    levenshtein(&input_lower, &candidate_lower) <= 2
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = b_chars.len();

    if a_chars.is_empty() {
        return n;
    }
    if n == 0 {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = usize::from(*a_char != b_chars[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("musl", "musl"), 0);
        assert_eq!(levenshtein("", "musl"), 4);
        assert_eq!(levenshtein("linux46", "linux64"), 2);
    }

    #[test]
    fn test_unknown_platform_suggests_close_labels() {
        let err = Error::unknown_platform("linux46", ["linux64", "linux32", "macos"]);
        let Error::UnknownPlatform { label, help } = err else {
            unreachable!("constructor always builds UnknownPlatform");
        };
        assert_eq!(label, "linux46");
        assert!(help.starts_with("Did you mean one of these?\n  - linux64"));
        assert!(help.contains("Available platforms:\n  - linux64\n  - linux32\n  - macos"));
    }

    #[test]
    fn test_unknown_platform_without_suggestions() {
        let err = Error::unknown_platform("bogus", ["linux64", "macos"]);
        let Error::UnknownPlatform { help, .. } = err else {
            unreachable!("constructor always builds UnknownPlatform");
        };
        assert!(!help.contains("Did you mean"));
        assert!(help.contains("  - macos"));
    }

    #[test]
    fn test_prefix_counts_as_similar() {
        assert!(is_similar("mac", "macos-homebrew"));
        assert!(!is_similar("", "macos"));
        assert!(!is_similar("windows", "musl"));
    }
}
