//! Keyword normalization and search pattern construction.
//!
//! Keywords come in two flavours:
//! symbols match anywhere inside a path,
//! full words only match when surrounded by non-letters or the string edges.

use std::fmt;

use anyhow::{Context, Result};
use itertools::Itertools;
use regex::{Regex, RegexBuilder};

/// Regex fragment matching any run of separators in place of a space.
pub const BLANK_PATTERN: &str = r"[-\s_]*";

/// Number of characters kept from each end of a long result name.
pub const RESULT_NAME_WINDOW: usize = 30;

/// Normalized keywords given by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSpec {
    pub full_words: Vec<String>,
    pub symbols: Vec<String>,
}

/// Compiled case-insensitive search pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
}

impl SearchSpec {
    /// Parse comma-separated full word and symbol lists.
    #[must_use]
    pub fn new(full_words: &str, symbols: &str) -> Self {
        Self {
            full_words: normalize(full_words),
            symbols: normalize(symbols),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_words.is_empty() && self.symbols.is_empty()
    }

    /// Build the search pattern for these keywords.
    pub fn pattern(&self) -> Result<Pattern> {
        build_pattern(&self.full_words, &self.symbols)
    }

    /// Build the default result folder name for these keywords.
    #[must_use]
    pub fn result_name(&self) -> String {
        build_result_name(&self.full_words, &self.symbols)
    }
}

impl Pattern {
    /// Check if the given path string matches the pattern.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Split a comma-separated keyword list into lowercase entries.
///
/// Whitespace runs inside an entry collapse to a single space,
/// empty entries are dropped and duplicates are removed keeping the first occurrence.
///
/// ```rust
/// use audio_tools::pattern::normalize;
///
/// assert_eq!(normalize(" Kick ,Snare  Drum, kick"), vec!["kick", "snare drum"]);
/// assert!(normalize("").is_empty());
/// ```
#[must_use]
pub fn normalize(raw_list: &str) -> Vec<String> {
    raw_list
        .split(',')
        .map(|entry| entry.split_whitespace().join(" ").to_lowercase())
        .filter(|entry| !entry.is_empty())
        .unique()
        .collect()
}

/// Turn a normalized keyword into a regex where spaces match any run of `-`, `_` or whitespace.
///
/// The keyword text itself is escaped so it matches literally.
///
/// ```rust
/// use audio_tools::pattern::to_blank_tolerant;
///
/// assert_eq!(to_blank_tolerant("foo bar"), r"foo[-\s_]*bar");
/// assert_eq!(to_blank_tolerant("c++"), r"c\+\+");
/// ```
#[must_use]
pub fn to_blank_tolerant(symbol: &str) -> String {
    symbol.split(' ').map(regex::escape).join(BLANK_PATTERN)
}

/// Combine full words and symbols into one case-insensitive alternation.
///
/// Full words must be bounded by non-letters or the string edges, symbols may match anywhere.
/// With no keywords at all the pattern is `()`, which matches everything.
pub fn build_pattern(full_words: &[String], symbols: &[String]) -> Result<Pattern> {
    let alternatives = full_words
        .iter()
        .map(|word| format!("(^|[^a-z]){}($|[^a-z])", to_blank_tolerant(word)))
        .chain(symbols.iter().map(|symbol| to_blank_tolerant(symbol)))
        .join("|");

    let source = format!("({alternatives})");
    let regex = RegexBuilder::new(&source)
        .case_insensitive(true)
        .build()
        .with_context(|| format!("Failed to compile search pattern: {source}"))?;

    Ok(Pattern { regex })
}

/// Create a folder name from the keywords.
///
/// Keywords are joined with `-` and everything except ASCII letters and digits is removed.
/// Names longer than 60 characters keep only the first and last 30 characters.
///
/// ```rust
/// use audio_tools::pattern::build_result_name;
///
/// let name = build_result_name(&["lead synth".to_string()], &["808".to_string()]);
/// assert_eq!(name, "leadsynth808");
/// ```
#[must_use]
pub fn build_result_name(full_words: &[String], symbols: &[String]) -> String {
    let name: Vec<char> = full_words
        .iter()
        .chain(symbols)
        .join("-")
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();

    if name.len() <= RESULT_NAME_WINDOW * 2 {
        return name.into_iter().collect();
    }

    name[..RESULT_NAME_WINDOW]
        .iter()
        .chain(&name[name.len() - RESULT_NAME_WINDOW..])
        .collect()
}

#[cfg(test)]
mod normalize_tests {
    use super::*;

    #[test]
    fn splits_trims_and_lowercases() {
        assert_eq!(normalize("Guitar, BASS ,  drums"), vec!["guitar", "bass", "drums"]);
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("lead \t  synth"), vec!["lead synth"]);
    }

    #[test]
    fn removes_duplicates_keeping_first_order() {
        assert_eq!(normalize("b, a, B, c, a"), vec!["b", "a", "c"]);
    }

    #[test]
    fn drops_empty_entries() {
        assert_eq!(normalize("a,, ,b,"), vec!["a", "b"]);
        assert!(normalize("").is_empty());
        assert!(normalize(" , ").is_empty());
    }

    #[test]
    fn is_idempotent() {
        let inputs = ["Foo  Bar, baz,FOO bar", "  x ,y,,x", "", "one"];
        for input in inputs {
            let once = normalize(input);
            let twice = normalize(&once.join(","));
            assert_eq!(once, twice, "input: {input:?}");
        }
    }
}
