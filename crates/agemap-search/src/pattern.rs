//! Search pattern compilation and matching.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// A search pattern that failed to compile.
#[derive(Debug, Error)]
#[error("invalid search pattern: {0}")]
pub struct PatternError(#[from] regex::Error);

/// How a query string is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Case-insensitive substring match.
    Literal,
    /// Shell glob (`*` and `?`) matched against the whole name,
    /// case-insensitive.
    Wildcard,
    /// Regular expression, case-insensitive, unanchored.
    Regex,
}

impl SearchMode {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Literal => "Literal",
            Self::Wildcard => "Wildcard",
            Self::Regex => "Regex",
        }
    }
}

/// A compiled matcher, cheap to clone across workers.
#[derive(Debug, Clone)]
pub enum Matcher {
    Literal(String),
    Pattern(Regex),
}

impl Matcher {
    /// Compile `pattern` under `mode`. Malformed wildcard or regex input is
    /// reported here, before any worker starts.
    pub fn compile(pattern: &str, mode: SearchMode) -> Result<Self, PatternError> {
        match mode {
            SearchMode::Literal => Ok(Self::Literal(pattern.to_lowercase())),
            SearchMode::Wildcard => {
                let regex = RegexBuilder::new(&wildcard_to_regex(pattern))
                    .case_insensitive(true)
                    .build()?;
                Ok(Self::Pattern(regex))
            }
            SearchMode::Regex => {
                let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
                Ok(Self::Pattern(regex))
            }
        }
    }

    /// Match a directory name component.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Literal(needle) => name.to_lowercase().contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(name),
        }
    }
}

/// Translate a `*`/`?` glob into an anchored regex.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut buf = [0u8; 4];
    out.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }
    out.push('$');
    out
}
