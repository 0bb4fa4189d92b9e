use std::fmt;
use std::ops::Range;

use regex::Regex;

use crate::error::{MutationError, Result};

/// A recognizable location in a source body.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// Exact text.
    Literal(String),
    /// Text whose whitespace runs may differ in the document, including
    /// missing or extra whitespace between tokens.
    Loose(String),
    /// Arbitrary pattern.
    Pattern(Regex),
}

impl Anchor {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn loose(text: impl Into<String>) -> Self {
        Self::Loose(text.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Byte range of the first match in `text`.
    pub fn find(&self, text: &str) -> Result<Option<Range<usize>>> {
        self.find_from(text, 0)
    }

    /// Byte range of the first match at or after `start`.
    pub fn find_from(&self, text: &str, start: usize) -> Result<Option<Range<usize>>> {
        let haystack = match text.get(start..) {
            Some(haystack) => haystack,
            None => return Ok(None),
        };
        let found = match self {
            Anchor::Literal(literal) => haystack
                .find(literal.as_str())
                .map(|offset| offset..offset + literal.len()),
            Anchor::Loose(loose) => {
                let regex = Regex::new(&loose_pattern(loose))?;
                regex.find(haystack).map(|found| found.range())
            }
            Anchor::Pattern(regex) => regex.find(haystack).map(|found| found.range()),
        };
        Ok(found.map(|range| range.start + start..range.end + start))
    }

    /// Like [`Anchor::find`], failing when the anchor is absent.
    pub fn locate(&self, text: &str) -> Result<Range<usize>> {
        self.find(text)?
            .ok_or_else(|| MutationError::AnchorNotFound(self.to_string()))
    }

    pub fn is_present(&self, text: &str) -> bool {
        matches!(self.find(text), Ok(Some(_)))
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::Literal(text) | Anchor::Loose(text) => write!(f, "`{}`", text.trim()),
            Anchor::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// Escape each whitespace-separated token and join with `\s*`, also
/// tolerating whitespace around punctuation inside a token.
fn loose_pattern(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            let mut pattern = String::new();
            let mut word = String::new();
            for ch in token.chars() {
                if ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '\\' {
                    word.push(ch);
                } else {
                    if !word.is_empty() {
                        pattern.push_str(&regex::escape(&word));
                        pattern.push_str(r"\s*");
                        word.clear();
                    }
                    pattern.push_str(&regex::escape(&ch.to_string()));
                    pattern.push_str(r"\s*");
                }
            }
            if !word.is_empty() {
                pattern.push_str(&regex::escape(&word));
            }
            pattern.trim_end_matches(r"\s*").to_string()
        })
        .collect::<Vec<_>>()
        .join(r"\s*")
}
