//! Keyword matching and excerpt building.

use std::num::NonZeroUsize;
use std::path::Path;

/// A line that hit a keyword. Lives only until its notification is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEvent<'a> {
    pub path: &'a Path,
    pub line: &'a str,
    pub keyword: &'a str,
}

impl MatchEvent<'_> {
    /// Notification body for this match.
    pub fn excerpt(&self, words: NonZeroUsize) -> String {
        excerpt(self.line, words)
    }
}

/// Ordered keyword list. The first keyword contained in a line wins.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First configured keyword that occurs literally in `line`.
    pub fn first_match(&self, line: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|keyword| line.contains(keyword.as_str()))
            .map(String::as_str)
    }

    /// Match a line read from `path`.
    pub fn check<'a>(&'a self, path: &'a Path, line: &'a str) -> Option<MatchEvent<'a>> {
        self.first_match(line)
            .map(|keyword| MatchEvent { path, line, keyword })
    }
}

/// First `words` whitespace-delimited tokens of `line`, joined by single spaces.
pub fn excerpt(line: &str, words: NonZeroUsize) -> String {
    line.split_whitespace()
        .take(words.get())
        .collect::<Vec<_>>()
        .join(" ")
}
