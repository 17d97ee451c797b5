//! Declarative filter specs attached to hook declarations.

use regex::Regex;

use crate::pattern::PatternSource;

/// Include/exclude pattern configuration for one hook.
///
/// Exclude patterns take precedence over include patterns. A
/// non-empty include list is an explicit allow-list; an empty one
/// behaves as "no include filter", not "match nothing".
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    /// Patterns that allow a candidate.
    pub include: Vec<PatternSource>,
    /// Patterns that reject a candidate, checked first.
    pub exclude: Vec<PatternSource>,
}

impl FilterSpec {
    /// An empty spec: matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an include pattern.
    pub fn include(mut self, pattern: impl Into<PatternSource>) -> Self {
        self.include.push(pattern.into());
        self
    }

    /// Adds an exclude pattern.
    pub fn exclude(mut self, pattern: impl Into<PatternSource>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    /// Whether the spec constrains anything at all.
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

impl From<&str> for FilterSpec {
    fn from(pattern: &str) -> Self {
        Self::new().include(pattern)
    }
}

impl From<String> for FilterSpec {
    fn from(pattern: String) -> Self {
        Self::new().include(pattern)
    }
}

impl From<Regex> for FilterSpec {
    fn from(pattern: Regex) -> Self {
        Self::new().include(pattern)
    }
}

impl<P: Into<PatternSource>> From<Vec<P>> for FilterSpec {
    fn from(patterns: Vec<P>) -> Self {
        patterns
            .into_iter()
            .fold(Self::new(), |spec, p| spec.include(p))
    }
}
