//! Pattern sources and their compiled matcher forms.

use std::path::Path;

use globset::GlobBuilder;
use plugbridge_core::{BridgeError, BridgeResult};
use regex::Regex;

/// An uncompiled pattern as declared by a plugin author.
///
/// A string pattern means different things depending on the filter it
/// appears in: a glob for id filters, a raw substring for code
/// filters. A regex pattern means the same thing in both.
///
/// The `regex` crate keeps no match-cursor state, so a pattern can be
/// evaluated any number of times without resetting anything.
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// A string pattern.
    Str(String),
    /// A regular expression pattern.
    Regex(Regex),
}

impl From<&str> for PatternSource {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for PatternSource {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Regex> for PatternSource {
    fn from(re: Regex) -> Self {
        Self::Regex(re)
    }
}

/// A compiled pattern matched against module ids.
#[derive(Debug, Clone)]
pub enum IdPattern {
    /// A glob, anchored at compile time.
    Glob {
        /// The anchored glob text, kept for diagnostics.
        source: String,
        /// The compiled matcher.
        matcher: globset::GlobMatcher,
    },
    /// A regular expression.
    Regex(Regex),
}

impl IdPattern {
    /// Compiles an id pattern.
    ///
    /// String patterns become globs resolved against `cwd` unless the
    /// pattern starts with `**` or is already absolute. `cwd` is the
    /// working directory captured when the owning filter was
    /// compiled, so matches stay stable if the process working
    /// directory changes mid-build.
    pub fn compile(source: &PatternSource, cwd: &Path) -> BridgeResult<Self> {
        match source {
            PatternSource::Regex(re) => Ok(Self::Regex(re.clone())),
            PatternSource::Str(glob) => {
                let anchored = anchor_glob(glob, cwd);
                let matcher = GlobBuilder::new(&anchored)
                    .literal_separator(true)
                    .build()
                    .map_err(|e| {
                        BridgeError::config(format!("invalid glob pattern '{glob}': {e}"))
                    })?
                    .compile_matcher();
                Ok(Self::Glob {
                    source: anchored,
                    matcher,
                })
            }
        }
    }

    /// Tests an id, which the caller has already normalized to
    /// forward slashes.
    pub fn is_match(&self, id: &str) -> bool {
        match self {
            Self::Glob { matcher, .. } => matcher.is_match(id),
            Self::Regex(re) => re.is_match(id),
        }
    }
}

/// A compiled pattern matched against source text.
#[derive(Debug, Clone)]
pub enum CodePattern {
    /// Substring containment.
    Substring(String),
    /// A regular expression.
    Regex(Regex),
}

impl CodePattern {
    /// Compiles a code pattern. Infallible today, but kept fallible
    /// so the shape matches [`IdPattern::compile`].
    pub fn compile(source: &PatternSource) -> BridgeResult<Self> {
        match source {
            PatternSource::Str(s) => Ok(Self::Substring(s.clone())),
            PatternSource::Regex(re) => Ok(Self::Regex(re.clone())),
        }
    }

    /// Tests source text.
    pub fn is_match(&self, code: &str) -> bool {
        match self {
            Self::Substring(s) => code.contains(s.as_str()),
            Self::Regex(re) => re.is_match(code),
        }
    }
}

/// Resolves a glob against the captured working directory.
fn anchor_glob(glob: &str, cwd: &Path) -> String {
    if glob.starts_with("**") || is_absolute_pattern(glob) {
        return glob.to_string();
    }
    let base = cwd.to_string_lossy().replace('\\', "/");
    format!("{}/{}", base.trim_end_matches('/'), glob)
}

fn is_absolute_pattern(glob: &str) -> bool {
    if glob.starts_with('/') {
        return true;
    }
    let mut chars = glob.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(drive), Some(':'), Some('/' | '\\')) if drive.is_ascii_alphabetic()
    )
}
