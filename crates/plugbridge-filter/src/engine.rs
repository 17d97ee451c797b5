//! Compiled filters and their tri-state resolution rules.
//!
//! Resolution per candidate: any exclude match is a definite `false`;
//! otherwise any include match is a definite `true`; otherwise a
//! non-empty include list resolves to `false` (allow-list semantics)
//! and an empty one is indeterminate. Indeterminate defaults to
//! `true` at the combination layer.

use std::env;
use std::path::{Path, PathBuf};

use plugbridge_core::BridgeResult;

use crate::pattern::{CodePattern, IdPattern, PatternSource};
use crate::spec::FilterSpec;

/// A compiled id predicate for resolve/load hooks.
#[derive(Debug, Clone)]
pub struct IdFilter {
    include: Vec<IdPattern>,
    exclude: Vec<IdPattern>,
}

impl IdFilter {
    /// Compiles a spec, capturing the current working directory for
    /// glob anchoring.
    pub fn compile(spec: &FilterSpec) -> BridgeResult<Self> {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::compile_in(spec, &cwd)
    }

    /// Compiles a spec against an explicit working directory.
    pub fn compile_in(spec: &FilterSpec, cwd: &Path) -> BridgeResult<Self> {
        Ok(Self {
            include: compile_id_patterns(&spec.include, cwd)?,
            exclude: compile_id_patterns(&spec.exclude, cwd)?,
        })
    }

    /// Tri-state resolution against an id. The id must already be
    /// normalized to forward slashes by the caller.
    pub fn resolve(&self, id: &str) -> Option<bool> {
        if self.exclude.iter().any(|p| p.is_match(id)) {
            return Some(false);
        }
        if self.include.iter().any(|p| p.is_match(id)) {
            return Some(true);
        }
        if !self.include.is_empty() {
            return Some(false);
        }
        None
    }

    /// Definite match with the default-allow rule applied.
    pub fn matches(&self, id: &str) -> bool {
        self.resolve(id).unwrap_or(true)
    }
}

/// A compiled code predicate for transform hooks.
#[derive(Debug, Clone)]
pub struct CodeFilter {
    include: Vec<CodePattern>,
    exclude: Vec<CodePattern>,
}

impl CodeFilter {
    /// Compiles a spec. String patterns are raw substrings here.
    pub fn compile(spec: &FilterSpec) -> BridgeResult<Self> {
        Ok(Self {
            include: compile_code_patterns(&spec.include)?,
            exclude: compile_code_patterns(&spec.exclude)?,
        })
    }

    /// Tri-state resolution against source text.
    pub fn resolve(&self, code: &str) -> Option<bool> {
        if self.exclude.iter().any(|p| p.is_match(code)) {
            return Some(false);
        }
        if self.include.iter().any(|p| p.is_match(code)) {
            return Some(true);
        }
        if !self.include.is_empty() {
            return Some(false);
        }
        None
    }

    /// Definite match with the default-allow rule applied.
    pub fn matches(&self, code: &str) -> bool {
        self.resolve(code).unwrap_or(true)
    }
}

/// The combined id+code predicate for transform hooks.
///
/// The two predicates are evaluated independently. A definite `false`
/// from either side rejects; otherwise a definite `true` from either
/// side accepts; when both are indeterminate the combined result is
/// `true`.
#[derive(Debug, Clone)]
pub struct TransformFilter {
    id: Option<IdFilter>,
    code: Option<CodeFilter>,
}

impl TransformFilter {
    /// Compiles independent id and code specs. Either may be absent.
    pub fn compile(
        id_spec: Option<&FilterSpec>,
        code_spec: Option<&FilterSpec>,
        cwd: &Path,
    ) -> BridgeResult<Self> {
        Ok(Self {
            id: id_spec.map(|s| IdFilter::compile_in(s, cwd)).transpose()?,
            code: code_spec.map(CodeFilter::compile).transpose()?,
        })
    }

    /// A filter with no constraints; matches every id and source.
    pub fn always() -> Self {
        Self {
            id: None,
            code: None,
        }
    }

    /// Resolves only the id side, for callers that do not have the
    /// source text yet (e.g. the raw-read fallback guard).
    pub fn resolve_id(&self, id: &str) -> Option<bool> {
        self.id.as_ref().and_then(|f| f.resolve(id))
    }

    /// The combined predicate.
    pub fn matches(&self, id: &str, code: &str) -> bool {
        let id_r = self.id.as_ref().and_then(|f| f.resolve(id));
        let code_r = self.code.as_ref().and_then(|f| f.resolve(code));
        match (id_r, code_r) {
            (Some(false), _) | (_, Some(false)) => false,
            (Some(true), _) | (_, Some(true)) => true,
            (None, None) => true,
        }
    }
}

fn compile_id_patterns(sources: &[PatternSource], cwd: &Path) -> BridgeResult<Vec<IdPattern>> {
    sources.iter().map(|s| IdPattern::compile(s, cwd)).collect()
}

fn compile_code_patterns(sources: &[PatternSource]) -> BridgeResult<Vec<CodePattern>> {
    sources.iter().map(CodePattern::compile).collect()
}
