//! An in-memory pattern-registration host.
//!
//! The protocol: callers register resolve and load callbacks against
//! a path pattern and an optional namespace; the host consults
//! registrations in order and takes the first non-`None` answer.
//! Namespaces are first-class, so ids never need to be encoded into
//! path strings.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use globset::{Glob, GlobMatcher};
use plugbridge_core::{BridgeError, BridgeResult, Diagnostic, EmittedAsset};

/// The namespace real files live in.
pub const FILE_NAMESPACE: &str = "file";

/// Arguments handed to a resolve callback.
#[derive(Debug, Clone)]
pub struct HostResolveArgs {
    /// The specifier as written.
    pub path: String,
    /// The importing module, when any.
    pub importer: Option<String>,
    /// Whether this is a build entry.
    pub is_entry: bool,
}

/// What a resolve callback returns when it claims a specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResolveResult {
    /// The resolved path, meaningful within `namespace`.
    pub path: String,
    /// The namespace the path lives in.
    pub namespace: String,
    /// Whether the module is external.
    pub external: bool,
}

/// Arguments handed to a load callback.
#[derive(Debug, Clone)]
pub struct HostLoadArgs {
    /// The path to load, meaningful within `namespace`.
    pub path: String,
    /// The namespace the path lives in.
    pub namespace: String,
}

type ResolveCallback =
    Arc<dyn Fn(HostResolveArgs) -> BoxFuture<'static, BridgeResult<Option<HostResolveResult>>> + Send + Sync>;
type LoadCallback =
    Arc<dyn Fn(HostLoadArgs) -> BoxFuture<'static, BridgeResult<Option<String>>> + Send + Sync>;

struct ResolveRegistration {
    pattern: GlobMatcher,
    callback: ResolveCallback,
}

struct LoadRegistration {
    pattern: GlobMatcher,
    namespace: String,
    callback: LoadCallback,
}

/// The host itself: a file store, registration tables and an
/// artifact sink.
#[derive(Default)]
pub struct PatternHost {
    files: RwLock<HashMap<String, String>>,
    resolvers: RwLock<Vec<ResolveRegistration>>,
    loaders: RwLock<Vec<LoadRegistration>>,
    artifacts: RwLock<Vec<EmittedAsset>>,
    warnings: RwLock<Vec<Diagnostic>>,
}

fn compile_pattern(pattern: &str) -> BridgeResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| BridgeError::host(format!("invalid registration pattern {pattern:?}: {e}")))
}

impl PatternHost {
    /// An empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file into the host's filesystem view.
    pub fn add_file(&self, path: impl Into<String>, content: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.into(), content.into());
        }
    }

    /// Reads a seeded file.
    pub fn read_file(&self, path: &str) -> Option<String> {
        self.files.read().ok()?.get(path).cloned()
    }

    /// Registers a resolve callback for paths matching `pattern`.
    pub fn on_resolve(&self, pattern: &str, callback: ResolveCallback) -> BridgeResult<()> {
        let pattern = compile_pattern(pattern)?;
        self.resolvers
            .write()
            .map_err(|_| BridgeError::host("resolver table poisoned"))?
            .push(ResolveRegistration { pattern, callback });
        Ok(())
    }

    /// Registers a load callback for paths matching `pattern` inside
    /// `namespace`.
    pub fn on_load(
        &self,
        pattern: &str,
        namespace: &str,
        callback: LoadCallback,
    ) -> BridgeResult<()> {
        let pattern = compile_pattern(pattern)?;
        self.loaders
            .write()
            .map_err(|_| BridgeError::host("loader table poisoned"))?
            .push(LoadRegistration {
                pattern,
                namespace: namespace.to_string(),
                callback,
            });
        Ok(())
    }

    /// Consults resolve registrations in order; first claim wins.
    pub async fn resolve(&self, args: HostResolveArgs) -> BridgeResult<Option<HostResolveResult>> {
        let callbacks: Vec<ResolveCallback> = {
            let resolvers = self
                .resolvers
                .read()
                .map_err(|_| BridgeError::host("resolver table poisoned"))?;
            resolvers
                .iter()
                .filter(|r| r.pattern.is_match(&args.path))
                .map(|r| Arc::clone(&r.callback))
                .collect()
        };
        for callback in callbacks {
            if let Some(result) = callback(args.clone()).await? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Consults load registrations in order; first claim wins.
    pub async fn load(&self, args: HostLoadArgs) -> BridgeResult<Option<String>> {
        let callbacks: Vec<LoadCallback> = {
            let loaders = self
                .loaders
                .read()
                .map_err(|_| BridgeError::host("loader table poisoned"))?;
            loaders
                .iter()
                .filter(|l| l.namespace == args.namespace && l.pattern.is_match(&args.path))
                .map(|l| Arc::clone(&l.callback))
                .collect()
        };
        for callback in callbacks {
            if let Some(contents) = callback(args.clone()).await? {
                return Ok(Some(contents));
            }
        }
        Ok(None)
    }

    /// Stores build artifacts.
    pub fn store_artifacts(&self, assets: &[EmittedAsset]) {
        if let Ok(mut artifacts) = self.artifacts.write() {
            artifacts.extend_from_slice(assets);
        }
    }

    /// Artifacts stored so far.
    pub fn artifacts(&self) -> Vec<EmittedAsset> {
        self.artifacts.read().map(|a| a.clone()).unwrap_or_default()
    }

    /// Records a warning surfaced by the adapter.
    pub fn report_warning(&self, diagnostic: &Diagnostic) {
        if let Ok(mut warnings) = self.warnings.write() {
            warnings.push(diagnostic.clone());
        }
    }

    /// Warnings reported so far.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.warnings.read().map(|w| w.clone()).unwrap_or_default()
    }
}
