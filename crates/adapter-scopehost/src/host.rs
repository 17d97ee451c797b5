//! In-memory reference implementation of a scope-routed host.
//!
//! The host knows nothing about plugins. It holds exactly one
//! resolver and a table of loader callbacks keyed by scope name;
//! whoever resolves a module also names the scope whose loader will
//! be asked for its content.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::future::BoxFuture;
use plugbridge_core::{BridgeError, BridgeResult, Diagnostic, EmittedAsset};

/// The scope ordinary on-disk modules live in.
pub const FILE_SCOPE: &str = "file";

/// Arguments the host passes to its resolver.
#[derive(Debug, Clone)]
pub struct ScopeResolveArgs {
    pub specifier: String,
    pub importer: Option<String>,
    pub is_entry: bool,
}

/// A resolved module reference: a scope name plus an id that is only
/// meaningful to that scope's loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRef {
    pub scope: String,
    pub id: String,
    pub external: bool,
}

/// Content produced by a scope loader. The map travels serialized,
/// the way a real host boundary would carry it.
#[derive(Debug, Clone)]
pub struct ScopeLoaded {
    pub code: String,
    pub map: Option<String>,
}

pub type ScopeResolver = Arc<
    dyn Fn(ScopeResolveArgs) -> BoxFuture<'static, BridgeResult<Option<ScopeRef>>> + Send + Sync,
>;

pub type ScopeLoader =
    Arc<dyn Fn(String) -> BoxFuture<'static, BridgeResult<Option<ScopeLoaded>>> + Send + Sync>;

/// The mock host. Files, artifacts and warnings live in memory.
#[derive(Default)]
pub struct ScopeHost {
    files: RwLock<HashMap<String, String>>,
    resolver: RwLock<Option<ScopeResolver>>,
    loaders: RwLock<HashMap<String, ScopeLoader>>,
    artifacts: RwLock<Vec<EmittedAsset>>,
    warnings: RwLock<Vec<Diagnostic>>,
}

impl ScopeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &str, content: &str) {
        if let Ok(mut files) = self.files.write() {
            files.insert(path.to_string(), content.to_string());
        }
    }

    pub fn read_file(&self, path: &str) -> Option<String> {
        self.files.read().ok()?.get(path).cloned()
    }

    /// Installs the resolver. A host has exactly one.
    pub fn set_resolver(&self, resolver: ScopeResolver) {
        if let Ok(mut slot) = self.resolver.write() {
            *slot = Some(resolver);
        }
    }

    /// Registers the loader for a scope. Scopes are single-owner;
    /// a second registration for the same name is a wiring bug.
    pub fn register_loader(&self, scope: &str, loader: ScopeLoader) -> BridgeResult<()> {
        let mut loaders = self
            .loaders
            .write()
            .map_err(|_| BridgeError::host("loader table poisoned"))?;
        if loaders.contains_key(scope) {
            return Err(BridgeError::host(format!(
                "loader already registered for scope: {scope}"
            )));
        }
        loaders.insert(scope.to_string(), loader);
        Ok(())
    }

    pub async fn resolve(&self, args: ScopeResolveArgs) -> BridgeResult<Option<ScopeRef>> {
        let resolver = match self.resolver.read() {
            Ok(slot) => slot.clone(),
            Err(_) => return Err(BridgeError::host("resolver slot poisoned")),
        };
        match resolver {
            Some(resolver) => resolver(args).await,
            None => Ok(None),
        }
    }

    /// Dispatches a load to the loader owning `scope`.
    pub async fn load(&self, scope: &str, id: &str) -> BridgeResult<Option<ScopeLoaded>> {
        let loader = match self.loaders.read() {
            Ok(loaders) => loaders.get(scope).cloned(),
            Err(_) => return Err(BridgeError::host("loader table poisoned")),
        };
        let Some(loader) = loader else {
            return Err(BridgeError::host(format!(
                "no loader registered for scope: {scope}"
            )));
        };
        loader(id.to_string()).await
    }

    pub fn store_artifacts(&self, assets: &[EmittedAsset]) {
        if let Ok(mut artifacts) = self.artifacts.write() {
            artifacts.extend_from_slice(assets);
        }
    }

    pub fn artifacts(&self) -> Vec<EmittedAsset> {
        self.artifacts.read().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn report_warning(&self, diagnostic: &Diagnostic) {
        if let Ok(mut warnings) = self.warnings.write() {
            warnings.push(diagnostic.clone());
        }
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.warnings.read().map(|w| w.clone()).unwrap_or_default()
    }
}
