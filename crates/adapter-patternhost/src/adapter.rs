//! The Plugbridge adapter for [`PatternHost`].
//!
//! Registration patterns are derived from declared filters where a
//! string glob allows it; everything else registers a match-all
//! pattern and relies on the pipeline's predicate checks. Either way
//! the pipeline re-applies the full predicate, so a wide pattern is
//! only a missed prefilter, never a behavior change.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use plugbridge_adapter::{BuildAdapter, BuildReport, HostDriver, ModuleOutcome};
use plugbridge_core::{
    BridgeResult, Diagnostic, EmittedAsset, Namespace, ResolvedModule, WatchEvent,
};
use plugbridge_filter::{FilterSpec, PatternSource};
use plugbridge_plugin::{
    DefaultParser, HookDecl, HostMeta, NativeBuildContext, PluginDefinition, ResolveArgs,
};
use plugbridge_sourcemap::{SourceMap, combine};
use tracing::debug;

use crate::host::{
    FILE_NAMESPACE, HostLoadArgs, HostResolveArgs, HostResolveResult, PatternHost,
};

/// Native context handed to hooks running under a pattern host.
pub struct PatternHostContext {
    host: Arc<PatternHost>,
}

impl NativeBuildContext for PatternHostContext {
    fn framework(&self) -> &str {
        "patternhost"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl PatternHostContext {
    /// The underlying host, for host-aware plugins.
    pub fn host(&self) -> &Arc<PatternHost> {
        &self.host
    }
}

struct PatternHostDriver {
    host: Arc<PatternHost>,
}

#[async_trait]
impl HostDriver for PatternHostDriver {
    fn meta(&self) -> HostMeta {
        HostMeta::new("patternhost", "1.4.0")
    }

    fn has_native_virtual_namespace(&self) -> bool {
        true
    }

    async fn read_raw(&self, id: &str) -> BridgeResult<Option<String>> {
        Ok(self.host.read_file(id))
    }

    async fn write_artifacts(&self, assets: &[EmittedAsset]) -> BridgeResult<()> {
        self.host.store_artifacts(assets);
        Ok(())
    }

    fn forward_warning(&self, diagnostic: &Diagnostic) {
        self.host.report_warning(diagnostic);
    }

    fn native_context(&self) -> Arc<dyn NativeBuildContext> {
        Arc::new(PatternHostContext {
            host: Arc::clone(&self.host),
        })
    }
}

/// Registration patterns for one plugin, derived before compilation.
struct DerivedPatterns {
    resolve: Vec<String>,
    load: Vec<String>,
}

const MATCH_ALL: &str = "*";

/// Anchors a relative glob the same way the filter engine does, so
/// the prefilter never rejects a path the compiled filter accepts.
fn anchor(pattern: &str, cwd: &Path) -> String {
    if pattern.starts_with("**") || pattern.starts_with('/') {
        pattern.to_string()
    } else {
        format!("{}/{}", cwd.display(), pattern)
    }
}

fn derive_patterns(spec: Option<&FilterSpec>, cwd: &Path) -> Vec<String> {
    let Some(spec) = spec else {
        return vec![MATCH_ALL.to_string()];
    };
    if spec.include.is_empty() {
        return vec![MATCH_ALL.to_string()];
    }
    let mut patterns = Vec::with_capacity(spec.include.len());
    for source in &spec.include {
        match source {
            PatternSource::Str(glob) => patterns.push(anchor(glob, cwd)),
            // Regexes have no host-side pattern form.
            PatternSource::Regex(_) => return vec![MATCH_ALL.to_string()],
        }
    }
    patterns
}

/// Runs a plugin set inside a [`PatternHost`].
pub struct PatternHostAdapter {
    host: Arc<PatternHost>,
    pipeline: Arc<BuildAdapter>,
    // The host's load protocol carries only code; load-stage maps
    // are stashed here so the combined map stays host-independent.
    load_maps: Arc<Mutex<HashMap<String, SourceMap>>>,
}

impl PatternHostAdapter {
    /// Compiles the plugins and registers their callbacks with the
    /// host.
    pub fn new(
        host: Arc<PatternHost>,
        defs: Vec<PluginDefinition>,
        cwd: &Path,
    ) -> BridgeResult<Self> {
        let derived: Vec<(String, DerivedPatterns)> = defs
            .iter()
            .map(|def| {
                let resolve = derive_patterns(
                    def.resolve_id.as_ref().and_then(HookDecl::filter),
                    cwd,
                );
                let load = derive_patterns(def.load.as_ref().and_then(HookDecl::filter), cwd);
                (def.name.clone(), DerivedPatterns { resolve, load })
            })
            .collect();
        let driver = Arc::new(PatternHostDriver {
            host: Arc::clone(&host),
        });
        let pipeline = Arc::new(BuildAdapter::new(
            defs,
            driver,
            Arc::new(DefaultParser),
            cwd,
        )?);
        let adapter = Self {
            host,
            pipeline,
            load_maps: Arc::new(Mutex::new(HashMap::new())),
        };
        adapter.register(&derived)?;
        Ok(adapter)
    }

    /// The shared pipeline.
    pub fn pipeline(&self) -> &Arc<BuildAdapter> {
        &self.pipeline
    }

    fn register(&self, derived: &[(String, DerivedPatterns)]) -> BridgeResult<()> {
        for plugin in self.pipeline.registry().plugins() {
            let patterns = derived
                .iter()
                .find(|(name, _)| *name == plugin.name)
                .map(|(_, p)| p);
            if plugin.resolve.is_some() {
                let resolve_patterns = patterns
                    .map(|p| p.resolve.clone())
                    .unwrap_or_else(|| vec![MATCH_ALL.to_string()]);
                for pattern in resolve_patterns {
                    let pipeline = Arc::clone(&self.pipeline);
                    let plugin = Arc::clone(plugin);
                    self.host.on_resolve(
                        &pattern,
                        Arc::new(move |args: HostResolveArgs| {
                            let pipeline = Arc::clone(&pipeline);
                            let plugin = Arc::clone(&plugin);
                            Box::pin(async move {
                                let args = ResolveArgs {
                                    specifier: args.path,
                                    importer: args.importer.filter(|i| !i.is_empty()),
                                    is_entry: args.is_entry,
                                };
                                let resolved = pipeline.resolve_one(&plugin, &args).await?;
                                Ok(resolved.map(to_host_result))
                            })
                        }),
                    )?;
                }
            }
            if plugin.load.is_some() {
                let load_patterns = patterns
                    .map(|p| p.load.clone())
                    .unwrap_or_else(|| vec![MATCH_ALL.to_string()]);
                for pattern in load_patterns {
                    let pipeline = Arc::clone(&self.pipeline);
                    let plugin = Arc::clone(plugin);
                    let load_maps = Arc::clone(&self.load_maps);
                    self.host.on_load(
                        &pattern,
                        FILE_NAMESPACE,
                        Arc::new(move |args: HostLoadArgs| {
                            let pipeline = Arc::clone(&pipeline);
                            let plugin = Arc::clone(&plugin);
                            let load_maps = Arc::clone(&load_maps);
                            Box::pin(async move {
                                let module = ResolvedModule::file(args.path.as_str());
                                let loaded = pipeline.load_one(&plugin, &module).await?;
                                Ok(loaded.map(|(code, map)| {
                                    stash_load_map(&load_maps, &args.path, map);
                                    code
                                }))
                            })
                        }),
                    )?;
                }
                // The host's namespace primitive carries virtual ids
                // verbatim; no codec involved.
                let pipeline = Arc::clone(&self.pipeline);
                let plugin = Arc::clone(plugin);
                let load_maps = Arc::clone(&self.load_maps);
                let scope = plugin.name.clone();
                self.host.on_load(
                    MATCH_ALL,
                    &scope,
                    Arc::new(move |args: HostLoadArgs| {
                        let pipeline = Arc::clone(&pipeline);
                        let plugin = Arc::clone(&plugin);
                        let load_maps = Arc::clone(&load_maps);
                        Box::pin(async move {
                            let module =
                                ResolvedModule::virtual_in(args.path.as_str(), &plugin.name);
                            let loaded = pipeline.load_one(&plugin, &module).await?;
                            Ok(loaded.map(|(code, map)| {
                                stash_load_map(&load_maps, &args.path, map);
                                code
                            }))
                        })
                    }),
                )?;
            }
        }
        // Raw-read fallback, registered last so every plugin loader
        // gets the first shot.
        let pipeline = Arc::clone(&self.pipeline);
        self.host.on_load(
            MATCH_ALL,
            FILE_NAMESPACE,
            Arc::new(move |args: HostLoadArgs| {
                let pipeline = Arc::clone(&pipeline);
                Box::pin(async move {
                    let module = ResolvedModule::file(args.path.as_str());
                    let raw = pipeline.raw_read(&module).await?;
                    Ok(raw.map(|(code, _map)| code))
                })
            }),
        )?;
        Ok(())
    }

    /// Runs one module through the host's registration protocol.
    async fn run_entry(&self, specifier: &str) -> BridgeResult<ModuleOutcome> {
        let resolved = self
            .host
            .resolve(HostResolveArgs {
                path: specifier.to_string(),
                importer: None,
                is_entry: true,
            })
            .await?;
        let Some(resolved) = resolved else {
            return Ok(ModuleOutcome::Unresolved);
        };
        let module = from_host_result(&resolved);
        if module.external {
            return Ok(ModuleOutcome::External(module));
        }
        let contents = self
            .host
            .load(HostLoadArgs {
                path: resolved.path.clone(),
                namespace: resolved.namespace.clone(),
            })
            .await?;
        let Some(contents) = contents else {
            return Ok(ModuleOutcome::NoContent(module));
        };
        let load_map = self
            .load_maps
            .lock()
            .ok()
            .and_then(|mut maps| maps.remove(&resolved.path));
        let (code, transform_map) = self.pipeline.transform(&module.id, contents).await?;
        let map = match (transform_map, load_map) {
            (Some(t), Some(l)) => Some(combine(module.id.as_str(), &[t, l])?),
            (Some(t), None) => Some(t),
            (None, l) => l,
        };
        Ok(ModuleOutcome::Delivered(plugbridge_adapter::DeliveredModule {
            resolved: module,
            code,
            map,
        }))
    }

    /// Runs a full build for the given entry specifiers.
    pub async fn build(&self, entries: &[&str]) -> BridgeResult<BuildReport> {
        self.pipeline.build_start().await?;
        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            debug!(entry = %entry, "patternhost entry");
            outcomes.push((entry.to_string(), self.run_entry(entry).await?));
        }
        self.pipeline.build_end().await?;
        self.pipeline.write_bundle().await?;
        Ok(self.pipeline.report(outcomes))
    }

    /// Notifies plugins of a watched-file change.
    pub async fn watch_change(&self, id: &str, event: WatchEvent) -> BridgeResult<()> {
        self.pipeline.watch_change(id, event).await
    }
}

fn stash_load_map(
    maps: &Mutex<HashMap<String, SourceMap>>,
    path: &str,
    map: Option<SourceMap>,
) {
    if let Some(map) = map {
        if let Ok(mut maps) = maps.lock() {
            maps.insert(path.to_string(), map);
        }
    }
}

fn to_host_result(module: ResolvedModule) -> HostResolveResult {
    HostResolveResult {
        path: module.id.as_str().to_string(),
        namespace: match &module.namespace {
            Namespace::File => FILE_NAMESPACE.to_string(),
            Namespace::Plugin(owner) => owner.clone(),
        },
        external: module.external,
    }
}

fn from_host_result(result: &HostResolveResult) -> ResolvedModule {
    let mut module = if result.namespace == FILE_NAMESPACE {
        ResolvedModule::file(result.path.as_str())
    } else {
        ResolvedModule::virtual_in(result.path.as_str(), result.namespace.as_str())
    };
    module.external = result.external;
    module
}
