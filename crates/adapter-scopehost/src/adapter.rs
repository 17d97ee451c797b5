//! The Plugbridge adapter for [`ScopeHost`].
//!
//! Every plugin gets its own loader scope, so virtual ids never
//! share the file scope with on-disk paths. The host still carries
//! ids as bare strings, so ids outside the file scope travel as
//! codec tokens and are decoded again before any hook sees them.

use std::any::Any;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use plugbridge_adapter::{
    BuildAdapter, BuildReport, DeliveredModule, HostDriver, ModuleOutcome,
};
use plugbridge_core::{
    BridgeResult, Diagnostic, EmittedAsset, Namespace, ResolvedModule, WatchEvent,
};
use plugbridge_plugin::{DefaultParser, HostMeta, NativeBuildContext, PluginDefinition};
use plugbridge_sourcemap::{SourceMap, combine};
use tracing::debug;

use crate::host::{FILE_SCOPE, ScopeHost, ScopeLoaded, ScopeRef, ScopeResolveArgs};

/// Native context handed to hooks running under a scope host.
pub struct ScopeHostContext {
    host: Arc<ScopeHost>,
}

impl NativeBuildContext for ScopeHostContext {
    fn framework(&self) -> &str {
        "scopehost"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ScopeHostContext {
    /// The underlying host, for host-aware plugins.
    pub fn host(&self) -> &Arc<ScopeHost> {
        &self.host
    }
}

struct ScopeHostDriver {
    host: Arc<ScopeHost>,
}

#[async_trait]
impl HostDriver for ScopeHostDriver {
    fn meta(&self) -> HostMeta {
        HostMeta::new("scopehost", "0.9.0")
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
        Arc::new(ScopeHostContext {
            host: Arc::clone(&self.host),
        })
    }
}

/// Runs a plugin set inside a [`ScopeHost`].
pub struct ScopeHostAdapter {
    host: Arc<ScopeHost>,
    pipeline: Arc<BuildAdapter>,
}

impl ScopeHostAdapter {
    /// Compiles the plugins, installs the resolver and registers one
    /// loader scope per plugin plus the shared file scope.
    pub fn new(
        host: Arc<ScopeHost>,
        defs: Vec<PluginDefinition>,
        cwd: &Path,
    ) -> BridgeResult<Self> {
        let driver = Arc::new(ScopeHostDriver {
            host: Arc::clone(&host),
        });
        let pipeline = Arc::new(BuildAdapter::new(
            defs,
            driver,
            Arc::new(DefaultParser),
            cwd,
        )?);
        let adapter = Self { host, pipeline };
        adapter.wire()?;
        Ok(adapter)
    }

    /// The shared pipeline.
    pub fn pipeline(&self) -> &Arc<BuildAdapter> {
        &self.pipeline
    }

    fn wire(&self) -> BridgeResult<()> {
        let pipeline = Arc::clone(&self.pipeline);
        self.host.set_resolver(Arc::new(move |args: ScopeResolveArgs| {
            let pipeline = Arc::clone(&pipeline);
            Box::pin(async move {
                let resolved = pipeline
                    .resolve(&args.specifier, args.importer.as_deref(), args.is_entry)
                    .await?;
                Ok(resolved.map(|module| to_scope_ref(&pipeline, &module)))
            })
        }));
        // Every plugin owns a scope, loader hook or not, so a module
        // resolved into its namespace always has somewhere to land.
        for plugin in self.pipeline.registry().plugins() {
            let pipeline = Arc::clone(&self.pipeline);
            let plugin = Arc::clone(plugin);
            let scope = plugin.name.clone();
            self.host.register_loader(
                &scope,
                Arc::new(move |token: String| {
                    let pipeline = Arc::clone(&pipeline);
                    let plugin = Arc::clone(&plugin);
                    Box::pin(async move {
                        let id = plugin.codec.decode(&token).unwrap_or(token);
                        let module = ResolvedModule::virtual_in(id.as_str(), &plugin.name);
                        let loaded = pipeline.load(&module).await?;
                        to_scope_loaded(loaded)
                    })
                }),
            )?;
        }
        let pipeline = Arc::clone(&self.pipeline);
        self.host.register_loader(
            FILE_SCOPE,
            Arc::new(move |id: String| {
                let pipeline = Arc::clone(&pipeline);
                Box::pin(async move {
                    let module = ResolvedModule::file(id.as_str());
                    let loaded = pipeline.load(&module).await?;
                    to_scope_loaded(loaded)
                })
            }),
        )?;
        Ok(())
    }

    /// Runs one module through the host's scope routing.
    async fn run_entry(&self, specifier: &str) -> BridgeResult<ModuleOutcome> {
        let resolved = self
            .host
            .resolve(ScopeResolveArgs {
                specifier: specifier.to_string(),
                importer: None,
                is_entry: true,
            })
            .await?;
        let Some(scope_ref) = resolved else {
            return Ok(ModuleOutcome::Unresolved);
        };
        let module = self.from_scope_ref(&scope_ref);
        if module.external {
            return Ok(ModuleOutcome::External(module));
        }
        let loaded = self.host.load(&scope_ref.scope, &scope_ref.id).await?;
        let Some(loaded) = loaded else {
            return Ok(ModuleOutcome::NoContent(module));
        };
        let load_map = match &loaded.map {
            Some(json) => Some(SourceMap::from_json(json)?),
            None => None,
        };
        let (code, transform_map) = self.pipeline.transform(&module.id, loaded.code).await?;
        let map = match (transform_map, load_map) {
            (Some(t), Some(l)) => Some(combine(module.id.as_str(), &[t, l])?),
            (Some(t), None) => Some(t),
            (None, l) => l,
        };
        Ok(ModuleOutcome::Delivered(DeliveredModule {
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
            debug!(entry = %entry, "scopehost entry");
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

    fn from_scope_ref(&self, scope_ref: &ScopeRef) -> ResolvedModule {
        let mut module = if scope_ref.scope == FILE_SCOPE {
            ResolvedModule::file(scope_ref.id.as_str())
        } else {
            let id = self
                .pipeline
                .registry()
                .get(&scope_ref.scope)
                .and_then(|plugin| plugin.codec.decode(&scope_ref.id))
                .unwrap_or_else(|| scope_ref.id.clone());
            ResolvedModule::virtual_in(id.as_str(), scope_ref.scope.as_str())
        };
        module.external = scope_ref.external;
        module
    }
}

fn to_scope_ref(pipeline: &BuildAdapter, module: &ResolvedModule) -> ScopeRef {
    match &module.namespace {
        Namespace::File => ScopeRef {
            scope: FILE_SCOPE.to_string(),
            id: module.id.as_str().to_string(),
            external: module.external,
        },
        Namespace::Plugin(owner) => {
            let id = match pipeline.registry().get(owner) {
                Some(plugin) => plugin.codec.encode(module.id.as_str()),
                None => module.id.as_str().to_string(),
            };
            ScopeRef {
                scope: owner.clone(),
                id,
                external: module.external,
            }
        }
    }
}

fn to_scope_loaded(
    loaded: Option<(String, Option<SourceMap>)>,
) -> BridgeResult<Option<ScopeLoaded>> {
    match loaded {
        Some((code, map)) => {
            let map = match map {
                Some(map) => Some(map.to_json()?),
                None => None,
            };
            Ok(Some(ScopeLoaded { code, map }))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use plugbridge_core::Resolution;
    use plugbridge_plugin::{
        ClosureLoad, ClosureResolve, ClosureTransform, HookDecl, LoadResult, ResolveArgs,
        TransformDecl, TransformResult,
    };

    use super::*;

    fn virtual_plugin() -> PluginDefinition {
        let mut def = PluginDefinition::new("virtual-config");
        def.resolve_id = Some(HookDecl::Bare(ClosureResolve::arc(
            |_ctx, args: ResolveArgs| async move {
                if args.specifier == "virtual:config" {
                    Ok(Some(Resolution::id("virtual:config")))
                } else {
                    Ok(None)
                }
            },
        )));
        def.load = Some(HookDecl::Bare(ClosureLoad::arc(|_ctx, id: String| async move {
            // The loader always sees the original id, never a token.
            assert_eq!(id, "virtual:config");
            Ok(Some(LoadResult::from("export const mode = \"dev\"")))
        })));
        def
    }

    #[tokio::test]
    async fn test_virtual_id_travels_as_token_between_scopes() {
        let host = Arc::new(ScopeHost::new());
        let adapter =
            ScopeHostAdapter::new(Arc::clone(&host), vec![virtual_plugin()], Path::new("/proj"))
                .expect("adapter");
        // What the host hands its loader is the encoded token.
        let scope_ref = host
            .resolve(ScopeResolveArgs {
                specifier: "virtual:config".to_string(),
                importer: None,
                is_entry: true,
            })
            .await
            .expect("resolve")
            .expect("resolved");
        assert_eq!(scope_ref.scope, "virtual-config");
        assert!(scope_ref.id.starts_with("virtual-mod://"));
        assert!(!scope_ref.id.contains("virtual:config"));
        let report = adapter.build(&["virtual:config"]).await.expect("build");
        assert_eq!(report.modules.len(), 1);
        let module = &report.modules[0];
        assert_eq!(module.code, "export const mode = \"dev\"");
        assert_eq!(module.resolved.id.as_str(), "virtual:config");
        assert_eq!(
            module.resolved.namespace,
            Namespace::Plugin("virtual-config".to_string())
        );
    }

    #[tokio::test]
    async fn test_file_scope_raw_read_feeds_transform() {
        let host = Arc::new(ScopeHost::new());
        host.add_file("/proj/src/app.ts", "let a = 1");
        let mut banner = PluginDefinition::new("banner");
        banner.transform = Some(TransformDecl::Filtered {
            handler: ClosureTransform::arc(
                |_ctx, args: plugbridge_plugin::TransformArgs| async move {
                    Ok(Some(TransformResult {
                        code: format!("// banner\n{}", args.code),
                        map: None,
                    }))
                },
            ),
            id: Some("**/*.ts".into()),
            code: None,
        });
        let mut resolver = PluginDefinition::new("resolver");
        resolver.resolve_id = Some(HookDecl::Bare(ClosureResolve::arc(
            |_ctx, args: ResolveArgs| async move { Ok(Some(Resolution::id(args.specifier))) },
        )));
        let adapter = ScopeHostAdapter::new(
            Arc::clone(&host),
            vec![resolver, banner],
            Path::new("/proj"),
        )
        .expect("adapter");
        let report = adapter.build(&["/proj/src/app.ts"]).await.expect("build");
        assert_eq!(report.modules[0].code, "// banner\nlet a = 1");
        assert_eq!(report.modules[0].resolved.namespace, Namespace::File);
    }

    #[tokio::test]
    async fn test_scope_without_loader_hook_yields_no_content() {
        let host = Arc::new(ScopeHost::new());
        let mut def = PluginDefinition::new("resolver-only");
        def.resolve_id = Some(HookDecl::Bare(ClosureResolve::arc(
            |_ctx, _args: ResolveArgs| async move { Ok(Some(Resolution::id("virtual:empty"))) },
        )));
        let adapter =
            ScopeHostAdapter::new(Arc::clone(&host), vec![def], Path::new("/proj")).expect("adapter");
        let report = adapter.build(&["virtual:empty"]).await.expect("build");
        assert!(report.modules.is_empty());
        assert_eq!(report.unresolved, vec!["virtual:empty".to_string()]);
    }
}
