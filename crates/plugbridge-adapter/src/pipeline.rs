//! The shared resolve/load/transform pipeline.
//!
//! Every host adapter funnels into this type, which is what makes
//! hook invocation order and arguments identical across hosts: the
//! adapters marshal arguments, the pipeline decides everything else.

use std::path::Path;
use std::sync::Arc;

use plugbridge_core::{
    BridgeError, BridgeResult, BuildId, ModuleId, Namespace, ResolvedModule,
};
use plugbridge_plugin::{
    CompiledPlugin, ContextFactory, HookContext, PluginDefinition, PluginRegistry, ResolveArgs,
    SourceParser, TransformArgs,
};
use plugbridge_sourcemap::{SourceMap, combine};
use tracing::{debug, info};

use crate::driver::HostDriver;
use crate::state::{BuildReport, DeliveredModule, ModuleOutcome, ModuleState};

/// One build's pipeline: the compiled registry, the host driver and
/// the context factory, all scoped to a single `BuildId`.
///
/// Dropped with the build. Concurrent builds construct independent
/// adapters and share nothing.
pub struct BuildAdapter {
    pub(crate) registry: PluginRegistry,
    pub(crate) driver: Arc<dyn HostDriver>,
    pub(crate) factory: ContextFactory,
    pub(crate) forwarded_warnings: std::sync::Mutex<usize>,
}

impl BuildAdapter {
    /// Compiles plugin definitions and wires the pipeline to a host
    /// driver. Filters are anchored to `cwd`.
    pub fn new(
        defs: Vec<PluginDefinition>,
        driver: Arc<dyn HostDriver>,
        parser: Arc<dyn SourceParser>,
        cwd: &Path,
    ) -> BridgeResult<Self> {
        let registry = PluginRegistry::compile(defs, cwd)?;
        let factory = ContextFactory::new(registry.build_id(), parser, driver.native_context());
        let meta = driver.meta();
        info!(
            build_id = %registry.build_id(),
            framework = %meta.framework,
            plugins = registry.len(),
            "build adapter ready"
        );
        Ok(Self {
            registry,
            driver,
            factory,
            forwarded_warnings: std::sync::Mutex::new(0),
        })
    }

    /// The build this adapter serves.
    pub fn build_id(&self) -> BuildId {
        self.registry.build_id()
    }

    /// The compiled registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// The host driver.
    pub fn driver(&self) -> &Arc<dyn HostDriver> {
        &self.driver
    }

    /// The context factory for this build.
    pub fn context_factory(&self) -> &ContextFactory {
        &self.factory
    }

    /// Classifies a raw id string coming back from the host: virtual
    /// tokens route to their minting plugin, everything else is a
    /// file-namespace id.
    pub fn route_id(&self, raw: &str) -> ResolvedModule {
        match self.registry.route_virtual(raw) {
            Some((plugin, decoded)) => ResolvedModule::virtual_in(decoded, &plugin.name),
            None => ResolvedModule::file(raw),
        }
    }

    /// Runs an invocation and promotes errors the handler collected
    /// via `ctx.error` without propagating them.
    pub(crate) async fn guarded<T, F>(&self, ctx: &HookContext, plugin: &str, fut: F) -> BridgeResult<T>
    where
        F: Future<Output = BridgeResult<T>>,
    {
        let before = ctx.error_count();
        let value = match fut.await {
            Ok(value) => value,
            Err(err) => return Err(err.in_plugin(plugin)),
        };
        let collected = ctx.errors_since(before);
        if collected.is_empty() {
            Ok(value)
        } else {
            Err(BridgeError::handler(collected.join("; ")).in_plugin(plugin))
        }
    }

    /// Consults `resolve_id` hooks in dispatch order; the first
    /// non-`None` result wins. Empty-string importers are normalized
    /// to `None` before any hook sees them.
    pub async fn resolve(
        &self,
        specifier: &str,
        importer: Option<&str>,
        is_entry: bool,
    ) -> BridgeResult<Option<ResolvedModule>> {
        let importer = importer.filter(|i| !i.is_empty());
        let args = ResolveArgs {
            specifier: specifier.to_string(),
            importer: importer.map(str::to_string),
            is_entry,
        };
        for plugin in self.registry.plugins() {
            if let Some(resolved) = self.resolve_one(plugin, &args).await? {
                return Ok(Some(resolved));
            }
        }
        Ok(None)
    }

    /// Runs a single plugin's `resolve_id` hook, predicate-gated,
    /// and scopes the resolution. Hosts with per-plugin registration
    /// call this directly; [`BuildAdapter::resolve`] iterates it.
    pub async fn resolve_one(
        &self,
        plugin: &CompiledPlugin,
        args: &ResolveArgs,
    ) -> BridgeResult<Option<ResolvedModule>> {
        let Some(hook) = &plugin.resolve else {
            return Ok(None);
        };
        if !plugin.should_resolve(&args.specifier) {
            return Ok(None);
        }
        let ctx = self.factory.create(&plugin.name, None);
        let resolution = self
            .guarded(&ctx, &plugin.name, hook.handler.resolve(ctx.clone(), args.clone()))
            .await?;
        let Some(resolution) = resolution else {
            return Ok(None);
        };
        debug!(
            build_id = %self.build_id(),
            plugin = %plugin.name,
            specifier = %args.specifier,
            resolved = %resolution.id,
            external = resolution.external,
            "specifier resolved"
        );
        if resolution.external {
            return Ok(Some(ResolvedModule {
                id: ModuleId::new(resolution.id),
                namespace: Namespace::File,
                external: true,
                resolved_by: Some(plugin.name.clone()),
            }));
        }
        let id = ModuleId::new(resolution.id);
        let mut resolved = if id.is_host_absolute() {
            ResolvedModule::file(id.as_str())
        } else {
            // Non-path resolutions are scoped to the resolving
            // plugin so no other plugin can shadow them.
            ResolvedModule::virtual_in(id.as_str(), &plugin.name)
        };
        resolved.resolved_by = Some(plugin.name.clone());
        Ok(Some(resolved))
    }

    /// Consults `load` hooks. Virtual ids go only to their owning
    /// plugin; file ids to every plugin whose predicate passes, in
    /// order, first non-`None` wins. When no loader claims a file id
    /// and at least one transform hook might run for it, the raw
    /// content is read through the driver.
    pub async fn load(&self, module: &ResolvedModule) -> BridgeResult<Option<(String, Option<SourceMap>)>> {
        if module.external {
            return Ok(None);
        }
        match &module.namespace {
            Namespace::Plugin(owner) => {
                let plugin = self.registry.get(owner).ok_or_else(|| {
                    BridgeError::host(format!("virtual id owned by unknown plugin: {owner}"))
                })?;
                self.load_one(plugin, module).await
            }
            Namespace::File => {
                for plugin in self.registry.plugins() {
                    if let Some(loaded) = self.load_one(plugin, module).await? {
                        return Ok(Some(loaded));
                    }
                }
                self.raw_read(module).await
            }
        }
    }

    /// Runs a single plugin's `load` hook, predicate-gated. Callers
    /// are responsible for namespace routing.
    pub async fn load_one(
        &self,
        plugin: &CompiledPlugin,
        module: &ResolvedModule,
    ) -> BridgeResult<Option<(String, Option<SourceMap>)>> {
        let Some(hook) = &plugin.load else {
            return Ok(None);
        };
        if !plugin.should_load(module.id.as_str()) {
            return Ok(None);
        }
        let ctx = self.factory.create(&plugin.name, Some(&module.id));
        let result = self
            .guarded(
                &ctx,
                &plugin.name,
                hook.handler.load(ctx.clone(), module.id.as_str().to_string()),
            )
            .await?;
        if result.is_some() {
            debug!(
                build_id = %self.build_id(),
                plugin = %plugin.name,
                id = %module.id,
                "module loaded"
            );
        }
        Ok(result.map(|r| (r.code, r.map)))
    }

    /// The raw-read fallback for file-namespace modules no loader
    /// claimed. Gated on some transform hook possibly matching; ids
    /// no transform can touch are left to the host.
    pub async fn raw_read(
        &self,
        module: &ResolvedModule,
    ) -> BridgeResult<Option<(String, Option<SourceMap>)>> {
        if module.namespace != Namespace::File
            || !self.registry.any_may_transform(module.id.as_str())
        {
            return Ok(None);
        }
        debug!(build_id = %self.build_id(), id = %module.id, "raw read fallback");
        Ok(self
            .driver
            .read_raw(module.id.as_str())
            .await?
            .map(|c| (c, None)))
    }

    /// Threads source through every matching `transform` hook in
    /// dispatch order and combines the stage maps, most recent
    /// first. Stages returning `None` leave code and map untouched.
    pub async fn transform(
        &self,
        id: &ModuleId,
        code: String,
    ) -> BridgeResult<(String, Option<SourceMap>)> {
        let mut code = code;
        // Applied order; reversed before combining so index 0 is the
        // most recent stage.
        let mut stage_maps: Vec<SourceMap> = Vec::new();
        for plugin in self.registry.plugins() {
            let Some(hook) = &plugin.transform else {
                continue;
            };
            if !plugin.should_transform(id.as_str(), &code) {
                continue;
            }
            let ctx = self.factory.create(&plugin.name, Some(id));
            let args = TransformArgs {
                id: id.as_str().to_string(),
                code: code.clone(),
            };
            let result = self
                .guarded(&ctx, &plugin.name, hook.handler.transform(ctx.clone(), args))
                .await?;
            if let Some(result) = result {
                debug!(
                    build_id = %self.build_id(),
                    plugin = %plugin.name,
                    id = %id,
                    mapped = result.map.is_some(),
                    "module transformed"
                );
                code = result.code;
                if let Some(map) = result.map {
                    stage_maps.push(map);
                }
            }
        }
        if stage_maps.is_empty() {
            return Ok((code, None));
        }
        stage_maps.reverse();
        let combined = combine(id.as_str(), &stage_maps)?;
        Ok((code, Some(combined)))
    }

    /// Runs one module through resolve, load and transform.
    pub async fn run_module(
        &self,
        specifier: &str,
        importer: Option<&str>,
        is_entry: bool,
    ) -> BridgeResult<ModuleOutcome> {
        let mut state = ModuleState::Unresolved.advance(ModuleState::Resolving)?;
        let Some(resolved) = self.resolve(specifier, importer, is_entry).await? else {
            return Ok(ModuleOutcome::Unresolved);
        };
        state = state.advance(ModuleState::Resolved)?;
        if resolved.external {
            return Ok(ModuleOutcome::External(resolved));
        }
        state = state.advance(ModuleState::Loading)?;
        let Some((code, load_map)) = self.load(&resolved).await? else {
            return Ok(ModuleOutcome::NoContent(resolved));
        };
        state = state.advance(ModuleState::Loaded)?;
        state = state.advance(ModuleState::Transforming)?;
        let (code, transform_map) = self.transform(&resolved.id, code).await?;
        state = state.advance(ModuleState::Transformed)?;
        let map = match (transform_map, load_map) {
            (Some(t), Some(l)) => Some(combine(resolved.id.as_str(), &[t, l])?),
            (Some(t), None) => Some(t),
            (None, l) => l,
        };
        state = state.advance(ModuleState::Delivered)?;
        debug!(build_id = %self.build_id(), id = %resolved.id, state = %state, "module delivered");
        Ok(ModuleOutcome::Delivered(DeliveredModule {
            resolved,
            code,
            map,
        }))
    }

    /// Assembles the final build report from per-specifier outcomes
    /// and the build-wide context stores.
    pub fn report(&self, outcomes: Vec<(String, ModuleOutcome)>) -> BuildReport {
        let mut report = BuildReport::default();
        for (specifier, outcome) in outcomes {
            match outcome {
                ModuleOutcome::Unresolved => report.unresolved.push(specifier),
                ModuleOutcome::External(resolved) => report.externals.push(resolved),
                ModuleOutcome::NoContent(_) => report.unresolved.push(specifier),
                ModuleOutcome::Delivered(module) => report.modules.push(module),
            }
        }
        report.assets = self.factory.emitted_assets();
        report.diagnostics = self.factory.diagnostics();
        report.watch_files = self.factory.watch_files();
        report
    }
}
