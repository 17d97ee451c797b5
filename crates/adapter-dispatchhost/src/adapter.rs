//! The Plugbridge adapter for [`DispatchHost`].
//!
//! The host carries ids as bare strings and flips backslashes, so
//! virtual ids cross the boundary as codec tokens; the adapter
//! decodes them back before any plugin sees them.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use plugbridge_adapter::{BuildAdapter, BuildReport, DeliveredModule, HostDriver, ModuleOutcome};
use plugbridge_core::{
    BridgeResult, Diagnostic, EmittedAsset, Namespace, ResolvedModule, WatchEvent,
};
use plugbridge_plugin::{DefaultParser, HostMeta, NativeBuildContext, PluginDefinition};
use plugbridge_sourcemap::{SourceMap, combine};
use tracing::debug;

use crate::host::{DispatchHost, Dispatcher, HostEvent, HostModuleRecord, HostResponse};

/// Native context handed to hooks running under a dispatch host.
pub struct DispatchHostContext {
    host: Arc<DispatchHost>,
}

impl DispatchHostContext {
    /// The underlying host, for host-aware plugins.
    pub fn host(&self) -> &Arc<DispatchHost> {
        &self.host
    }
}

impl NativeBuildContext for DispatchHostContext {
    fn framework(&self) -> &str {
        "dispatchhost"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct DispatchHostDriver {
    host: Arc<DispatchHost>,
}

#[async_trait]
impl HostDriver for DispatchHostDriver {
    fn meta(&self) -> HostMeta {
        HostMeta::new("dispatchhost", "2.1.0")
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
        Arc::new(DispatchHostContext {
            host: Arc::clone(&self.host),
        })
    }
}

/// Runs a plugin set inside a [`DispatchHost`].
pub struct DispatchHostAdapter {
    host: Arc<DispatchHost>,
    pipeline: Arc<BuildAdapter>,
    // The host's module loop discards the loaded map, so it is
    // chained into the transform response here instead.
    load_maps: Mutex<HashMap<String, SourceMap>>,
}

impl DispatchHostAdapter {
    /// Compiles the plugins against the host.
    pub fn new(
        host: Arc<DispatchHost>,
        defs: Vec<PluginDefinition>,
        cwd: &Path,
    ) -> BridgeResult<Self> {
        let driver = Arc::new(DispatchHostDriver {
            host: Arc::clone(&host),
        });
        let pipeline = Arc::new(BuildAdapter::new(
            defs,
            driver,
            Arc::new(DefaultParser),
            cwd,
        )?);
        Ok(Self {
            host,
            pipeline,
            load_maps: Mutex::new(HashMap::new()),
        })
    }

    /// The shared pipeline.
    pub fn pipeline(&self) -> &Arc<BuildAdapter> {
        &self.pipeline
    }

    /// Encodes a resolution into the single string id the host can
    /// carry: file ids verbatim, virtual ids as codec tokens.
    fn encode_id(&self, module: &ResolvedModule) -> String {
        match &module.namespace {
            Namespace::File => module.id.as_str().to_string(),
            Namespace::Plugin(owner) => {
                match self.pipeline.registry().get(owner) {
                    Some(plugin) => plugin.codec.encode(module.id.as_str()),
                    // Unknown owner cannot happen for resolutions the
                    // pipeline produced; carry the id unscoped.
                    None => module.id.as_str().to_string(),
                }
            }
        }
    }

    fn map_json(map: Option<SourceMap>) -> BridgeResult<Option<String>> {
        map.map(|m| m.to_json()).transpose()
    }

    /// Runs a full build, with the host driving the module loop.
    pub async fn build(&self, entries: &[&str]) -> BridgeResult<BuildReport> {
        let records = self.host.run_build(self, entries).await?;
        let mut outcomes = Vec::with_capacity(records.len());
        for (specifier, record) in records {
            let outcome = match record {
                HostModuleRecord::Unresolved => ModuleOutcome::Unresolved,
                HostModuleRecord::External(id) => {
                    let mut module = self.pipeline.route_id(&id);
                    module.external = true;
                    ModuleOutcome::External(module)
                }
                HostModuleRecord::NoContent(id) => {
                    ModuleOutcome::NoContent(self.pipeline.route_id(&id))
                }
                HostModuleRecord::Processed { id, code, map } => {
                    let resolved = self.pipeline.route_id(&id);
                    let map = map.as_deref().map(SourceMap::from_json).transpose()?;
                    ModuleOutcome::Delivered(DeliveredModule {
                        resolved,
                        code,
                        map,
                    })
                }
            };
            outcomes.push((specifier, outcome));
        }
        Ok(self.pipeline.report(outcomes))
    }

    /// Notifies plugins of a watched-file change.
    pub async fn watch_change(&self, id: &str, event: WatchEvent) -> BridgeResult<()> {
        self.dispatch(HostEvent::WatchChange {
            id: id.to_string(),
            event,
        })
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl Dispatcher for DispatchHostAdapter {
    async fn dispatch(&self, event: HostEvent) -> BridgeResult<HostResponse> {
        debug!(build_id = %self.pipeline.build_id(), event = ?event, "dispatch");
        match event {
            HostEvent::Resolve {
                specifier,
                importer,
                is_entry,
            } => {
                let importer = (!importer.is_empty()).then_some(importer);
                let resolved = self
                    .pipeline
                    .resolve(&specifier, importer.as_deref(), is_entry)
                    .await?;
                Ok(match resolved {
                    Some(module) => HostResponse::Resolved {
                        id: Some(self.encode_id(&module)),
                        external: module.external,
                    },
                    None => HostResponse::Resolved {
                        id: None,
                        external: false,
                    },
                })
            }
            HostEvent::Load { id } => {
                let module = self.pipeline.route_id(&id);
                let loaded = self.pipeline.load(&module).await?;
                Ok(match loaded {
                    Some((code, map)) => {
                        if let Some(map) = &map {
                            if let Ok(mut maps) = self.load_maps.lock() {
                                maps.insert(id.clone(), map.clone());
                            }
                        }
                        HostResponse::Loaded {
                            code: Some(code),
                            map: Self::map_json(map)?,
                        }
                    }
                    None => HostResponse::Loaded {
                        code: None,
                        map: None,
                    },
                })
            }
            HostEvent::Transform { id, code } => {
                let module = self.pipeline.route_id(&id);
                let (code, transform_map) = self.pipeline.transform(&module.id, code).await?;
                let load_map = self.load_maps.lock().ok().and_then(|mut maps| maps.remove(&id));
                let map = match (transform_map, load_map) {
                    (Some(t), Some(l)) => Some(combine(module.id.as_str(), &[t, l])?),
                    (Some(t), None) => Some(t),
                    (None, l) => l,
                };
                Ok(HostResponse::Transformed {
                    code,
                    map: Self::map_json(map)?,
                })
            }
            HostEvent::BuildStart => {
                self.pipeline.build_start().await?;
                Ok(HostResponse::Done)
            }
            HostEvent::BuildEnd => {
                self.pipeline.build_end().await?;
                Ok(HostResponse::Done)
            }
            HostEvent::WriteBundle => {
                self.pipeline.write_bundle().await?;
                Ok(HostResponse::Done)
            }
            HostEvent::WatchChange { id, event } => {
                self.pipeline.watch_change(&id, event).await?;
                Ok(HostResponse::Done)
            }
        }
    }
}
