//! The build-scoped plugin registry.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use plugbridge_core::{BridgeError, BridgeResult, BuildId};
use tracing::info;

use crate::compile::CompiledPlugin;
use crate::definition::{Enforce, HostMeta, PluginDefinition, PluginFactory};

/// All plugins of one build, in final dispatch order.
///
/// Registries are per build: concurrent builds each construct their
/// own and share no mutable state. Ordering is `enforce: pre`, then
/// unclassified, then `enforce: post`, with registration order kept
/// inside each class.
pub struct PluginRegistry {
    build: BuildId,
    plugins: Vec<Arc<CompiledPlugin>>,
}

fn enforce_rank(enforce: Option<Enforce>) -> u8 {
    match enforce {
        Some(Enforce::Pre) => 0,
        None => 1,
        Some(Enforce::Post) => 2,
    }
}

impl PluginRegistry {
    /// Compiles definitions into a registry for a fresh build.
    pub fn compile(defs: Vec<PluginDefinition>, cwd: &Path) -> BridgeResult<Self> {
        let build = BuildId::new();
        let mut seen = HashSet::new();
        for def in &defs {
            def.validate()?;
            if !seen.insert(def.name.clone()) {
                return Err(BridgeError::config(format!(
                    "duplicate plugin name: {}",
                    def.name
                )));
            }
        }
        let mut plugins = Vec::with_capacity(defs.len());
        for def in defs {
            let compiled = CompiledPlugin::compile(def, cwd)?;
            info!(
                build_id = %build,
                plugin = %compiled.name,
                enforce = ?compiled.enforce,
                "plugin registered"
            );
            plugins.push(Arc::new(compiled));
        }
        plugins.sort_by_key(|p| enforce_rank(p.enforce));
        Ok(Self { build, plugins })
    }

    /// Runs factories against host metadata and compiles everything
    /// they return, flattened in factory order.
    pub fn from_factories(
        factories: &[Arc<dyn PluginFactory>],
        meta: &HostMeta,
        cwd: &Path,
    ) -> BridgeResult<Self> {
        let mut defs = Vec::new();
        for factory in factories {
            defs.extend(factory.build(meta)?);
        }
        Self::compile(defs, cwd)
    }

    /// The build this registry belongs to.
    pub fn build_id(&self) -> BuildId {
        self.build
    }

    /// Plugins in dispatch order.
    pub fn plugins(&self) -> &[Arc<CompiledPlugin>] {
        &self.plugins
    }

    /// Looks a plugin up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<CompiledPlugin>> {
        self.plugins.iter().find(|p| p.name == name)
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Routes a raw id to the plugin whose codec minted it, together
    /// with the decoded virtual id.
    pub fn route_virtual(&self, raw: &str) -> Option<(&Arc<CompiledPlugin>, String)> {
        self.plugins.iter().find_map(|p| {
            let decoded = p.codec.decode(raw)?;
            Some((p, decoded))
        })
    }

    /// Whether any plugin's transform hook might run for this id.
    /// Gates speculative raw reads of modules no loader claimed.
    pub fn any_may_transform(&self, id: &str) -> bool {
        self.plugins.iter().any(|p| p.may_transform_id(id))
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("build", &self.build)
            .field("plugins", &self.plugins.len())
            .finish()
    }
}
