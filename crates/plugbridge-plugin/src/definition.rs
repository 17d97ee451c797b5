//! The plugin definition surface consumed from plugin authors.

use std::fmt;
use std::sync::Arc;

use plugbridge_core::{BridgeError, BridgeResult};
use plugbridge_filter::FilterSpec;
use serde::{Deserialize, Serialize};

use crate::handlers::{LifecycleHook, LoadHook, ResolveHook, TransformHook, WatchChangeHook};

/// Enumeration of the uniform hook set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Maps a specifier to a module id.
    ResolveId,
    /// Produces a module's source for an id.
    Load,
    /// Rewrites a module's source.
    Transform,
    /// Fired once when a build begins.
    BuildStart,
    /// Fired once when a build's module processing ends.
    BuildEnd,
    /// Fired once after the host has durably written all artifacts.
    WriteBundle,
    /// Fired per watched-file change.
    WatchChange,
}

impl HookKind {
    /// Returns the string name of this hook kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveId => "resolve_id",
            Self::Load => "load",
            Self::Transform => "transform",
            Self::BuildStart => "build_start",
            Self::BuildEnd => "build_end",
            Self::WriteBundle => "write_bundle",
            Self::WatchChange => "watch_change",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Plugin ordering class relative to unclassified plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforce {
    /// Runs before unclassified plugins.
    Pre,
    /// Runs after unclassified plugins.
    Post,
}

/// A hook declaration: a bare handler, or a handler plus filter.
///
/// The variant is fixed at declaration time; nothing downstream ever
/// re-inspects the shape.
pub enum HookDecl<H: ?Sized> {
    /// A handler with no filter; applies to every candidate.
    Bare(Arc<H>),
    /// A handler gated by a compiled filter.
    Filtered {
        /// The handler.
        handler: Arc<H>,
        /// The id filter spec.
        filter: FilterSpec,
    },
}

// Handlers live behind `Arc`, so cloning a declaration never needs
// `H: Clone`; a derive would demand it and rule out trait objects.
impl<H: ?Sized> Clone for HookDecl<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Bare(handler) => Self::Bare(Arc::clone(handler)),
            Self::Filtered { handler, filter } => Self::Filtered {
                handler: Arc::clone(handler),
                filter: filter.clone(),
            },
        }
    }
}

impl<H: ?Sized> HookDecl<H> {
    /// The handler regardless of variant.
    pub fn handler(&self) -> &Arc<H> {
        match self {
            Self::Bare(h) => h,
            Self::Filtered { handler, .. } => handler,
        }
    }

    /// The filter spec, when declared.
    pub fn filter(&self) -> Option<&FilterSpec> {
        match self {
            Self::Bare(_) => None,
            Self::Filtered { filter, .. } => Some(filter),
        }
    }
}

impl<H: ?Sized> fmt::Debug for HookDecl<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(_) => f.write_str("HookDecl::Bare"),
            Self::Filtered { filter, .. } => {
                f.debug_struct("HookDecl::Filtered").field("filter", filter).finish()
            }
        }
    }
}

/// A transform declaration. Transform hooks carry two independent
/// filter specs: one over ids, one over source text.
#[derive(Clone)]
pub enum TransformDecl {
    /// A handler with no filters.
    Bare(Arc<dyn TransformHook>),
    /// A handler gated by id and/or code filters.
    Filtered {
        /// The handler.
        handler: Arc<dyn TransformHook>,
        /// Filter over module ids.
        id: Option<FilterSpec>,
        /// Filter over source text.
        code: Option<FilterSpec>,
    },
}

impl TransformDecl {
    /// The handler regardless of variant.
    pub fn handler(&self) -> &Arc<dyn TransformHook> {
        match self {
            Self::Bare(h) => h,
            Self::Filtered { handler, .. } => handler,
        }
    }
}

impl fmt::Debug for TransformDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bare(_) => f.write_str("TransformDecl::Bare"),
            Self::Filtered { id, code, .. } => f
                .debug_struct("TransformDecl::Filtered")
                .field("id", id)
                .field("code", code)
                .finish(),
        }
    }
}

/// A synchronous id predicate (`load_include` / `transform_include`).
pub type IncludePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A declarative plugin: a unique name plus an optional set of hooks.
///
/// Immutable once constructed for a given build; hosts that recreate
/// plugins per incremental rebuild get fresh definitions from the
/// factory each time.
#[derive(Clone, Default)]
pub struct PluginDefinition {
    /// Unique name; used as diagnostic tag and virtual-module
    /// namespace seed.
    pub name: String,
    /// Ordering class.
    pub enforce: Option<Enforce>,
    /// Specifier resolution hook.
    pub resolve_id: Option<HookDecl<dyn ResolveHook>>,
    /// Module loading hook.
    pub load: Option<HookDecl<dyn LoadHook>>,
    /// Convenience id predicate for `load`, AND-ed with its filter.
    pub load_include: Option<IncludePredicate>,
    /// Source transformation hook.
    pub transform: Option<TransformDecl>,
    /// Convenience id predicate for `transform`, AND-ed with its
    /// filters.
    pub transform_include: Option<IncludePredicate>,
    /// Build-start lifecycle hook.
    pub build_start: Option<Arc<dyn LifecycleHook>>,
    /// Build-end lifecycle hook.
    pub build_end: Option<Arc<dyn LifecycleHook>>,
    /// Post-write lifecycle hook.
    pub write_bundle: Option<Arc<dyn LifecycleHook>>,
    /// Watched-file change hook.
    pub watch_change: Option<Arc<dyn WatchChangeHook>>,
}

impl PluginDefinition {
    /// Creates an empty definition with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validates the definition shape. Fails fast with a
    /// configuration error; never silently ignored.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.name.trim().is_empty() {
            return Err(BridgeError::config("plugin name must be non-empty"));
        }
        Ok(())
    }

    /// Which hook kinds this definition declares.
    pub fn declared_hooks(&self) -> Vec<HookKind> {
        let mut kinds = Vec::new();
        if self.resolve_id.is_some() {
            kinds.push(HookKind::ResolveId);
        }
        if self.load.is_some() {
            kinds.push(HookKind::Load);
        }
        if self.transform.is_some() {
            kinds.push(HookKind::Transform);
        }
        if self.build_start.is_some() {
            kinds.push(HookKind::BuildStart);
        }
        if self.build_end.is_some() {
            kinds.push(HookKind::BuildEnd);
        }
        if self.write_bundle.is_some() {
            kinds.push(HookKind::WriteBundle);
        }
        if self.watch_change.is_some() {
            kinds.push(HookKind::WatchChange);
        }
        kinds
    }
}

impl fmt::Debug for PluginDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginDefinition")
            .field("name", &self.name)
            .field("enforce", &self.enforce)
            .field("hooks", &self.declared_hooks())
            .finish()
    }
}

/// Host identity handed to plugin factories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostMeta {
    /// The host build system's name.
    pub framework: String,
    /// The host build system's version.
    pub framework_version: String,
}

impl HostMeta {
    /// Creates host metadata.
    pub fn new(framework: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            framework: framework.into(),
            framework_version: version.into(),
        }
    }
}

/// Builds one or several plugin definitions ("nested plugins") from
/// host metadata. Invoked once per build.
pub trait PluginFactory: Send + Sync {
    /// Produces the definitions, in invocation order.
    fn build(&self, meta: &HostMeta) -> BridgeResult<Vec<PluginDefinition>>;
}

impl<F> PluginFactory for F
where
    F: Fn(&HostMeta) -> BridgeResult<Vec<PluginDefinition>> + Send + Sync,
{
    fn build(&self, meta: &HostMeta) -> BridgeResult<Vec<PluginDefinition>> {
        self(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_name_rejected() {
        let err = PluginDefinition::new("  ").validate().unwrap_err();
        assert_eq!(err.kind, plugbridge_core::ErrorKind::Config);
    }

    #[test]
    fn test_declared_hooks_reflect_definition() {
        let def = PluginDefinition::new("p");
        assert!(def.declared_hooks().is_empty());
        assert_eq!(HookKind::ResolveId.as_str(), "resolve_id");
    }

    #[test]
    fn test_definition_with_trait_object_hooks_clones() {
        use crate::handlers::{ClosureLoad, ClosureResolve};
        use plugbridge_core::Resolution;

        let mut def = PluginDefinition::new("p");
        def.resolve_id = Some(HookDecl::Bare(ClosureResolve::arc(
            |_ctx, _args| async move { Ok(None::<Resolution>) },
        )));
        def.load = Some(HookDecl::Filtered {
            handler: ClosureLoad::arc(|_ctx, _id| async move {
                Ok(None::<crate::handlers::LoadResult>)
            }),
            filter: FilterSpec::default(),
        });
        let copy = def.clone();
        assert!(Arc::ptr_eq(
            def.resolve_id.as_ref().map(|h| h.handler()).unwrap(),
            copy.resolve_id.as_ref().map(|h| h.handler()).unwrap(),
        ));
        assert!(copy.load.as_ref().and_then(|h| h.filter()).is_some());
    }

    #[test]
    fn test_factory_from_closure() {
        let factory = |meta: &HostMeta| {
            Ok(vec![PluginDefinition::new(format!(
                "for-{}",
                meta.framework
            ))])
        };
        let defs = PluginFactory::build(&factory, &HostMeta::new("patternhost", "1.0"))
            .expect("factory");
        assert_eq!(defs[0].name, "for-patternhost");
    }
}
