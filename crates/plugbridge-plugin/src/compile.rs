//! Compilation of declarative plugin definitions into their
//! ready-to-dispatch form.
//!
//! Filters are compiled exactly once here, against the working
//! directory captured at compile time. Dispatch never re-inspects
//! declaration shapes.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use plugbridge_filter::{IdFilter, TransformFilter};

use plugbridge_core::BridgeResult;

use crate::definition::{
    Enforce, HookDecl, IncludePredicate, PluginDefinition, TransformDecl,
};
use crate::handlers::{LifecycleHook, LoadHook, ResolveHook, TransformHook, WatchChangeHook};
use crate::virtual_id::VirtualCodec;

/// A resolve hook with its compiled id filter.
pub struct CompiledResolve {
    /// The handler.
    pub handler: Arc<dyn ResolveHook>,
    /// Filter over specifiers. Empty for bare declarations.
    pub filter: IdFilter,
}

/// A load hook with its compiled id filter.
pub struct CompiledLoad {
    /// The handler.
    pub handler: Arc<dyn LoadHook>,
    /// Filter over module ids. Empty for bare declarations.
    pub filter: IdFilter,
}

/// A transform hook with its compiled id and code filters.
pub struct CompiledTransform {
    /// The handler.
    pub handler: Arc<dyn TransformHook>,
    /// Combined id/code filter. `always` for bare declarations.
    pub filter: TransformFilter,
}

/// A plugin definition after filter compilation and validation.
pub struct CompiledPlugin {
    /// The plugin's unique name.
    pub name: String,
    /// Ordering class.
    pub enforce: Option<Enforce>,
    /// Compiled resolve hook.
    pub resolve: Option<CompiledResolve>,
    /// Compiled load hook.
    pub load: Option<CompiledLoad>,
    /// Convenience predicate AND-ed with the load filter.
    pub load_include: Option<IncludePredicate>,
    /// Compiled transform hook.
    pub transform: Option<CompiledTransform>,
    /// Convenience predicate AND-ed with the transform filters.
    pub transform_include: Option<IncludePredicate>,
    /// Build-start hook.
    pub build_start: Option<Arc<dyn LifecycleHook>>,
    /// Build-end hook.
    pub build_end: Option<Arc<dyn LifecycleHook>>,
    /// Post-write hook.
    pub write_bundle: Option<Arc<dyn LifecycleHook>>,
    /// Watched-file change hook.
    pub watch_change: Option<Arc<dyn WatchChangeHook>>,
    /// The plugin's virtual-module codec.
    pub codec: VirtualCodec,
}

impl CompiledPlugin {
    /// Compiles a definition against the given working directory.
    pub fn compile(def: PluginDefinition, cwd: &Path) -> BridgeResult<Self> {
        def.validate()?;
        let resolve = match def.resolve_id {
            None => None,
            Some(decl) => {
                let filter = match &decl {
                    HookDecl::Bare(_) => IdFilter::compile_in(&Default::default(), cwd)?,
                    HookDecl::Filtered { filter, .. } => IdFilter::compile_in(filter, cwd)?,
                };
                Some(CompiledResolve {
                    handler: Arc::clone(decl.handler()),
                    filter,
                })
            }
        };
        let load = match def.load {
            None => None,
            Some(decl) => {
                let filter = match &decl {
                    HookDecl::Bare(_) => IdFilter::compile_in(&Default::default(), cwd)?,
                    HookDecl::Filtered { filter, .. } => IdFilter::compile_in(filter, cwd)?,
                };
                Some(CompiledLoad {
                    handler: Arc::clone(decl.handler()),
                    filter,
                })
            }
        };
        let transform = match def.transform {
            None => None,
            Some(decl) => {
                let filter = match &decl {
                    TransformDecl::Bare(_) => TransformFilter::always(),
                    TransformDecl::Filtered { id, code, .. } => {
                        TransformFilter::compile(id.as_ref(), code.as_ref(), cwd)?
                    }
                };
                Some(CompiledTransform {
                    handler: Arc::clone(decl.handler()),
                    filter,
                })
            }
        };
        let codec = VirtualCodec::new(&def.name);
        Ok(Self {
            name: def.name,
            enforce: def.enforce,
            resolve,
            load,
            load_include: def.load_include,
            transform,
            transform_include: def.transform_include,
            build_start: def.build_start,
            build_end: def.build_end,
            write_bundle: def.write_bundle,
            watch_change: def.watch_change,
            codec,
        })
    }

    /// Whether the resolve hook should see this specifier.
    pub fn should_resolve(&self, specifier: &str) -> bool {
        match &self.resolve {
            None => false,
            Some(hook) => hook.filter.matches(&normalize(specifier)),
        }
    }

    /// Whether the load hook should see this id.
    pub fn should_load(&self, id: &str) -> bool {
        let Some(hook) = &self.load else {
            return false;
        };
        if let Some(pred) = &self.load_include
            && !pred(id)
        {
            return false;
        }
        hook.filter.matches(&normalize(id))
    }

    /// Whether the transform hook should see this id and source.
    pub fn should_transform(&self, id: &str, code: &str) -> bool {
        let Some(hook) = &self.transform else {
            return false;
        };
        if let Some(pred) = &self.transform_include
            && !pred(id)
        {
            return false;
        }
        hook.filter.matches(&normalize(id), code)
    }

    /// Whether the transform hook might run for this id, judged from
    /// the id alone. Source-dependent filters stay open here.
    pub fn may_transform_id(&self, id: &str) -> bool {
        let Some(hook) = &self.transform else {
            return false;
        };
        if let Some(pred) = &self.transform_include
            && !pred(id)
        {
            return false;
        }
        hook.filter.resolve_id(&normalize(id)) != Some(false)
    }
}

impl fmt::Debug for CompiledPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPlugin")
            .field("name", &self.name)
            .field("enforce", &self.enforce)
            .field("resolve", &self.resolve.is_some())
            .field("load", &self.load.is_some())
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Ids are matched with forward slashes regardless of host platform.
/// The id itself is never rewritten.
fn normalize(id: &str) -> String {
    id.replace('\\', "/")
}
