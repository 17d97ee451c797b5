//! Fluent construction of plugin definitions from async closures.

use std::future::Future;
use std::sync::Arc;

use plugbridge_core::{BridgeResult, Resolution, WatchEvent};
use plugbridge_filter::FilterSpec;
use plugbridge_plugin::{
    ClosureLifecycle, ClosureLoad, ClosureResolve, ClosureTransform, ClosureWatch, Enforce,
    HookContext, HookDecl, LoadResult, PluginDefinition, ResolveArgs, TransformArgs, TransformDecl,
    TransformResult,
};

/// Builds a [`PluginDefinition`] hook by hook.
///
/// ```
/// use plugbridge_sdk::prelude::*;
///
/// let plugin = PluginBuilder::new("virtual-config")
///     .resolve_id(|_ctx, args: ResolveArgs| async move {
///         Ok((args.specifier == "virtual:config").then(|| Resolution::id("virtual:config")))
///     })
///     .load(|_ctx, id: String| async move {
///         Ok((id == "virtual:config").then(|| LoadResult::from("export const mode = \"dev\"")))
///     })
///     .build()
///     .unwrap();
/// assert_eq!(plugin.name, "virtual-config");
/// ```
#[derive(Debug, Default)]
pub struct PluginBuilder {
    def: PluginDefinition,
}

impl PluginBuilder {
    /// Starts a definition with the given plugin name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: PluginDefinition::new(name),
        }
    }

    /// Sets the ordering class.
    pub fn enforce(mut self, enforce: Enforce) -> Self {
        self.def.enforce = Some(enforce);
        self
    }

    /// Declares an unfiltered `resolve_id` hook.
    pub fn resolve_id<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext, ResolveArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<Option<Resolution>>> + Send + 'static,
    {
        self.def.resolve_id = Some(HookDecl::Bare(ClosureResolve::arc(f)));
        self
    }

    /// Declares a `resolve_id` hook gated by an id filter.
    pub fn resolve_id_filtered<F, Fut>(mut self, filter: impl Into<FilterSpec>, f: F) -> Self
    where
        F: Fn(HookContext, ResolveArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<Option<Resolution>>> + Send + 'static,
    {
        self.def.resolve_id = Some(HookDecl::Filtered {
            handler: ClosureResolve::arc(f),
            filter: filter.into(),
        });
        self
    }

    /// Declares an unfiltered `load` hook.
    pub fn load<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<Option<LoadResult>>> + Send + 'static,
    {
        self.def.load = Some(HookDecl::Bare(ClosureLoad::arc(f)));
        self
    }

    /// Declares a `load` hook gated by an id filter.
    pub fn load_filtered<F, Fut>(mut self, filter: impl Into<FilterSpec>, f: F) -> Self
    where
        F: Fn(HookContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<Option<LoadResult>>> + Send + 'static,
    {
        self.def.load = Some(HookDecl::Filtered {
            handler: ClosureLoad::arc(f),
            filter: filter.into(),
        });
        self
    }

    /// Sets the convenience id predicate AND-ed with the `load`
    /// filter.
    pub fn load_include<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.def.load_include = Some(Arc::new(predicate));
        self
    }

    /// Declares an unfiltered `transform` hook.
    pub fn transform<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext, TransformArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<Option<TransformResult>>> + Send + 'static,
    {
        self.def.transform = Some(TransformDecl::Bare(ClosureTransform::arc(f)));
        self
    }

    /// Declares a `transform` hook gated by independent id and code
    /// filters. Either may be `None`.
    pub fn transform_filtered<F, Fut>(
        mut self,
        id: Option<FilterSpec>,
        code: Option<FilterSpec>,
        f: F,
    ) -> Self
    where
        F: Fn(HookContext, TransformArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<Option<TransformResult>>> + Send + 'static,
    {
        self.def.transform = Some(TransformDecl::Filtered {
            handler: ClosureTransform::arc(f),
            id,
            code,
        });
        self
    }

    /// Sets the convenience id predicate AND-ed with the `transform`
    /// filters.
    pub fn transform_include<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.def.transform_include = Some(Arc::new(predicate));
        self
    }

    /// Declares a `build_start` hook.
    pub fn build_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<()>> + Send + 'static,
    {
        self.def.build_start = Some(ClosureLifecycle::arc(f));
        self
    }

    /// Declares a `build_end` hook.
    pub fn build_end<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<()>> + Send + 'static,
    {
        self.def.build_end = Some(ClosureLifecycle::arc(f));
        self
    }

    /// Declares a `write_bundle` hook.
    pub fn write_bundle<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<()>> + Send + 'static,
    {
        self.def.write_bundle = Some(ClosureLifecycle::arc(f));
        self
    }

    /// Declares a `watch_change` hook.
    pub fn watch_change<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(HookContext, String, WatchEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = BridgeResult<()>> + Send + 'static,
    {
        self.def.watch_change = Some(ClosureWatch::arc(f));
        self
    }

    /// Validates and returns the finished definition.
    pub fn build(self) -> BridgeResult<PluginDefinition> {
        self.def.validate()?;
        Ok(self.def)
    }
}

#[cfg(test)]
mod tests {
    use plugbridge_core::ErrorKind;
    use plugbridge_plugin::HookKind;

    use super::*;

    #[test]
    fn test_builder_declares_hooks() {
        let def = PluginBuilder::new("styles")
            .enforce(Enforce::Pre)
            .transform_filtered(
                Some("**/*.css".into()),
                None,
                |_ctx, args: TransformArgs| async move { Ok(Some(TransformResult::from(args.code))) },
            )
            .build_end(|_ctx| async move { Ok(()) })
            .build()
            .expect("definition");
        assert_eq!(def.name, "styles");
        assert_eq!(def.enforce, Some(Enforce::Pre));
        assert_eq!(
            def.declared_hooks(),
            vec![HookKind::Transform, HookKind::BuildEnd]
        );
    }

    #[test]
    fn test_builder_rejects_blank_name() {
        let err = PluginBuilder::new(" ").build().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn test_filtered_hooks_carry_their_specs() {
        let def = PluginBuilder::new("virtuals")
            .resolve_id_filtered("virtual-*", |_ctx, _args: ResolveArgs| async move { Ok(None) })
            .load_filtered("virtual-*", |_ctx, _id: String| async move { Ok(None) })
            .build()
            .expect("definition");
        let filter = def.resolve_id.as_ref().and_then(HookDecl::filter);
        assert!(filter.is_some_and(|f| !f.include.is_empty()));
    }
}
