//! Hook handler traits and closure-based adapters.
//!
//! Every handler is async and receives its invocation context by
//! value (the context is a cheap `Arc` clone), so closure handlers
//! can move both into `'static` futures.

use async_trait::async_trait;
use futures::future::BoxFuture;
use plugbridge_core::{BridgeResult, Resolution, WatchEvent};
use plugbridge_sourcemap::SourceMap;

use crate::context::HookContext;

/// Arguments to a `resolve_id` hook.
///
/// `importer` is `None` exactly when resolving an entry point; hosts
/// that represent entries as empty-string importers are normalized
/// before the handler sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveArgs {
    /// The specifier as written in the importing module.
    pub specifier: String,
    /// The importing module's id, absent for entry points.
    pub importer: Option<String>,
    /// Whether the specifier is a build entry point.
    pub is_entry: bool,
}

/// What a `load` hook produces.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    /// The module's source code.
    pub code: String,
    /// An optional map back to the on-disk (or conceptual) source.
    pub map: Option<SourceMap>,
}

impl From<String> for LoadResult {
    fn from(code: String) -> Self {
        Self { code, map: None }
    }
}

impl From<&str> for LoadResult {
    fn from(code: &str) -> Self {
        Self {
            code: code.to_string(),
            map: None,
        }
    }
}

/// Arguments to a `transform` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformArgs {
    /// The module id being transformed.
    pub id: String,
    /// The previous stage's code.
    pub code: String,
}

/// What a `transform` hook produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    /// The transformed code.
    pub code: String,
    /// A map from the transformed code back to this stage's input.
    pub map: Option<SourceMap>,
}

impl From<String> for TransformResult {
    fn from(code: String) -> Self {
        Self { code, map: None }
    }
}

impl From<&str> for TransformResult {
    fn from(code: &str) -> Self {
        Self {
            code: code.to_string(),
            map: None,
        }
    }
}

/// A `resolve_id` handler. Returning `Ok(None)` defers to the next
/// plugin in declaration order.
#[async_trait]
pub trait ResolveHook: Send + Sync {
    /// Resolves a specifier, or defers.
    async fn resolve(&self, ctx: HookContext, args: ResolveArgs)
    -> BridgeResult<Option<Resolution>>;
}

/// A `load` handler. Returning `Ok(None)` defers.
#[async_trait]
pub trait LoadHook: Send + Sync {
    /// Loads a module id, or defers.
    async fn load(&self, ctx: HookContext, id: String) -> BridgeResult<Option<LoadResult>>;
}

/// A `transform` handler. Returning `Ok(None)` leaves code and map
/// unchanged without stopping the chain.
#[async_trait]
pub trait TransformHook: Send + Sync {
    /// Transforms a module's code, or passes it through.
    async fn transform(
        &self,
        ctx: HookContext,
        args: TransformArgs,
    ) -> BridgeResult<Option<TransformResult>>;
}

/// A lifecycle handler (`build_start`, `build_end`, `write_bundle`).
#[async_trait]
pub trait LifecycleHook: Send + Sync {
    /// Runs the lifecycle phase for one plugin.
    async fn run(&self, ctx: HookContext) -> BridgeResult<()>;
}

/// A `watch_change` handler.
#[async_trait]
pub trait WatchChangeHook: Send + Sync {
    /// Notifies the plugin that a watched file changed.
    async fn on_change(&self, ctx: HookContext, id: String, event: WatchEvent)
    -> BridgeResult<()>;
}

macro_rules! closure_hook {
    (
        $(#[$meta:meta])*
        $name:ident, $hook:ident, $method:ident, ($($arg:ident: $ty:ty),*) -> $out:ty
    ) => {
        $(#[$meta])*
        pub struct $name {
            f: Box<dyn Fn(HookContext, $($ty),*) -> BoxFuture<'static, $out> + Send + Sync>,
        }

        impl $name {
            /// Wraps an async closure.
            pub fn new<F, Fut>(f: F) -> Self
            where
                F: Fn(HookContext, $($ty),*) -> Fut + Send + Sync + 'static,
                Fut: std::future::Future<Output = $out> + Send + 'static,
            {
                Self {
                    f: Box::new(move |ctx, $($arg),*| Box::pin(f(ctx, $($arg),*))),
                }
            }

            /// Wraps an async closure into a shared trait object.
            pub fn arc<F, Fut>(f: F) -> std::sync::Arc<dyn $hook>
            where
                F: Fn(HookContext, $($ty),*) -> Fut + Send + Sync + 'static,
                Fut: std::future::Future<Output = $out> + Send + 'static,
            {
                std::sync::Arc::new(Self::new(f))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name)).finish_non_exhaustive()
            }
        }

        #[async_trait]
        impl $hook for $name {
            async fn $method(&self, ctx: HookContext, $($arg: $ty),*) -> $out {
                (self.f)(ctx, $($arg),*).await
            }
        }
    };
}

closure_hook!(
    /// Closure-based `resolve_id` handler.
    ClosureResolve, ResolveHook, resolve,
    (args: ResolveArgs) -> BridgeResult<Option<Resolution>>
);

closure_hook!(
    /// Closure-based `load` handler.
    ClosureLoad, LoadHook, load,
    (id: String) -> BridgeResult<Option<LoadResult>>
);

closure_hook!(
    /// Closure-based `transform` handler.
    ClosureTransform, TransformHook, transform,
    (args: TransformArgs) -> BridgeResult<Option<TransformResult>>
);

closure_hook!(
    /// Closure-based lifecycle handler.
    ClosureLifecycle, LifecycleHook, run,
    () -> BridgeResult<()>
);

closure_hook!(
    /// Closure-based `watch_change` handler.
    ClosureWatch, WatchChangeHook, on_change,
    (id: String, event: WatchEvent) -> BridgeResult<()>
);
