//! # plugbridge-plugin
//!
//! The author-facing plugin model and everything derived from it:
//!
//! - Plugin definitions with tagged hook declarations (a bare handler
//!   or a handler plus filter, resolved once at compile time)
//! - The hook normalizer, compiling declarations into predicates with
//!   the correct arity per hook kind
//! - The virtual module codec, turning plugin-owned ids into
//!   host-routable tokens
//! - The per-invocation hook context (watch files, emitted assets,
//!   parse, diagnostics, native escape hatch)
//! - The build-scoped plugin registry

pub mod compile;
pub mod context;
pub mod definition;
pub mod handlers;
pub mod parser;
pub mod registry;
pub mod virtual_id;

pub use compile::{CompiledLoad, CompiledPlugin, CompiledResolve, CompiledTransform};
pub use context::{ContextFactory, HookContext, NativeBuildContext};
pub use definition::{
    Enforce, HookDecl, HookKind, HostMeta, IncludePredicate, PluginDefinition, PluginFactory,
    TransformDecl,
};
pub use handlers::{
    ClosureLifecycle, ClosureLoad, ClosureResolve, ClosureTransform, ClosureWatch, LifecycleHook,
    LoadHook, LoadResult, ResolveArgs, ResolveHook, TransformArgs, TransformHook, TransformResult,
    WatchChangeHook,
};
pub use parser::{DefaultParser, ParseOptions, SourceParser, SyntaxKind, SyntaxNode, SyntaxTree};
pub use registry::PluginRegistry;
pub use virtual_id::VirtualCodec;
