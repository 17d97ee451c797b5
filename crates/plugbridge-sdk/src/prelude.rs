//! Everything a plugin author usually needs, in one import.

pub use plugbridge_core::{
    BridgeError, BridgeResult, Diagnostic, DiagnosticLevel, EmittedAsset, Resolution, WatchEvent,
};
pub use plugbridge_filter::{FilterSpec, PatternSource};
pub use plugbridge_plugin::{
    Enforce, HookContext, HookDecl, HookKind, HostMeta, LoadResult, PluginDefinition,
    PluginFactory, ResolveArgs, TransformArgs, TransformDecl, TransformResult,
};
pub use plugbridge_sourcemap::SourceMap;

pub use crate::builder::PluginBuilder;
pub use crate::filters;
