//! # adapter-scopehost
//!
//! Plugbridge adapter for hosts that dispatch module loads to loader
//! callbacks registered per scope name. Each plugin is given its own
//! scope; ids outside the shared file scope travel encoded as
//! virtual-id tokens.

pub mod adapter;
pub mod host;

pub use adapter::{ScopeHostAdapter, ScopeHostContext};
pub use host::{
    FILE_SCOPE, ScopeHost, ScopeLoaded, ScopeLoader, ScopeRef, ScopeResolveArgs, ScopeResolver,
};
