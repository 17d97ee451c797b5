//! # adapter-patternhost
//!
//! Plugbridge adapter for hosts with pattern-plus-namespace hook
//! registration. The host has a first-class namespace primitive, so
//! virtual ids travel as (namespace, path) pairs and the token codec
//! is never involved; the observable virtual-module round trip is
//! identical to hosts that do use it.

pub mod adapter;
pub mod host;

pub use adapter::{PatternHostAdapter, PatternHostContext};
pub use host::{
    FILE_NAMESPACE, HostLoadArgs, HostResolveArgs, HostResolveResult, PatternHost,
};
