//! # plugbridge
//!
//! Write one declarative transformation plugin and run it, with
//! identical observable behavior, inside several independent host
//! build systems.
//!
//! The facade re-exports the whole workspace surface. Plugin authors
//! usually only need [`sdk::prelude`]; host integrators add the
//! adapter crate for their host.

pub use adapter_dispatchhost as dispatchhost;
pub use adapter_patternhost as patternhost;
pub use adapter_scopehost as scopehost;
pub use plugbridge_adapter as adapter;
pub use plugbridge_core as core;
pub use plugbridge_filter as filter;
pub use plugbridge_plugin as plugin;
pub use plugbridge_sdk as sdk;
pub use plugbridge_sourcemap as sourcemap;

pub use plugbridge_adapter::{BuildAdapter, BuildReport, DeliveredModule, HostDriver, ModuleOutcome};
pub use plugbridge_core::{BridgeError, BridgeResult, BuildId, ErrorKind, ModuleId, Namespace};
pub use plugbridge_plugin::{PluginDefinition, PluginFactory, PluginRegistry};
pub use plugbridge_sdk::{FilterSpec, PluginBuilder};
