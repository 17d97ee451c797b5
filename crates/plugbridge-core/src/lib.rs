//! # plugbridge-core
//!
//! Core crate for Plugbridge. Contains the unified error system,
//! module identity and namespace types, diagnostics, watch/emit
//! descriptors, and the build identifier.
//!
//! This crate has **no** internal dependencies on other Plugbridge crates.

pub mod error;
pub mod result;
pub mod types;

pub use error::{BridgeError, ErrorKind, TextPosition};
pub use result::BridgeResult;
pub use types::asset::{AssetSource, EmittedAsset};
pub use types::build::BuildId;
pub use types::diagnostic::{Diagnostic, DiagnosticLevel};
pub use types::module::{ModuleId, Namespace, ResolvedModule, Resolution};
pub use types::watch::WatchEvent;
