//! The seam between the shared pipeline and a concrete host.

use std::sync::Arc;

use async_trait::async_trait;
use plugbridge_core::{BridgeResult, Diagnostic, EmittedAsset};
use plugbridge_plugin::{HostMeta, NativeBuildContext};

/// Host capabilities the shared pipeline depends on.
///
/// One implementation per host adapter. Everything behavioral lives
/// in the pipeline; drivers only move bytes and expose host identity.
#[async_trait]
pub trait HostDriver: Send + Sync {
    /// The host's name and version.
    fn meta(&self) -> HostMeta;

    /// Whether the host has a first-class virtual-module namespace.
    /// Hosts without one receive codec-encoded tokens instead.
    fn has_native_virtual_namespace(&self) -> bool {
        false
    }

    /// Reads a module's raw content from the host's filesystem view.
    /// `None` when the id does not denote readable content.
    async fn read_raw(&self, id: &str) -> BridgeResult<Option<String>>;

    /// Persists emitted assets into the host's artifact store.
    /// Returns only once artifacts are durably written.
    async fn write_artifacts(&self, assets: &[EmittedAsset]) -> BridgeResult<()>;

    /// Forwards a warning diagnostic to the host's reporting channel.
    fn forward_warning(&self, diagnostic: &Diagnostic);

    /// The host's native build state, surfaced to hooks through
    /// `HookContext::native_build_context`.
    fn native_context(&self) -> Arc<dyn NativeBuildContext>;
}
