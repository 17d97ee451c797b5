//! Per-invocation hook contexts and the factory that mints them.

use std::any::Any;
use std::sync::{Arc, Mutex};

use plugbridge_core::{
    BridgeError, BridgeResult, BuildId, Diagnostic, EmittedAsset, ModuleId,
};
use tracing::{debug, warn};

use crate::parser::{ParseOptions, SourceParser, SyntaxTree};

/// Host-specific build state reachable from hook code. Adapters
/// install their own implementation; plugins downcast via `as_any`.
pub trait NativeBuildContext: Send + Sync {
    /// The host framework name.
    fn framework(&self) -> &str;

    /// Downcast support for host-aware plugins.
    fn as_any(&self) -> &dyn Any;
}

struct TestNativeContext;

impl NativeBuildContext for TestNativeContext {
    fn framework(&self) -> &str {
        "test"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ContextInner {
    plugin: String,
    module: Option<ModuleId>,
    build: BuildId,
    parser: Arc<dyn SourceParser>,
    native: Arc<dyn NativeBuildContext>,
    shared: Arc<SharedStores>,
    // Scoped to this invocation; clones share them, sibling contexts
    // from the same factory do not. Keeps one module's collected
    // errors from failing an unrelated in-flight invocation.
    collected_errors: Mutex<Vec<String>>,
    watched: Mutex<Vec<String>>,
}

struct SharedStores {
    watch_files: Mutex<Vec<String>>,
    assets: Mutex<Vec<EmittedAsset>>,
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl SharedStores {
    fn new() -> Self {
        Self {
            watch_files: Mutex::new(Vec::new()),
            assets: Mutex::new(Vec::new()),
            diagnostics: Mutex::new(Vec::new()),
        }
    }
}

/// The context handed to every hook invocation.
///
/// Cheap to clone; clones share the accumulated assets and
/// diagnostics of the build they belong to, plus this invocation's
/// collected errors and watch registrations. Contexts from different
/// builds share nothing.
#[derive(Clone)]
pub struct HookContext {
    inner: Arc<ContextInner>,
}

impl HookContext {
    /// The invoking plugin's name.
    pub fn plugin(&self) -> &str {
        &self.inner.plugin
    }

    /// The module being processed, when the hook has one.
    pub fn module(&self) -> Option<&ModuleId> {
        self.inner.module.as_ref()
    }

    /// The build this context belongs to.
    pub fn build_id(&self) -> BuildId {
        self.inner.build
    }

    /// Registers a file as a rebuild trigger. Append-only; the host
    /// driver sees registrations in insertion order.
    pub fn add_watch_file(&self, path: impl Into<String>) {
        let path = path.into();
        debug!(plugin = %self.inner.plugin, path = %path, "watch file registered");
        if let Ok(mut files) = self.inner.watched.lock() {
            files.push(path.clone());
        }
        if let Ok(mut files) = self.inner.shared.watch_files.lock() {
            files.push(path);
        }
    }

    /// Watch files registered through this invocation's context. The
    /// build-wide list lives on the factory.
    pub fn watch_files(&self) -> Vec<String> {
        self.inner
            .watched
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    /// Emits an artifact into the build output. Assets with neither
    /// a usable name nor content are dropped.
    pub fn emit_file(&self, asset: EmittedAsset) {
        if asset.is_noop() {
            debug!(plugin = %self.inner.plugin, "empty asset ignored");
            return;
        }
        debug!(plugin = %self.inner.plugin, asset = ?asset.output_name(), "asset emitted");
        if let Ok(mut assets) = self.inner.shared.assets.lock() {
            assets.push(asset);
        }
    }

    /// All assets emitted so far in this build.
    pub fn emitted_assets(&self) -> Vec<EmittedAsset> {
        self.inner
            .shared
            .assets
            .lock()
            .map(|assets| assets.clone())
            .unwrap_or_default()
    }

    /// Parses source text with the host's installed parser.
    pub fn parse(&self, code: &str, options: &ParseOptions) -> BridgeResult<SyntaxTree> {
        self.inner.parser.parse(code, options)
    }

    /// Records a warning diagnostic. Never interrupts the build.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(plugin = %self.inner.plugin, "{message}");
        if let Ok(mut diagnostics) = self.inner.shared.diagnostics.lock() {
            diagnostics.push(Diagnostic::warning(&self.inner.plugin, message));
        }
    }

    /// Records an error diagnostic and returns the handler error the
    /// hook should propagate, tagged with the plugin name.
    pub fn error(&self, message: impl Into<String>) -> BridgeError {
        let message = message.into();
        if let Ok(mut collected) = self.inner.collected_errors.lock() {
            collected.push(message.clone());
        }
        if let Ok(mut diagnostics) = self.inner.shared.diagnostics.lock() {
            diagnostics.push(Diagnostic::error(&self.inner.plugin, &message));
        }
        BridgeError::handler(message).in_plugin(&self.inner.plugin)
    }

    /// All diagnostics recorded so far in this build.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner
            .shared
            .diagnostics
            .lock()
            .map(|diagnostics| diagnostics.clone())
            .unwrap_or_default()
    }

    /// Whether this invocation has collected any error.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Number of errors collected through this invocation's context.
    /// Dispatch snapshots this around an invocation to detect errors
    /// the handler collected without propagating. Errors collected by
    /// concurrent invocations for other modules never show up here.
    pub fn error_count(&self) -> usize {
        self.inner
            .collected_errors
            .lock()
            .map(|collected| collected.len())
            .unwrap_or_default()
    }

    /// Messages of this invocation's collected errors after the
    /// first `skip`.
    pub fn errors_since(&self, skip: usize) -> Vec<String> {
        self.inner
            .collected_errors
            .lock()
            .map(|collected| collected.iter().skip(skip).cloned().collect())
            .unwrap_or_default()
    }

    /// The host's native build state.
    pub fn native_build_context(&self) -> &Arc<dyn NativeBuildContext> {
        &self.inner.native
    }
}

impl std::fmt::Debug for HookContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookContext")
            .field("plugin", &self.inner.plugin)
            .field("module", &self.inner.module)
            .field("build", &self.inner.build)
            .finish()
    }
}

/// Mints [`HookContext`] values for a single build.
///
/// One factory per build; contexts from the same factory share the
/// build's watch-file, asset and diagnostic stores.
pub struct ContextFactory {
    build: BuildId,
    parser: Arc<dyn SourceParser>,
    native: Arc<dyn NativeBuildContext>,
    shared: Arc<SharedStores>,
}

impl ContextFactory {
    /// Creates a factory for one build.
    pub fn new(
        build: BuildId,
        parser: Arc<dyn SourceParser>,
        native: Arc<dyn NativeBuildContext>,
    ) -> Self {
        Self {
            build,
            parser,
            native,
            shared: Arc::new(SharedStores::new()),
        }
    }

    /// Factory with a stand-in native context, for exercising hooks
    /// outside a real host.
    pub fn for_tests(build: BuildId, parser: Arc<dyn SourceParser>) -> Self {
        Self::new(build, parser, Arc::new(TestNativeContext))
    }

    /// The build this factory serves.
    pub fn build_id(&self) -> BuildId {
        self.build
    }

    /// All watch files registered across the build so far.
    pub fn watch_files(&self) -> Vec<String> {
        self.shared
            .watch_files
            .lock()
            .map(|files| files.clone())
            .unwrap_or_default()
    }

    /// All assets emitted across the build so far.
    pub fn emitted_assets(&self) -> Vec<EmittedAsset> {
        self.shared
            .assets
            .lock()
            .map(|assets| assets.clone())
            .unwrap_or_default()
    }

    /// All diagnostics recorded across the build so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.shared
            .diagnostics
            .lock()
            .map(|diagnostics| diagnostics.clone())
            .unwrap_or_default()
    }

    /// Mints a context scoped to a plugin and, optionally, a module.
    pub fn create(&self, plugin: impl Into<String>, module: Option<&ModuleId>) -> HookContext {
        HookContext {
            inner: Arc::new(ContextInner {
                plugin: plugin.into(),
                module: module.cloned(),
                build: self.build,
                parser: Arc::clone(&self.parser),
                native: Arc::clone(&self.native),
                shared: Arc::clone(&self.shared),
                collected_errors: Mutex::new(Vec::new()),
                watched: Mutex::new(Vec::new()),
            }),
        }
    }
}
