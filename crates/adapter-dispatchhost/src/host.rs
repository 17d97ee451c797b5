//! An in-memory single-dispatcher host.
//!
//! The protocol: the host owns the module loop and pushes every hook
//! occasion into one `dispatch` entry point as a [`HostEvent`]. Ids
//! are plain strings with no namespace attached, and the host
//! normalizes backslashes to forward slashes on every resource path
//! crossing its boundary.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use plugbridge_core::{BridgeError, BridgeResult, Diagnostic, EmittedAsset, WatchEvent};
use serde::{Deserialize, Serialize};

/// An occasion the host hands to its dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A specifier needs resolution.
    Resolve {
        /// The specifier as written.
        specifier: String,
        /// The importing module; empty when this is an entry.
        importer: String,
        /// Whether this is a build entry.
        is_entry: bool,
    },
    /// A resolved id needs content.
    Load {
        /// The id, as the host carries it.
        id: String,
    },
    /// Loaded content needs transformation.
    Transform {
        /// The id, as the host carries it.
        id: String,
        /// The content to transform.
        code: String,
    },
    /// The build is starting.
    BuildStart,
    /// Module processing finished.
    BuildEnd,
    /// Artifacts are about to be finalized.
    WriteBundle,
    /// A watched file changed.
    WatchChange {
        /// The changed file.
        id: String,
        /// What happened to it.
        event: WatchEvent,
    },
}

/// The dispatcher's answer to one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostResponse {
    /// Answer to `Resolve`.
    Resolved {
        /// The resolved id, or `None` when no plugin claimed it.
        id: Option<String>,
        /// Whether the module is external.
        external: bool,
    },
    /// Answer to `Load`. `None` when no plugin produced content.
    Loaded {
        /// The content.
        code: Option<String>,
        /// Sourcemap JSON, when the loader produced one.
        map: Option<String>,
    },
    /// Answer to `Transform`.
    Transformed {
        /// The final content.
        code: String,
        /// Combined sourcemap JSON, when any stage produced one.
        map: Option<String>,
    },
    /// Answer to lifecycle events.
    Done,
}

/// The single entry point the host pushes events through.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Handles one event.
    async fn dispatch(&self, event: HostEvent) -> BridgeResult<HostResponse>;
}

/// How one entry fared in the host's module loop.
#[derive(Debug, Clone, PartialEq)]
pub enum HostModuleRecord {
    /// No plugin resolved the specifier.
    Unresolved,
    /// Resolved external; the id as the host carries it.
    External(String),
    /// Resolved but nothing produced content.
    NoContent(String),
    /// Fully processed.
    Processed {
        /// The id as the host carries it (virtual ids stay encoded).
        id: String,
        /// Final content.
        code: String,
        /// Sourcemap JSON.
        map: Option<String>,
    },
}

/// The host: a file store, an artifact sink and the module loop.
#[derive(Default)]
pub struct DispatchHost {
    files: RwLock<HashMap<String, String>>,
    artifacts: RwLock<Vec<EmittedAsset>>,
    warnings: RwLock<Vec<Diagnostic>>,
}

/// The normalization the host applies to every resource path.
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

impl DispatchHost {
    /// An empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file. The path is normalized like every other path.
    pub fn add_file(&self, path: impl Into<String>, content: impl Into<String>) {
        if let Ok(mut files) = self.files.write() {
            files.insert(normalize_path(&path.into()), content.into());
        }
    }

    /// Reads a seeded file by normalized path.
    pub fn read_file(&self, path: &str) -> Option<String> {
        self.files.read().ok()?.get(&normalize_path(path)).cloned()
    }

    /// Stores build artifacts.
    pub fn store_artifacts(&self, assets: &[EmittedAsset]) {
        if let Ok(mut artifacts) = self.artifacts.write() {
            artifacts.extend_from_slice(assets);
        }
    }

    /// Artifacts stored so far.
    pub fn artifacts(&self) -> Vec<EmittedAsset> {
        self.artifacts.read().map(|a| a.clone()).unwrap_or_default()
    }

    /// Records a warning surfaced by the adapter.
    pub fn report_warning(&self, diagnostic: &Diagnostic) {
        if let Ok(mut warnings) = self.warnings.write() {
            warnings.push(diagnostic.clone());
        }
    }

    /// Warnings reported so far.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.warnings.read().map(|w| w.clone()).unwrap_or_default()
    }

    /// Runs the host's module loop over the given entries, feeding
    /// every occasion through `dispatcher`.
    pub async fn run_build(
        &self,
        dispatcher: &dyn Dispatcher,
        entries: &[&str],
    ) -> BridgeResult<Vec<(String, HostModuleRecord)>> {
        dispatcher.dispatch(HostEvent::BuildStart).await?;
        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = self.run_entry(dispatcher, entry).await?;
            records.push((entry.to_string(), record));
        }
        dispatcher.dispatch(HostEvent::BuildEnd).await?;
        dispatcher.dispatch(HostEvent::WriteBundle).await?;
        Ok(records)
    }

    async fn run_entry(
        &self,
        dispatcher: &dyn Dispatcher,
        entry: &str,
    ) -> BridgeResult<HostModuleRecord> {
        let response = dispatcher
            .dispatch(HostEvent::Resolve {
                specifier: normalize_path(entry),
                importer: String::new(),
                is_entry: true,
            })
            .await?;
        let HostResponse::Resolved { id, external } = response else {
            return Err(unexpected_response("resolve", &response));
        };
        let Some(id) = id else {
            return Ok(HostModuleRecord::Unresolved);
        };
        let id = normalize_path(&id);
        if external {
            return Ok(HostModuleRecord::External(id));
        }
        let response = dispatcher.dispatch(HostEvent::Load { id: id.clone() }).await?;
        let HostResponse::Loaded { code, .. } = response else {
            return Err(unexpected_response("load", &response));
        };
        let Some(code) = code else {
            return Ok(HostModuleRecord::NoContent(id));
        };
        let response = dispatcher
            .dispatch(HostEvent::Transform {
                id: id.clone(),
                code,
            })
            .await?;
        let HostResponse::Transformed { code, map } = response else {
            return Err(unexpected_response("transform", &response));
        };
        Ok(HostModuleRecord::Processed { id, code, map })
    }
}

fn unexpected_response(phase: &str, response: &HostResponse) -> BridgeError {
    BridgeError::host(format!("unexpected {phase} response: {response:?}"))
}
