//! The serialized source map v3 model.

use plugbridge_core::BridgeResult;
use serde::{Deserialize, Serialize};

fn version_3() -> u8 {
    3
}

/// A version-3 source map, either produced by a hook or composed by
/// the chainer.
///
/// A map with empty `sources` is an identity map: it carries no
/// position information and is dropped during composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMap {
    /// Always 3.
    #[serde(default = "version_3")]
    pub version: u8,
    /// The generated file this map describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Original source file names.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Embedded original source contents, parallel to `sources`.
    #[serde(
        rename = "sourcesContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Symbol names referenced by mappings.
    #[serde(default)]
    pub names: Vec<String>,
    /// Base64-VLQ encoded mappings.
    #[serde(default)]
    pub mappings: String,
}

impl SourceMap {
    /// The canonical empty map:
    /// `{version: 3, sources: [], names: [], mappings: ""}`.
    pub fn empty() -> Self {
        Self {
            version: 3,
            file: None,
            sources: Vec::new(),
            sources_content: None,
            names: Vec::new(),
            mappings: String::new(),
        }
    }

    /// Whether this map carries no position information.
    pub fn is_identity(&self) -> bool {
        self.sources.is_empty()
    }

    /// Parses a map from its serialized JSON form.
    pub fn from_json(json: &str) -> BridgeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the map to JSON.
    pub fn to_json(&self) -> BridgeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The embedded content for a source index, if any.
    pub fn content_for(&self, source: usize) -> Option<&str> {
        self.sources_content
            .as_ref()?
            .get(source)?
            .as_deref()
    }
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::empty()
    }
}
