//! Unified error types for Plugbridge.
//!
//! All crates map their internal errors into [`BridgeError`] for
//! consistent propagation through the ? operator.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error kind categorization used across the entire workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A malformed filter spec or plugin definition. Raised at
    /// plugin-construction time, never at match time.
    Config,
    /// Invalid source syntax passed to `parse`.
    Parse,
    /// A plugin hook threw, rejected, or collected errors.
    Handler,
    /// A source map could not be decoded or composed.
    Sourcemap,
    /// The host violated an obligation of its driver contract.
    Host,
    /// An I/O error occurred.
    Io,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => write!(f, "CONFIG"),
            Self::Parse => write!(f, "PARSE"),
            Self::Handler => write!(f, "HANDLER"),
            Self::Sourcemap => write!(f, "SOURCEMAP"),
            Self::Host => write!(f, "HOST"),
            Self::Io => write!(f, "IO"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// A line/column position inside a source text, both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPosition {
    /// Zero-based line.
    pub line: u32,
    /// Zero-based column.
    pub column: u32,
}

impl TextPosition {
    /// Position from zero-based line and column.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The unified error used throughout Plugbridge.
///
/// Crate-specific failures are mapped into `BridgeError` using `From`
/// impls or explicit `.map_err()` calls, giving the whole workspace a
/// single error type at its boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct BridgeError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Name of the plugin the failure is attributed to, if any.
    pub plugin: Option<String>,
    /// Source position, for parse errors that carry one.
    pub position: Option<TextPosition>,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl BridgeError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            plugin: None,
            position: None,
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            plugin: None,
            position: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// Create a parse error carrying a source position.
    pub fn parse_at(message: impl Into<String>, position: TextPosition) -> Self {
        let mut err = Self::new(ErrorKind::Parse, message);
        err.position = Some(position);
        err
    }

    /// Create a handler error.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Handler, message)
    }

    /// Create a sourcemap error.
    pub fn sourcemap(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Sourcemap, message)
    }

    /// Create a host-contract error.
    pub fn host(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Host, message)
    }

    /// Attribute this error to a plugin, prefixing the message with
    /// the plugin's name so host-side reporting stays consistent
    /// across hosts.
    pub fn in_plugin(mut self, plugin: impl Into<String>) -> Self {
        let plugin = plugin.into();
        if self.plugin.is_none() {
            self.message = format!("[{plugin}] {}", self.message);
            self.plugin = Some(plugin);
        }
        self
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}
