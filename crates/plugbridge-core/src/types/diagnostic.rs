//! Per-invocation diagnostics collected through `error()` / `warn()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    /// Forwarded to the host's warning channel; never aborts a build.
    Warning,
    /// An invocation that collects at least one error is treated as
    /// failed even if its handler returned a value.
    Error,
}

/// A diagnostic pushed by a hook via its context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub level: DiagnosticLevel,
    /// Plugin the diagnostic originated from.
    pub plugin: String,
    /// Message text.
    pub message: String,
    /// When the diagnostic was collected.
    pub timestamp: DateTime<Utc>,
}

impl Diagnostic {
    /// Create a warning diagnostic.
    pub fn warning(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            plugin: plugin.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an error diagnostic.
    pub fn error(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            plugin: plugin.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this diagnostic is an error.
    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert!(Diagnostic::error("p", "boom").is_error());
        assert!(!Diagnostic::warning("p", "hmm").is_error());
    }
}
