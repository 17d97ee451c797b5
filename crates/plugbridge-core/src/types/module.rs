//! Module identity and namespace types.
//!
//! A module id is an opaque string understood by the host: an absolute
//! path, a bare specifier, or a virtual token. The core treats ids as
//! case- and separator-sensitive exactly as the host provides them;
//! separators are normalized to forward slashes solely for pattern
//! comparison, never for the id handed back to hooks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque module identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    /// Create a module id from a host-provided string, verbatim.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id exactly as the host provided it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id with backslashes rewritten to forward slashes.
    ///
    /// Used only when comparing against filter patterns; the original
    /// form is preserved everywhere else.
    pub fn for_matching(&self) -> String {
        self.0.replace('\\', "/")
    }

    /// Whether this id is an absolute, host-native filesystem path
    /// (Unix absolute or a Windows drive-letter path).
    pub fn is_host_absolute(&self) -> bool {
        let s = self.0.as_str();
        if s.starts_with('/') {
            return true;
        }
        let mut chars = s.chars();
        matches!(
            (chars.next(), chars.next(), chars.next()),
            (Some(drive), Some(':'), Some('/' | '\\')) if drive.is_ascii_alphabetic()
        )
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModuleId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A partition of the id space.
///
/// The default partition is real filesystem paths; plugin namespaces
/// route virtual, non-filesystem ids back to their owning plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Real filesystem paths; loadable by any plugin with a matching
    /// filter.
    File,
    /// Owned by the named plugin; loadable only by that plugin.
    Plugin(String),
}

impl Namespace {
    /// The owning plugin's name, if this is a plugin namespace.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::File => None,
            Self::Plugin(name) => Some(name),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Plugin(name) => write!(f, "plugin:{name}"),
        }
    }
}

/// What a `resolve_id` hook returns when it claims a specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The resolved id.
    pub id: String,
    /// Whether the module is external: handed back to the host as an
    /// external reference, never loaded or transformed.
    pub external: bool,
}

impl Resolution {
    /// A non-external resolution.
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: false,
        }
    }

    /// An external resolution.
    pub fn external(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            external: true,
        }
    }
}

impl From<String> for Resolution {
    fn from(id: String) -> Self {
        Self::id(id)
    }
}

impl From<&str> for Resolution {
    fn from(id: &str) -> Self {
        Self::id(id)
    }
}

/// A fully resolved module as tracked by a host adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedModule {
    /// The id subsequent load/transform phases are keyed by. For
    /// virtual modules this is the **original** plugin-owned id, not
    /// the host-routable token.
    pub id: ModuleId,
    /// The namespace the id lives in.
    pub namespace: Namespace,
    /// Whether the module is external (terminal; no load/transform).
    pub external: bool,
    /// The plugin whose `resolve_id` hook produced this resolution,
    /// if any did.
    pub resolved_by: Option<String>,
}

impl ResolvedModule {
    /// A module in the file namespace.
    pub fn file(id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            namespace: Namespace::File,
            external: false,
            resolved_by: None,
        }
    }

    /// A module in a plugin's namespace.
    pub fn virtual_in(id: impl Into<ModuleId>, owner: impl Into<String>) -> Self {
        let owner = owner.into();
        Self {
            id: id.into(),
            namespace: Namespace::Plugin(owner.clone()),
            external: false,
            resolved_by: Some(owner),
        }
    }
}
