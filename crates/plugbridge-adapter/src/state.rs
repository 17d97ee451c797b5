//! Module lifecycle tracking inside a host adapter.

use std::fmt;

use plugbridge_core::{BridgeError, BridgeResult, ResolvedModule};
use plugbridge_sourcemap::SourceMap;
use serde::{Deserialize, Serialize};

/// Phases a module passes through on its way to the host.
///
/// The only legal path is top to bottom; external resolutions stop
/// at `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Nothing known yet.
    Unresolved,
    /// `resolve_id` hooks are being consulted.
    Resolving,
    /// A resolution exists. Terminal for external modules.
    Resolved,
    /// `load` hooks are being consulted.
    Loading,
    /// Source acquired.
    Loaded,
    /// `transform` hooks are running.
    Transforming,
    /// Final source and combined map exist.
    Transformed,
    /// Handed to the host.
    Delivered,
}

impl ModuleState {
    fn rank(self) -> u8 {
        match self {
            Self::Unresolved => 0,
            Self::Resolving => 1,
            Self::Resolved => 2,
            Self::Loading => 3,
            Self::Loaded => 4,
            Self::Transforming => 5,
            Self::Transformed => 6,
            Self::Delivered => 7,
        }
    }

    /// Validates a forward transition.
    pub fn advance(self, next: ModuleState) -> BridgeResult<ModuleState> {
        if next.rank() == self.rank() + 1 {
            Ok(next)
        } else {
            Err(BridgeError::host(format!(
                "illegal module state transition: {self} -> {next}"
            )))
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unresolved => "unresolved",
            Self::Resolving => "resolving",
            Self::Resolved => "resolved",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Transforming => "transforming",
            Self::Transformed => "transformed",
            Self::Delivered => "delivered",
        };
        write!(f, "{name}")
    }
}

/// A module that completed the pipeline.
#[derive(Debug, Clone)]
pub struct DeliveredModule {
    /// The resolution the module was processed under.
    pub resolved: ResolvedModule,
    /// Final source after all transforms.
    pub code: String,
    /// Combined sourcemap across all transform stages, when any
    /// stage produced one.
    pub map: Option<SourceMap>,
}

/// What a whole build produced, as reported by a host adapter.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Delivered modules in processing order.
    pub modules: Vec<DeliveredModule>,
    /// External references handed back to the host untouched.
    pub externals: Vec<ResolvedModule>,
    /// Entry specifiers no resolve hook claimed.
    pub unresolved: Vec<String>,
    /// Assets emitted during the build.
    pub assets: Vec<plugbridge_core::EmittedAsset>,
    /// All diagnostics recorded during the build.
    pub diagnostics: Vec<plugbridge_core::Diagnostic>,
    /// Watch files registered during the build.
    pub watch_files: Vec<String>,
}

/// What running a module through the pipeline produced.
#[derive(Debug, Clone)]
pub enum ModuleOutcome {
    /// No resolve hook claimed the specifier; the host falls back to
    /// its own resolution.
    Unresolved,
    /// An external reference; the host emits it untouched.
    External(ResolvedModule),
    /// A resolution exists but no loader or raw read produced source.
    NoContent(ResolvedModule),
    /// Fully processed source.
    Delivered(DeliveredModule),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_allowed() {
        let state = ModuleState::Unresolved;
        let state = state.advance(ModuleState::Resolving).unwrap();
        let state = state.advance(ModuleState::Resolved).unwrap();
        assert_eq!(state, ModuleState::Resolved);
    }

    #[test]
    fn test_skipping_and_regressing_rejected() {
        assert!(
            ModuleState::Resolved
                .advance(ModuleState::Transforming)
                .is_err()
        );
        assert!(
            ModuleState::Loaded
                .advance(ModuleState::Resolving)
                .is_err()
        );
    }
}
