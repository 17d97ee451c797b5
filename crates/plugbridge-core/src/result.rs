//! Convenience result type alias for Plugbridge.

use crate::error::BridgeError;

/// A specialized `Result` type for Plugbridge operations.
///
/// Defined as a convenience so that every crate does not need to
/// write `Result<T, BridgeError>` explicitly.
pub type BridgeResult<T> = Result<T, BridgeError>;
