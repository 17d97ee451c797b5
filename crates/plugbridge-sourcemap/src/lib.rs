//! # plugbridge-sourcemap
//!
//! Source map support for the transform pipeline: the version-3 map
//! model, the base64-VLQ mappings codec, position tracing, and
//! [`combine`], which composes the maps produced by successive
//! load/transform stages into one map traceable to the original
//! source.

pub mod chain;
pub mod decoded;
pub mod map;
pub mod vlq;

pub use chain::combine;
pub use decoded::{DecodedMap, OriginalPosition, Token};
pub use map::SourceMap;
