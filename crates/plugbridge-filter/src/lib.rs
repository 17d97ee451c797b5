//! # plugbridge-filter
//!
//! Pure predicate compiler: declarative include/exclude pattern
//! configuration compiled once per plugin into matchers evaluated per
//! module. Provides:
//!
//! - Id filters: glob patterns (anchored to the working directory
//!   captured at compile time) and regular expressions.
//! - Code filters: substring patterns and regular expressions
//!   evaluated against source text.
//! - The combined transform filter with independent id and code
//!   predicates.
//!
//! Compilation is the only fallible step; a malformed pattern fails
//! with a configuration error at compile time, never at match time.
//! Matching is deterministic and side-effect-free.

pub mod engine;
pub mod pattern;
pub mod spec;

pub use engine::{CodeFilter, IdFilter, TransformFilter};
pub use pattern::PatternSource;
pub use spec::FilterSpec;
