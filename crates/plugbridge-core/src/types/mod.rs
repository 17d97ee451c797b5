//! Shared data types used across the Plugbridge crates.

pub mod asset;
pub mod build;
pub mod diagnostic;
pub mod module;
pub mod watch;
