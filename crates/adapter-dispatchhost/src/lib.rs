//! # adapter-dispatchhost
//!
//! Plugbridge adapter for hosts that push every hook occasion through
//! a single dispatcher entry point and carry module ids as bare
//! strings. The host flips backslashes on every path, which is
//! exactly the hazard the virtual-id token encoding exists for.

pub mod adapter;
pub mod host;

pub use adapter::{DispatchHostAdapter, DispatchHostContext};
pub use host::{DispatchHost, Dispatcher, HostEvent, HostModuleRecord, HostResponse, normalize_path};
