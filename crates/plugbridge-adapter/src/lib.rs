//! # plugbridge-adapter
//!
//! The shared host-adapter core: one pipeline that every concrete
//! host adapter drives. Hosts implement [`HostDriver`] and marshal
//! their native callbacks into [`BuildAdapter`] operations; the
//! pipeline owns hook ordering, namespace routing, the raw-read
//! fallback and sourcemap combination, which keeps plugin-observable
//! behavior identical across hosts.

pub mod driver;
pub mod lifecycle;
pub mod pipeline;
pub mod state;

pub use driver::HostDriver;
pub use pipeline::BuildAdapter;
pub use state::{BuildReport, DeliveredModule, ModuleOutcome, ModuleState};
