//! Scope-owned memory regions.

pub mod region;
pub mod scope;

pub use region::{MemoryRegion, RegionState};
pub use scope::{with_scope, Scope};
