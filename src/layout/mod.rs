//! Layout registry.
//!
//! Computes byte offsets, sizes and alignment for C structs and unions:
//! - [`compute_layout`] and [`GroupBuilder`] place fields per target rules
//! - [`GroupLayout`] is the immutable result, with offset maps and fingerprints
//! - [`LayoutRegistry`] names groups so they can embed each other

pub mod compute;
pub mod group;
pub mod registry;

pub use compute::{compute_layout, GroupBuilder};
pub use group::{FieldEntry, FieldLayout, GroupLayout, ResolvedField};
pub use registry::LayoutRegistry;
