//! Core declarations shared by the layout engine.
//!
//! - Target ABI rules (data model, pointer width, scalar alignment)
//! - Primitives, field types and group members

pub mod abi;
pub mod types;

pub use abi::{AbiRules, DataModel, TargetTriple};
pub use types::{FieldSpec, FieldType, GroupKind, Member, NumClass, Primitive};
