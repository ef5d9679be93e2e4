//! Typed and dynamic field access over memory regions.

pub mod dynamic;
pub mod field;
pub mod scalar;

pub use field::{Accessor, BytesAccessor, NestedAccessor};
pub use scalar::{Scalar, Value};
