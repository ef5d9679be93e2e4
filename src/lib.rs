//! harbour-layout - C ABI struct layouts over scope-owned memory
//!
//! This crate computes the layout of native C structs and unions for a
//! chosen target, allocates zeroed memory for them inside release scopes,
//! and reads and writes fields through typed, bounds-checked accessors.
//!
//! ```
//! use harbour_layout::core::{AbiRules, Primitive};
//! use harbour_layout::layout::GroupBuilder;
//! use harbour_layout::memory::with_scope;
//!
//! let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
//! let pair = GroupBuilder::structure("pair")
//!     .field("a", Primitive::I32)
//!     .field("b", Primitive::F64)
//!     .build(&abi)
//!     .unwrap();
//! assert_eq!(pair.size(), 16);
//!
//! let b = pair.scalar::<f64>("b").unwrap();
//! with_scope(|scope| {
//!     let region = scope.allocate_array(&pair, 4)?;
//!     b.set_indexed(&region, 3, 2.5)?;
//!     assert_eq!(b.get_indexed(&region, 3)?, 2.5);
//!     Ok::<_, harbour_layout::Error>(())
//! })
//! .unwrap();
//! ```

pub mod access;
pub mod core;
pub mod error;
pub mod layout;
pub mod memory;
pub mod schema;
pub mod util;

pub use access::{Accessor, BytesAccessor, NestedAccessor, Scalar, Value};
pub use error::{BoundsError, Error, InvalidArgumentError, LayoutError, Result, UseAfterFreeError};
pub use layout::{GroupBuilder, GroupLayout, LayoutRegistry};
pub use memory::{with_scope, MemoryRegion, Scope};
pub use schema::Schema;
