//! Field and group declarations.
//!
//! These types describe a struct or union the way a C header does: an ordered
//! list of named fields and nameless padding. They carry no offsets; those
//! are computed by [`crate::layout::compute_layout`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::abi::AbiRules;
use crate::layout::GroupLayout;

/// Numeric class of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumClass {
    Signed,
    Unsigned,
    Float,
}

/// A primitive scalar: numeric class plus width in bytes.
///
/// Any width can be declared; only {1, 2, 4, 8} integers and {4, 8} floats
/// survive layout computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Primitive {
    class: NumClass,
    width: usize,
}

impl Primitive {
    pub const I8: Primitive = Primitive::new(NumClass::Signed, 1);
    pub const U8: Primitive = Primitive::new(NumClass::Unsigned, 1);
    pub const I16: Primitive = Primitive::new(NumClass::Signed, 2);
    pub const U16: Primitive = Primitive::new(NumClass::Unsigned, 2);
    pub const I32: Primitive = Primitive::new(NumClass::Signed, 4);
    pub const U32: Primitive = Primitive::new(NumClass::Unsigned, 4);
    pub const I64: Primitive = Primitive::new(NumClass::Signed, 8);
    pub const U64: Primitive = Primitive::new(NumClass::Unsigned, 8);
    pub const F32: Primitive = Primitive::new(NumClass::Float, 4);
    pub const F64: Primitive = Primitive::new(NumClass::Float, 8);

    /// Declare a primitive. Not validated until layout computation.
    pub const fn new(class: NumClass, width: usize) -> Self {
        Primitive { class, width }
    }

    /// Declare an integer primitive.
    pub const fn int(width: usize, signed: bool) -> Self {
        let class = if signed {
            NumClass::Signed
        } else {
            NumClass::Unsigned
        };
        Primitive::new(class, width)
    }

    /// Declare a floating point primitive.
    pub const fn float(width: usize) -> Self {
        Primitive::new(NumClass::Float, width)
    }

    pub fn class(&self) -> NumClass {
        self.class
    }

    /// Width in bytes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the native ABI producer can describe this primitive.
    pub fn is_supported(&self) -> bool {
        match self.class {
            NumClass::Signed | NumClass::Unsigned => matches!(self.width, 1 | 2 | 4 | 8),
            NumClass::Float => matches!(self.width, 4 | 8),
        }
    }

    /// Parse a type name, either the short form (`i32`, `f64`) or a C type
    /// name resolved against the target's data model.
    pub fn parse(s: &str, abi: &AbiRules) -> Option<Self> {
        let s = s.trim();

        // Pointers are opaque addresses of pointer width.
        if s.ends_with('*') {
            return Some(Primitive::int(abi.pointer_width, false));
        }

        let s = s.strip_prefix("const ").unwrap_or(s);

        // C enums are `int` on every supported target
        if s.starts_with("enum ") {
            return Some(Primitive::I32);
        }

        let (is_unsigned, s) = if let Some(stripped) = s.strip_prefix("unsigned ") {
            (true, stripped)
        } else if s == "unsigned" {
            (true, "int")
        } else {
            (false, s)
        };
        let (is_signed, s) = if let Some(stripped) = s.strip_prefix("signed ") {
            (true, stripped)
        } else {
            (false, s)
        };
        let long = abi.data_model.long_width();
        let ptr = abi.pointer_width;

        let primitive = match s {
            "i8" => Primitive::I8,
            "u8" => Primitive::U8,
            "i16" => Primitive::I16,
            "u16" => Primitive::U16,
            "i32" => Primitive::I32,
            "u32" => Primitive::U32,
            "i64" => Primitive::I64,
            "u64" => Primitive::U64,
            "f32" => Primitive::F32,
            "f64" => Primitive::F64,

            "char" if is_unsigned => Primitive::U8,
            "char" if is_signed => Primitive::I8,
            "char" => Primitive::int(1, abi.char_signed),
            "bool" | "_Bool" => Primitive::U8,
            "short" | "short int" => Primitive::int(2, !is_unsigned),
            "int" => Primitive::int(4, !is_unsigned),
            "long" | "long int" => Primitive::int(long, !is_unsigned),
            "long long" | "long long int" => Primitive::int(8, !is_unsigned),
            "float" => Primitive::F32,
            "double" => Primitive::F64,

            "int8_t" => Primitive::I8,
            "int16_t" => Primitive::I16,
            "int32_t" => Primitive::I32,
            "int64_t" => Primitive::I64,
            "uint8_t" => Primitive::U8,
            "uint16_t" => Primitive::U16,
            "uint32_t" => Primitive::U32,
            "uint64_t" => Primitive::U64,

            "size_t" | "uintptr_t" => Primitive::int(ptr, false),
            "ssize_t" | "ptrdiff_t" | "intptr_t" => Primitive::int(ptr, true),

            _ => return None,
        };

        Some(primitive)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.class {
            NumClass::Signed => 'i',
            NumClass::Unsigned => 'u',
            NumClass::Float => 'f',
        };
        write!(f, "{}{}", prefix, self.width * 8)
    }
}

/// Declared type of a named field.
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A single primitive
    Scalar(Primitive),
    /// A fixed-size array of primitives, C `T name[n]`
    Array(Primitive, usize),
    /// An opaque byte sequence, alignment 1
    Bytes(usize),
    /// A struct or union embedded by value
    Group(Arc<GroupLayout>),
}

impl FieldType {
    /// The element primitive of scalar and array fields.
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            FieldType::Scalar(p) | FieldType::Array(p, _) => Some(*p),
            FieldType::Bytes(_) | FieldType::Group(_) => None,
        }
    }

    /// Number of primitive elements (1 for scalars).
    pub fn element_count(&self) -> usize {
        match self {
            FieldType::Scalar(_) => 1,
            FieldType::Array(_, n) | FieldType::Bytes(n) => *n,
            FieldType::Group(_) => 1,
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::Scalar(a), FieldType::Scalar(b)) => a == b,
            (FieldType::Array(a, n), FieldType::Array(b, m)) => a == b && n == m,
            (FieldType::Bytes(n), FieldType::Bytes(m)) => n == m,
            (FieldType::Group(a), FieldType::Group(b)) => a.as_ref() == b.as_ref(),
            _ => false,
        }
    }
}

impl Eq for FieldType {}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(p) => write!(f, "{}", p),
            FieldType::Array(p, n) => write!(f, "{}[{}]", p, n),
            FieldType::Bytes(n) => write!(f, "bytes[{}]", n),
            FieldType::Group(g) => write!(f, "{} {}", g.kind().keyword(), g.name()),
        }
    }
}

/// A named field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
}

impl FieldSpec {
    /// Create a new field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        FieldSpec {
            name: name.into(),
            field_type,
        }
    }
}

/// One member of a group declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// A named field
    Field(FieldSpec),
    /// A nameless gap of the given size, never realigned
    Padding(usize),
}

/// Whether a group is a struct or a union.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    /// C struct: members at increasing, aligned offsets
    #[default]
    #[serde(alias = "sequential")]
    Struct,
    /// C union: all members at offset 0
    #[serde(alias = "overlapping")]
    Union,
}

impl GroupKind {
    /// The C keyword for this kind.
    pub fn keyword(&self) -> &'static str {
        match self {
            GroupKind::Struct => "struct",
            GroupKind::Union => "union",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_parse() {
        let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(Primitive::parse("int", &abi), Some(Primitive::I32));
        assert_eq!(Primitive::parse("unsigned int", &abi), Some(Primitive::U32));
        assert_eq!(Primitive::parse("unsigned", &abi), Some(Primitive::U32));
        assert_eq!(Primitive::parse("int64_t", &abi), Some(Primitive::I64));
        assert_eq!(Primitive::parse("double", &abi), Some(Primitive::F64));
        assert_eq!(Primitive::parse("u16", &abi), Some(Primitive::U16));
        assert_eq!(Primitive::parse("enum zimg_pixel_type_e", &abi), Some(Primitive::I32));
        assert_eq!(Primitive::parse("const char*", &abi), Some(Primitive::U64));
        assert_eq!(Primitive::parse("struct Foo", &abi), None);
    }

    #[test]
    fn test_primitive_parse_data_model() {
        let linux = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        let windows = AbiRules::parse("x86_64-pc-windows-msvc").unwrap();
        assert_eq!(Primitive::parse("long", &linux), Some(Primitive::I64));
        assert_eq!(Primitive::parse("long", &windows), Some(Primitive::I32));
        assert_eq!(Primitive::parse("unsigned long", &windows), Some(Primitive::U32));

        let arm = AbiRules::parse("aarch64-unknown-linux-gnu").unwrap();
        assert_eq!(Primitive::parse("char", &arm), Some(Primitive::U8));
        assert_eq!(Primitive::parse("signed char", &arm), Some(Primitive::I8));
    }

    #[test]
    fn test_primitive_support() {
        assert!(Primitive::I64.is_supported());
        assert!(Primitive::F32.is_supported());
        assert!(!Primitive::int(3, true).is_supported());
        assert!(!Primitive::float(2).is_supported());
        assert!(!Primitive::int(16, false).is_supported());
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::Scalar(Primitive::U32).to_string(), "u32");
        assert_eq!(FieldType::Array(Primitive::I16, 2).to_string(), "i16[2]");
        assert_eq!(FieldType::Bytes(4).to_string(), "bytes[4]");
    }
}
