//! Rust scalars that map one-to-one onto layout primitives.

use std::fmt;

use bytemuck::Pod;
use serde::Serialize;

use crate::core::types::{FieldType, NumClass, Primitive};
use crate::error::{Error, InvalidArgumentError, LayoutError, Result};
use crate::memory::MemoryRegion;

/// A plain-old-data Rust type with the exact width and class of a
/// [`Primitive`].
///
/// Reads and writes go through `bytemuck`, in native byte order, with no
/// widening or narrowing.
pub trait Scalar: Pod + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The primitive this type stands for.
    const PRIMITIVE: Primitive;

    fn into_value(self) -> Value;

    /// Convert a dynamic value, or `None` if it does not fit.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_int_scalar {
    ($($ty:ty => $prim:ident, $variant:ident;)*) => {
        $(
            impl Scalar for $ty {
                const PRIMITIVE: Primitive = Primitive::$prim;

                fn into_value(self) -> Value {
                    Value::$variant(self.into())
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v).ok(),
                        Value::UInt(v) => <$ty>::try_from(*v).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_int_scalar! {
    i8 => I8, Int;
    i16 => I16, Int;
    i32 => I32, Int;
    i64 => I64, Int;
    u8 => U8, UInt;
    u16 => U16, UInt;
    u32 => U32, UInt;
    u64 => U64, UInt;
}

impl Scalar for f32 {
    const PRIMITIVE: Primitive = Primitive::F32;

    fn into_value(self) -> Value {
        Value::Float(self.into())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v as f32),
            Value::Int(v) => Some(*v as f32),
            Value::UInt(v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl Scalar for f64 {
    const PRIMITIVE: Primitive = Primitive::F64;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::UInt(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// A field value whose type is only known at runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bytes(#[serde(serialize_with = "serialize_hex")] Vec<u8>),
    Array(Vec<Value>),
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

impl Value {
    /// Parse a literal for a field of the given type.
    ///
    /// Integers accept decimal, `0x` hex and `0b` binary, with an optional
    /// sign; `true`/`false` are 1 and 0. Byte fields take a hex string.
    /// Array fields take a comma-separated list.
    pub fn parse(literal: &str, field_type: &FieldType) -> Result<Value> {
        let literal = literal.trim();
        let bad = || -> Error {
            InvalidArgumentError::new(format!(
                "`{}` is not a valid {} literal",
                literal, field_type
            ))
            .into()
        };

        match field_type {
            FieldType::Scalar(p) => parse_primitive(literal, *p).ok_or_else(bad),
            FieldType::Array(p, _) => {
                let inner = literal
                    .strip_prefix('[')
                    .and_then(|s| s.strip_suffix(']'))
                    .unwrap_or(literal);
                inner
                    .split(',')
                    .map(|item| parse_primitive(item.trim(), *p).ok_or_else(bad))
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
            FieldType::Bytes(_) => parse_hex(literal).map(Value::Bytes).ok_or_else(bad),
            FieldType::Group(_) => Err(bad()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

fn parse_primitive(text: &str, primitive: Primitive) -> Option<Value> {
    match primitive.class() {
        NumClass::Float => text.parse::<f64>().ok().map(Value::Float),
        NumClass::Signed | NumClass::Unsigned => parse_int(text),
    }
}

fn parse_int(text: &str) -> Option<Value> {
    match text {
        "true" => return Some(Value::UInt(1)),
        "false" => return Some(Value::UInt(0)),
        _ => {}
    }

    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = digits.replace('_', "");
    let magnitude = if let Some(hex_digits) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex_digits, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b") {
        u64::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<u64>().ok()?
    };

    if negative {
        i64::try_from(-i128::from(magnitude)).ok().map(Value::Int)
    } else {
        Some(Value::UInt(magnitude))
    }
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let text = text.strip_prefix("0x").unwrap_or(text);
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();
    hex::decode(cleaned).ok()
}

/// Run `$body` with `$t` bound to the Rust type of a primitive.
macro_rules! with_scalar_type {
    ($prim:expr, $t:ident => $body:expr) => {
        match ($prim.class(), $prim.width()) {
            (NumClass::Signed, 1) => { type $t = i8; Ok($body) }
            (NumClass::Signed, 2) => { type $t = i16; Ok($body) }
            (NumClass::Signed, 4) => { type $t = i32; Ok($body) }
            (NumClass::Signed, 8) => { type $t = i64; Ok($body) }
            (NumClass::Unsigned, 1) => { type $t = u8; Ok($body) }
            (NumClass::Unsigned, 2) => { type $t = u16; Ok($body) }
            (NumClass::Unsigned, 4) => { type $t = u32; Ok($body) }
            (NumClass::Unsigned, 8) => { type $t = u64; Ok($body) }
            (NumClass::Float, 4) => { type $t = f32; Ok($body) }
            (NumClass::Float, 8) => { type $t = f64; Ok($body) }
            (_, width) => Err(Error::from(LayoutError::UnsupportedWidth {
                field: $prim.to_string(),
                kind: "primitive",
                width,
            })),
        }
    };
}

/// Read a primitive of runtime type at a byte offset.
pub(crate) fn read_primitive(region: &MemoryRegion, offset: usize, primitive: Primitive) -> Result<Value> {
    with_scalar_type!(primitive, T => region.read::<T>(offset)?.into_value())
}

/// Write a dynamic value as a primitive of runtime type.
pub(crate) fn write_primitive(
    region: &MemoryRegion,
    offset: usize,
    primitive: Primitive,
    value: &Value,
) -> Result<()> {
    with_scalar_type!(primitive, T => {
        let scalar = T::from_value(value).ok_or_else(|| {
            InvalidArgumentError::new(format!("{} does not fit in {}", value, primitive))
        })?;
        region.write::<T>(offset, scalar)?
    })
}
