//! Property-based tests for layout invariants and region access under
//! arbitrary field lists, counts and indices.

use harbour_layout::core::{AbiRules, FieldType, NumClass, Primitive};
use harbour_layout::error::Error;
use harbour_layout::layout::GroupBuilder;
use harbour_layout::memory::Scope;
use harbour_layout::Value;
use proptest::prelude::*;

const TARGETS: &[&str] = &[
    "x86_64-unknown-linux-gnu",
    "x86_64-pc-windows-msvc",
    "i686-unknown-linux-gnu",
    "aarch64-apple-darwin",
];

fn primitive() -> impl Strategy<Value = Primitive> {
    prop_oneof![
        Just(Primitive::I8),
        Just(Primitive::U8),
        Just(Primitive::I16),
        Just(Primitive::U16),
        Just(Primitive::I32),
        Just(Primitive::U32),
        Just(Primitive::I64),
        Just(Primitive::U64),
        Just(Primitive::F32),
        Just(Primitive::F64),
    ]
}

/// A member: scalar, array, bytes or padding.
#[derive(Debug, Clone)]
enum Decl {
    Scalar(Primitive),
    Array(Primitive, usize),
    Bytes(usize),
    Padding(usize),
}

fn decl() -> impl Strategy<Value = Decl> {
    prop_oneof![
        4 => primitive().prop_map(Decl::Scalar),
        2 => (primitive(), 1usize..5).prop_map(|(p, n)| Decl::Array(p, n)),
        1 => (1usize..9).prop_map(Decl::Bytes),
        1 => (1usize..8).prop_map(Decl::Padding),
    ]
}

fn builder(union: bool, decls: &[Decl]) -> GroupBuilder {
    let mut builder = if union {
        GroupBuilder::union("g")
    } else {
        GroupBuilder::structure("g")
    };
    for (i, decl) in decls.iter().enumerate() {
        let name = format!("f{}", i);
        builder = match decl {
            Decl::Scalar(p) => builder.field(name, *p),
            Decl::Array(p, n) => builder.array(name, *p, *n),
            Decl::Bytes(n) => builder.bytes(name, *n),
            Decl::Padding(n) => builder.padding(*n),
        };
    }
    builder
}

fn has_field(decls: &[Decl]) -> bool {
    decls.iter().any(|d| !matches!(d, Decl::Padding(_)))
}

// ---------------------------------------------------------------------------
// Layout invariants
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn test_struct_fields_are_aligned_ordered_and_disjoint(
        decls in prop::collection::vec(decl(), 1..12),
        target in prop::sample::select(TARGETS),
    ) {
        prop_assume!(has_field(&decls));
        let abi = AbiRules::parse(target).unwrap();
        let layout = builder(false, &decls).build(&abi).unwrap();

        let mut end = 0;
        for field in layout.fields() {
            prop_assert_eq!(field.offset % field.align, 0);
            prop_assert!(field.offset >= end);
            end = field.offset + field.size;
        }
        prop_assert!(end <= layout.size());
        prop_assert_eq!(layout.size() % layout.align(), 0);
    }

    #[test]
    fn test_union_members_start_at_zero(
        decls in prop::collection::vec(decl(), 1..8),
        target in prop::sample::select(TARGETS),
    ) {
        let fields: Vec<Decl> = decls
            .into_iter()
            .filter(|d| !matches!(d, Decl::Padding(_)))
            .collect();
        prop_assume!(!fields.is_empty());
        let abi = AbiRules::parse(target).unwrap();
        let layout = builder(true, &fields).build(&abi).unwrap();

        let widest = layout.fields().iter().map(|f| f.size).max().unwrap();
        for field in layout.fields() {
            prop_assert_eq!(field.offset, 0);
        }
        prop_assert!(layout.size() >= widest);
        prop_assert!(layout.size() - widest < layout.align());
        prop_assert_eq!(layout.size() % layout.align(), 0);
    }

    #[test]
    fn test_same_declaration_same_fingerprint(
        decls in prop::collection::vec(decl(), 1..10),
        target in prop::sample::select(TARGETS),
    ) {
        prop_assume!(has_field(&decls));
        let abi = AbiRules::parse(target).unwrap();
        let first = builder(false, &decls).build(&abi).unwrap();
        let second = builder(false, &decls).build(&abi).unwrap();
        prop_assert_eq!(first.fingerprint(), second.fingerprint());
        prop_assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Region access
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn test_indexed_access_matches_manual_offset(
        decls in prop::collection::vec(decl(), 1..8),
        count in 1usize..6,
        seed in any::<u64>(),
    ) {
        prop_assume!(has_field(&decls));
        let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        let layout = builder(false, &decls).build(&abi).unwrap();
        let scope = Scope::new();
        let region = scope.allocate_array(&layout, count).unwrap();

        let index = (seed as usize) % count;
        let byte = (seed as u8).max(1);
        let element = region.element(index).unwrap();
        for field in layout.fields() {
            if field.field_type == FieldType::Scalar(Primitive::U8) {
                let accessor = layout.scalar::<u8>(&field.name).unwrap();
                accessor.set_indexed(&region, index, byte).unwrap();
                prop_assert_eq!(accessor.get_at(&region, index * layout.size()).unwrap(), byte);
            } else if let FieldType::Scalar(primitive) = field.field_type {
                let value = match primitive.class() {
                    NumClass::Signed => Value::Int(i64::from(byte as i8)),
                    NumClass::Unsigned | NumClass::Float => Value::UInt(u64::from(byte)),
                };
                layout
                    .write_value_indexed(&region, index, &field.name, &value)
                    .unwrap();
            } else {
                continue;
            }

            let manual = region
                .read_bytes(index * layout.size() + field.offset, field.size)
                .unwrap();
            let sliced = element.read_bytes(field.offset, field.size).unwrap();
            prop_assert_eq!(&manual, &sliced);
            prop_assert!(manual.iter().any(|&b| b != 0));
        }
    }

    #[test]
    fn test_index_at_or_past_count_is_bounds_error(count in 0usize..5, extra in 0usize..4) {
        let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        let layout = GroupBuilder::structure("pair")
            .field("a", Primitive::I32)
            .field("b", Primitive::I64)
            .build(&abi)
            .unwrap();
        let scope = Scope::new();
        let region = scope.allocate_array(&layout, count).unwrap();
        let b = layout.scalar::<i64>("b").unwrap();

        let result = b.get_indexed(&region, count + extra);
        prop_assert!(matches!(result, Err(Error::Bounds(_))));
    }

    #[test]
    fn test_scalar_roundtrip_at_any_element(
        value in any::<i64>(),
        count in 1usize..8,
        pick in any::<usize>(),
    ) {
        let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
        let layout = GroupBuilder::structure("pair")
            .field("a", Primitive::I8)
            .field("b", Primitive::I64)
            .build(&abi)
            .unwrap();
        let scope = Scope::new();
        let region = scope.allocate_array(&layout, count).unwrap();
        let b = layout.scalar::<i64>("b").unwrap();

        let index = pick % count;
        b.set_indexed(&region, index, value).unwrap();
        prop_assert_eq!(b.get_indexed(&region, index).unwrap(), value);
        for other in (0..count).filter(|&i| i != index) {
            prop_assert_eq!(b.get_indexed(&region, other).unwrap(), 0);
        }
    }
}

// ---------------------------------------------------------------------------
// Round trip per primitive
// ---------------------------------------------------------------------------

/// `struct { uint8_t tag; T value; }` laid out for x86_64.
fn tagged_scalar(primitive: Primitive) -> std::sync::Arc<harbour_layout::GroupLayout> {
    let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
    GroupBuilder::structure("tagged_scalar")
        .field("tag", Primitive::U8)
        .field("value", primitive)
        .build(&abi)
        .unwrap()
}

macro_rules! roundtrip_tests {
    ($($name:ident: $ty:ty => $prim:ident, $strategy:expr, $bits:expr;)*) => {
        proptest! {
            $(
                #[test]
                fn $name(value in $strategy, count in 2usize..6, pick in any::<usize>()) {
                    let layout = tagged_scalar(Primitive::$prim);
                    let scope = Scope::new();
                    let region = scope.allocate_array(&layout, count).unwrap();
                    let accessor = layout.scalar::<$ty>("value").unwrap();
                    let tag = layout.scalar::<u8>("tag").unwrap();
                    let bits = $bits;

                    let index = 1 + pick % (count - 1);
                    tag.set_indexed(&region, index, 0xff).unwrap();
                    accessor.set_indexed(&region, index, value).unwrap();

                    let read: $ty = accessor.get_indexed(&region, index).unwrap();
                    prop_assert_eq!(bits(read), bits(value));
                    prop_assert_eq!(tag.get_indexed(&region, index).unwrap(), 0xff);
                    prop_assert_eq!(bits(accessor.get_indexed(&region, 0).unwrap()), bits(<$ty>::default()));
                }
            )*
        }
    };
}

fn f32_values() -> impl Strategy<Value = f32> {
    prop_oneof![
        any::<u32>().prop_map(f32::from_bits),
        Just(-0.0f32),
        Just(f32::NAN),
        Just(f32::INFINITY),
        Just(f32::MIN_POSITIVE / 2.0),
    ]
}

fn f64_values() -> impl Strategy<Value = f64> {
    prop_oneof![
        any::<u64>().prop_map(f64::from_bits),
        Just(-0.0f64),
        Just(f64::NAN),
        Just(f64::NEG_INFINITY),
        Just(f64::MIN_POSITIVE / 2.0),
    ]
}

roundtrip_tests! {
    test_roundtrip_i8: i8 => I8, any::<i8>(), |v: i8| v;
    test_roundtrip_i16: i16 => I16, any::<i16>(), |v: i16| v;
    test_roundtrip_i32: i32 => I32, any::<i32>(), |v: i32| v;
    test_roundtrip_i64: i64 => I64, any::<i64>(), |v: i64| v;
    test_roundtrip_u8: u8 => U8, any::<u8>(), |v: u8| v;
    test_roundtrip_u16: u16 => U16, any::<u16>(), |v: u16| v;
    test_roundtrip_u32: u32 => U32, any::<u32>(), |v: u32| v;
    test_roundtrip_u64: u64 => U64, any::<u64>(), |v: u64| v;
    test_roundtrip_f32: f32 => F32, f32_values(), |v: f32| v.to_bits();
    test_roundtrip_f64: f64 => F64, f64_values(), |v: f64| v.to_bits();
}

#[test]
fn test_roundtrip_integer_extremes() {
    let scope = Scope::new();

    let layout = tagged_scalar(Primitive::U64);
    let region = scope.allocate_array(&layout, 3).unwrap();
    let value = layout.scalar::<u64>("value").unwrap();
    value.set_indexed(&region, 2, u64::MAX).unwrap();
    assert_eq!(value.get_indexed(&region, 2).unwrap(), u64::MAX);

    let layout = tagged_scalar(Primitive::I16);
    let region = scope.allocate_array(&layout, 3).unwrap();
    let value = layout.scalar::<i16>("value").unwrap();
    value.set_indexed(&region, 1, i16::MIN).unwrap();
    assert_eq!(value.get_indexed(&region, 1).unwrap(), i16::MIN);
    assert_eq!(region.read_bytes(layout.size() + 2, 2).unwrap(), i16::MIN.to_ne_bytes().to_vec());
}
