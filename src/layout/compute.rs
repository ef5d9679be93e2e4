//! Struct and union layout computation.
//!
//! Mirrors what a C compiler does without `#pragma pack`: every member is
//! placed at the next offset that satisfies its alignment, explicit padding
//! is taken verbatim, and the total size is rounded up to the group's own
//! alignment. Unions place every member at offset 0.

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::abi::AbiRules;
use crate::core::types::{FieldSpec, FieldType, GroupKind, Member, NumClass, Primitive};
use crate::error::LayoutError;
use crate::layout::group::{FieldLayout, GroupLayout};

/// Compute the layout of a group.
///
/// Pure: the same members and rules always produce the same layout, so a
/// binding generator and its consumer agree byte for byte.
pub fn compute_layout(
    name: &str,
    kind: GroupKind,
    members: &[Member],
    abi: &AbiRules,
) -> Result<GroupLayout, LayoutError> {
    if members.is_empty() {
        return Err(LayoutError::EmptyGroup {
            group: name.to_string(),
        });
    }

    let target = abi.describe();
    let overflow = || LayoutError::Overflow {
        group: name.to_string(),
    };

    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    let mut cursor = 0usize;
    let mut max_align = 1usize;

    for member in members {
        match member {
            Member::Padding(0) => {
                return Err(LayoutError::ZeroLength {
                    group: name.to_string(),
                    field: "<padding>".to_string(),
                });
            }
            Member::Padding(len) => match kind {
                GroupKind::Struct => cursor = cursor.checked_add(*len).ok_or_else(overflow)?,
                GroupKind::Union => cursor = cursor.max(*len),
            },
            Member::Field(spec) => {
                if spec.name.is_empty() {
                    return Err(LayoutError::EmptyName {
                        group: name.to_string(),
                    });
                }
                if !seen.insert(spec.name.as_str()) {
                    return Err(LayoutError::DuplicateField {
                        group: name.to_string(),
                        field: spec.name.clone(),
                    });
                }

                let (size, align) = measure(name, &target, spec, abi)?;
                max_align = max_align.max(align);

                let offset = match kind {
                    GroupKind::Struct => align_to(cursor, align).ok_or_else(overflow)?,
                    GroupKind::Union => 0,
                };
                let end = offset.checked_add(size).ok_or_else(overflow)?;
                cursor = match kind {
                    GroupKind::Struct => end,
                    GroupKind::Union => cursor.max(end),
                };

                fields.push(FieldLayout {
                    name: spec.name.clone(),
                    field_type: spec.field_type.clone(),
                    offset,
                    size,
                    align,
                });
            }
        }
    }

    let size = align_to(cursor, max_align).ok_or_else(overflow)?;

    tracing::debug!(
        "computed {} {}: size {}, align {}, {} fields",
        kind.keyword(),
        name,
        size,
        max_align,
        fields.len()
    );

    Ok(GroupLayout {
        name: name.to_string(),
        kind,
        size,
        align: max_align,
        fields,
        target,
    })
}

/// Size and alignment of one field under the given rules.
fn measure(
    group: &str,
    target: &str,
    spec: &FieldSpec,
    abi: &AbiRules,
) -> Result<(usize, usize), LayoutError> {
    let zero_length = || LayoutError::ZeroLength {
        group: group.to_string(),
        field: spec.name.clone(),
    };

    match &spec.field_type {
        FieldType::Scalar(p) => {
            check_primitive(&spec.name, *p)?;
            Ok((p.width(), abi.primitive_align(*p)))
        }
        FieldType::Array(p, count) => {
            check_primitive(&spec.name, *p)?;
            if *count == 0 {
                return Err(zero_length());
            }
            let size = p
                .width()
                .checked_mul(*count)
                .ok_or_else(|| LayoutError::Overflow {
                    group: group.to_string(),
                })?;
            Ok((size, abi.primitive_align(*p)))
        }
        FieldType::Bytes(0) => Err(zero_length()),
        FieldType::Bytes(len) => Ok((*len, 1)),
        FieldType::Group(nested) => {
            if nested.target() != target {
                return Err(LayoutError::TargetMismatch {
                    group: group.to_string(),
                    target: target.to_string(),
                    nested: nested.name().to_string(),
                    nested_target: nested.target().to_string(),
                });
            }
            Ok((nested.size(), nested.align()))
        }
    }
}

fn check_primitive(field: &str, p: Primitive) -> Result<(), LayoutError> {
    if p.is_supported() {
        return Ok(());
    }
    Err(LayoutError::UnsupportedWidth {
        field: field.to_string(),
        kind: match p.class() {
            NumClass::Float => "float",
            NumClass::Signed | NumClass::Unsigned => "integer",
        },
        width: p.width(),
    })
}

/// Round `offset` up to a multiple of `align`.
pub(crate) fn align_to(offset: usize, align: usize) -> Option<usize> {
    debug_assert!(align > 0);
    Some(offset.checked_add(align - 1)? / align * align)
}

/// Builder for group declarations.
///
/// ```
/// use harbour_layout::core::abi::AbiRules;
/// use harbour_layout::core::types::Primitive;
/// use harbour_layout::layout::GroupBuilder;
///
/// let abi = AbiRules::parse("x86_64-unknown-linux-gnu").unwrap();
/// let point = GroupBuilder::structure("point")
///     .field("x", Primitive::I32)
///     .field("y", Primitive::I32)
///     .build(&abi)
///     .unwrap();
/// assert_eq!(point.size(), 8);
/// ```
#[derive(Debug, Clone)]
pub struct GroupBuilder {
    name: String,
    kind: GroupKind,
    members: Vec<Member>,
}

impl GroupBuilder {
    /// Create a new builder.
    pub fn new(name: impl Into<String>, kind: GroupKind) -> Self {
        GroupBuilder {
            name: name.into(),
            kind,
            members: Vec::new(),
        }
    }

    /// Start a struct declaration.
    pub fn structure(name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Struct)
    }

    /// Start a union declaration.
    pub fn union(name: impl Into<String>) -> Self {
        Self::new(name, GroupKind::Union)
    }

    /// Add a scalar field.
    pub fn field(self, name: impl Into<String>, primitive: Primitive) -> Self {
        self.member(Member::Field(FieldSpec::new(
            name,
            FieldType::Scalar(primitive),
        )))
    }

    /// Add a fixed-size array field.
    pub fn array(self, name: impl Into<String>, primitive: Primitive, count: usize) -> Self {
        self.member(Member::Field(FieldSpec::new(
            name,
            FieldType::Array(primitive, count),
        )))
    }

    /// Add an opaque byte field.
    pub fn bytes(self, name: impl Into<String>, len: usize) -> Self {
        self.member(Member::Field(FieldSpec::new(name, FieldType::Bytes(len))))
    }

    /// Embed another group by value.
    pub fn nested(self, name: impl Into<String>, group: Arc<GroupLayout>) -> Self {
        self.member(Member::Field(FieldSpec::new(name, FieldType::Group(group))))
    }

    /// Add explicit padding.
    pub fn padding(self, len: usize) -> Self {
        self.member(Member::Padding(len))
    }

    /// Add any member.
    pub fn member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Declared members so far.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Compute the layout.
    pub fn build(&self, abi: &AbiRules) -> Result<Arc<GroupLayout>, LayoutError> {
        compute_layout(&self.name, self.kind, &self.members, abi).map(Arc::new)
    }
}
