//! Computed group layouts.

use serde::Serialize;

use crate::core::types::{FieldType, GroupKind, Primitive};
use crate::error::{BoundsError, Error, LayoutError, Result};
use crate::util::hash::Fingerprint;

/// A field placed at its computed offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    /// Field name
    pub name: String,
    /// Declared type
    pub field_type: FieldType,
    /// Offset from the start of the owning group
    pub offset: usize,
    /// Size in bytes
    pub size: usize,
    /// Alignment in bytes
    pub align: usize,
}

/// Computed offsets, size and alignment of a struct or union.
///
/// Immutable once computed. Embed it in other groups or hand it to accessors
/// through an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLayout {
    pub(crate) name: String,
    pub(crate) kind: GroupKind,
    pub(crate) size: usize,
    pub(crate) align: usize,
    pub(crate) fields: Vec<FieldLayout>,
    pub(crate) target: String,
}

/// One row of a flattened offset map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldEntry {
    /// Dotted path from the root group (`active_region.left`)
    pub path: String,
    /// Offset from the start of the root group
    pub offset: usize,
    /// Size in bytes
    pub size: usize,
    /// Alignment in bytes
    pub align: usize,
    /// Type, rendered as text
    #[serde(rename = "type")]
    pub ty: String,
}

/// The target of a resolved field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Path as given
    pub path: String,
    /// Offset from the start of the root group
    pub offset: usize,
    /// Type at that offset; array elements resolve to scalars
    pub field_type: FieldType,
    /// Size in bytes of the resolved item
    pub size: usize,
}

impl GroupLayout {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// `sizeof` of the group, tail padding included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// `alignof` of the group.
    pub fn align(&self) -> usize {
        self.align
    }

    /// Fields in declaration order (padding omitted).
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Description of the ABI the layout was computed for.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Look up a direct field by name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub(crate) fn require_field(&self, name: &str) -> Result<&FieldLayout, LayoutError> {
        self.field(name).ok_or_else(|| LayoutError::UnknownField {
            group: self.name.clone(),
            path: name.to_string(),
        })
    }

    /// Flatten every field, recursing into nested groups.
    pub fn offset_map(&self) -> Vec<FieldEntry> {
        let mut entries = Vec::new();
        self.collect_entries("", 0, &mut entries);
        entries
    }

    fn collect_entries(&self, prefix: &str, base: usize, out: &mut Vec<FieldEntry>) {
        for field in &self.fields {
            let path = if prefix.is_empty() {
                field.name.clone()
            } else {
                format!("{}.{}", prefix, field.name)
            };
            out.push(FieldEntry {
                path: path.clone(),
                offset: base + field.offset,
                size: field.size,
                align: field.align,
                ty: field.field_type.to_string(),
            });
            if let FieldType::Group(nested) = &field.field_type {
                nested.collect_entries(&path, base + field.offset, out);
            }
        }
    }

    /// Resolve a path such as `var1.u16[1]` to an absolute offset.
    ///
    /// Unknown names are layout errors; array subscripts past the declared
    /// length are bounds errors.
    pub fn resolve(&self, path: &str) -> Result<ResolvedField> {
        let unknown = || -> Error {
            LayoutError::UnknownField {
                group: self.name.clone(),
                path: path.to_string(),
            }
            .into()
        };

        let mut group = self;
        let mut offset = 0usize;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let (name, index) = parse_segment(segment).ok_or_else(unknown)?;
            let field = group.field(name).ok_or_else(unknown)?;
            offset += field.offset;

            if segments.peek().is_some() {
                match (&field.field_type, index) {
                    (FieldType::Group(nested), None) => {
                        group = nested.as_ref();
                        continue;
                    }
                    _ => return Err(unknown()),
                }
            }

            let (field_type, size) = match (index, &field.field_type) {
                (None, ty) => (ty.clone(), field.size),
                (Some(i), FieldType::Array(p, n)) => {
                    if i >= *n {
                        return Err(BoundsError::Index { index: i, count: *n }.into());
                    }
                    offset += i * p.width();
                    (FieldType::Scalar(*p), p.width())
                }
                (Some(i), FieldType::Bytes(n)) => {
                    if i >= *n {
                        return Err(BoundsError::Index { index: i, count: *n }.into());
                    }
                    offset += i;
                    (FieldType::Scalar(Primitive::U8), 1)
                }
                (Some(_), _) => return Err(unknown()),
            };

            return Ok(ResolvedField {
                path: path.to_string(),
                offset,
                field_type,
                size,
            });
        }

        Err(unknown())
    }

    /// SHA-256 of the canonical layout description.
    ///
    /// Two processes that compute the same layout for the same target get
    /// the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut fp = Fingerprint::new();
        fp.update_str(&self.target)
            .update_str(&self.name)
            .update_str(self.kind.keyword())
            .update_usize(self.size)
            .update_usize(self.align);
        for entry in self.offset_map() {
            fp.update_str(&entry.path)
                .update_usize(entry.offset)
                .update_usize(entry.size)
                .update_str(&entry.ty);
        }
        fp.finish()
    }
}

/// Split `name` or `name[3]` into name and optional subscript.
fn parse_segment(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.split_once('[') {
        None if !segment.is_empty() => Some((segment, None)),
        None => None,
        Some((name, rest)) => {
            let index = rest.strip_suffix(']')?.trim().parse().ok()?;
            if name.is_empty() {
                return None;
            }
            Some((name, Some(index)))
        }
    }
}
