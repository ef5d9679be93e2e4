//! Typed field accessors.
//!
//! An accessor is built once from a [`GroupLayout`] and then applied to any
//! number of regions holding that group. It captures the field's offset and
//! the group size, nothing else, so it is cheap to clone and `Send + Sync`.
//!
//! # Unions
//!
//! Accessors for the members of a union all address offset 0. Writing one
//! member and reading another reinterprets the same bytes; no active member
//! is tracked, and picking the right one is up to the caller.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::access::scalar::Scalar;
use crate::core::types::FieldType;
use crate::error::{BoundsError, Error, LayoutError, Result};
use crate::layout::GroupLayout;
use crate::memory::MemoryRegion;

/// Byte offset of element `index` in an array-of-group region.
pub(crate) fn element_base(region: &MemoryRegion, group_size: usize, index: usize) -> Result<usize> {
    region.ensure_live()?;
    let count = region.len().checked_div(group_size).unwrap_or(0);
    if index >= count {
        return Err(BoundsError::Index { index, count }.into());
    }
    Ok(index * group_size)
}

fn offset_from(region: &MemoryRegion, base: usize, offset: usize, len: usize) -> Result<usize> {
    base.checked_add(offset).ok_or_else(|| {
        BoundsError::Offset {
            offset: base,
            len,
            region_len: region.len(),
        }
        .into()
    })
}

/// Typed view of a scalar or array field.
///
/// For array fields the accessor addresses element 0; use
/// [`element`](Self::element) to move to another element.
#[derive(Debug)]
pub struct Accessor<T> {
    path: String,
    offset: usize,
    group_size: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Accessor<T> {
    fn clone(&self) -> Self {
        Accessor {
            path: self.path.clone(),
            offset: self.offset,
            group_size: self.group_size,
            len: self.len,
            _marker: PhantomData,
        }
    }
}

impl<T: Scalar> Accessor<T> {
    /// Path of the field within its group.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Offset from the start of the group.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of array elements (1 for scalars).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Narrow an array accessor to element `index`.
    pub fn element(&self, index: usize) -> Result<Accessor<T>, BoundsError> {
        if index >= self.len {
            return Err(BoundsError::Index {
                index,
                count: self.len,
            });
        }
        Ok(Accessor {
            path: format!("{}[{}]", self.path, index),
            offset: self.offset + index * std::mem::size_of::<T>(),
            group_size: self.group_size,
            len: 1,
            _marker: PhantomData,
        })
    }

    /// Read the field of the group at the start of `region`.
    pub fn get(&self, region: &MemoryRegion) -> Result<T> {
        region.read(self.offset)
    }

    /// Read the field of a group starting `base` bytes into `region`.
    pub fn get_at(&self, region: &MemoryRegion, base: usize) -> Result<T> {
        let offset = offset_from(region, base, self.offset, std::mem::size_of::<T>())?;
        region.read(offset)
    }

    /// Read the field of element `index` in an array-of-group region.
    pub fn get_indexed(&self, region: &MemoryRegion, index: usize) -> Result<T> {
        let base = element_base(region, self.group_size, index)?;
        region.read(base + self.offset)
    }

    pub fn set(&self, region: &MemoryRegion, value: T) -> Result<()> {
        region.write(self.offset, value)
    }

    pub fn set_at(&self, region: &MemoryRegion, base: usize, value: T) -> Result<()> {
        let offset = offset_from(region, base, self.offset, std::mem::size_of::<T>())?;
        region.write(offset, value)
    }

    pub fn set_indexed(&self, region: &MemoryRegion, index: usize, value: T) -> Result<()> {
        let base = element_base(region, self.group_size, index)?;
        region.write(base + self.offset, value)
    }
}

/// View of a group embedded by value in another group.
#[derive(Debug, Clone)]
pub struct NestedAccessor {
    path: String,
    offset: usize,
    group_size: usize,
    layout: Arc<GroupLayout>,
}

impl NestedAccessor {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Layout of the nested group; its accessors apply to the slices.
    pub fn layout(&self) -> &Arc<GroupLayout> {
        &self.layout
    }

    /// The nested group's bytes inside the group at the start of `region`.
    pub fn slice(&self, region: &MemoryRegion) -> Result<MemoryRegion> {
        let size = self.layout.size();
        region.slice_with_element(self.offset, size, size)
    }

    pub fn slice_at(&self, region: &MemoryRegion, base: usize) -> Result<MemoryRegion> {
        let size = self.layout.size();
        let offset = offset_from(region, base, self.offset, size)?;
        region.slice_with_element(offset, size, size)
    }

    /// The nested group's bytes inside element `index` of `region`.
    pub fn slice_indexed(&self, region: &MemoryRegion, index: usize) -> Result<MemoryRegion> {
        let size = self.layout.size();
        let base = element_base(region, self.group_size, index)?;
        region.slice_with_element(base + self.offset, size, size)
    }
}

/// View of an opaque `bytes` field.
#[derive(Debug, Clone)]
pub struct BytesAccessor {
    path: String,
    offset: usize,
    group_size: usize,
    len: usize,
}

impl BytesAccessor {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, region: &MemoryRegion) -> Result<Vec<u8>> {
        region.read_bytes(self.offset, self.len)
    }

    pub fn get_indexed(&self, region: &MemoryRegion, index: usize) -> Result<Vec<u8>> {
        let base = element_base(region, self.group_size, index)?;
        region.read_bytes(base + self.offset, self.len)
    }

    /// Overwrite the field; `data` must be exactly the field's length.
    pub fn set(&self, region: &MemoryRegion, data: &[u8]) -> Result<()> {
        self.check_len(data)?;
        region.write_bytes(self.offset, data)
    }

    pub fn set_indexed(&self, region: &MemoryRegion, index: usize, data: &[u8]) -> Result<()> {
        self.check_len(data)?;
        let base = element_base(region, self.group_size, index)?;
        region.write_bytes(base + self.offset, data)
    }

    fn check_len(&self, data: &[u8]) -> Result<(), BoundsError> {
        if data.len() == self.len {
            Ok(())
        } else {
            Err(BoundsError::Offset {
                offset: 0,
                len: data.len(),
                region_len: self.len,
            })
        }
    }
}

impl GroupLayout {
    fn mismatch(&self, path: &str, declared: &FieldType, requested: &str) -> Error {
        LayoutError::TypeMismatch {
            group: self.name.clone(),
            path: path.to_string(),
            declared: declared.to_string(),
            requested: requested.to_string(),
        }
        .into()
    }

    /// Typed accessor for a scalar or array field.
    ///
    /// `path` may reach into nested groups (`var1.u32`) and may subscript
    /// arrays (`u16[1]`). `T` must be exactly the declared primitive.
    pub fn scalar<T: Scalar>(&self, path: &str) -> Result<Accessor<T>> {
        let resolved = self.resolve(path)?;
        let len = match &resolved.field_type {
            FieldType::Scalar(p) if *p == T::PRIMITIVE => 1,
            FieldType::Array(p, n) if *p == T::PRIMITIVE => *n,
            other => return Err(self.mismatch(path, other, &T::PRIMITIVE.to_string())),
        };

        Ok(Accessor {
            path: path.to_string(),
            offset: resolved.offset,
            group_size: self.size,
            len,
            _marker: PhantomData,
        })
    }

    /// Accessor for a nested group field.
    pub fn nested(&self, path: &str) -> Result<NestedAccessor> {
        let resolved = self.resolve(path)?;
        match resolved.field_type {
            FieldType::Group(layout) => Ok(NestedAccessor {
                path: path.to_string(),
                offset: resolved.offset,
                group_size: self.size,
                layout,
            }),
            other => Err(self.mismatch(path, &other, "a nested group")),
        }
    }

    /// Accessor for an opaque `bytes` field.
    pub fn bytes(&self, path: &str) -> Result<BytesAccessor> {
        let resolved = self.resolve(path)?;
        match resolved.field_type {
            FieldType::Bytes(len) => Ok(BytesAccessor {
                path: path.to_string(),
                offset: resolved.offset,
                group_size: self.size,
                len,
            }),
            other => Err(self.mismatch(path, &other, "bytes")),
        }
    }
}
