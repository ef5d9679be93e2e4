//! Bounds-checked views into scope-owned memory.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::access::scalar::Scalar;
use crate::error::{BoundsError, Result, UseAfterFreeError};

/// Storage shared by a scope and every region allocated from it.
pub(crate) struct ScopeShared {
    pub(crate) id: u64,
    state: RwLock<ScopeState>,
}

pub(crate) struct ScopeState {
    pub(crate) released: bool,
    /// One slab per allocation; `u64` words keep every base 8-byte aligned.
    pub(crate) slabs: Vec<Box<[u64]>>,
}

impl ScopeShared {
    pub(crate) fn new(id: u64) -> Self {
        ScopeShared {
            id,
            state: RwLock::new(ScopeState {
                released: false,
                slabs: Vec::new(),
            }),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, ScopeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, ScopeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lifecycle of a region. `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Allocated,
    Released,
}

impl fmt::Display for RegionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionState::Allocated => write!(f, "allocated"),
            RegionState::Released => write!(f, "released"),
        }
    }
}

/// A fixed-size span of bytes owned by a [`Scope`](crate::memory::Scope).
///
/// Cloning a region clones the handle, not the bytes; sub-regions returned by
/// [`slice`](Self::slice) and [`element`](Self::element) share the parent's
/// storage. Every access checks that the owning scope is still open and that
/// the span stays inside the region.
///
/// Regions may be shared between threads. Each primitive read or write is
/// serialized by the scope's lock, so a single value is never torn, but a
/// sequence of writes is not atomic: callers that update several fields from
/// several threads must serialize those updates themselves.
#[derive(Clone)]
pub struct MemoryRegion {
    shared: Arc<ScopeShared>,
    slab: usize,
    base: usize,
    len: usize,
    element_size: usize,
}

impl MemoryRegion {
    pub(crate) fn new(shared: Arc<ScopeShared>, slab: usize, len: usize, element_size: usize) -> Self {
        MemoryRegion {
            shared,
            slab,
            base: 0,
            len,
            element_size,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of one element; the group size for layout allocations.
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Number of whole elements in the region.
    pub fn element_count(&self) -> usize {
        self.len.checked_div(self.element_size).unwrap_or(0)
    }

    /// Identifier of the owning scope.
    pub fn scope_id(&self) -> u64 {
        self.shared.id
    }

    pub fn state(&self) -> RegionState {
        if self.shared.read().released {
            RegionState::Released
        } else {
            RegionState::Allocated
        }
    }

    /// Whether two handles address the same bytes.
    pub fn same_span(&self, other: &MemoryRegion) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
            && self.slab == other.slab
            && self.base == other.base
            && self.len == other.len
    }

    /// A sub-region of `len` bytes at `offset`, sharing this region's storage.
    pub fn slice(&self, offset: usize, len: usize) -> Result<MemoryRegion> {
        self.slice_with_element(offset, len, len)
    }

    pub(crate) fn slice_with_element(
        &self,
        offset: usize,
        len: usize,
        element_size: usize,
    ) -> Result<MemoryRegion> {
        self.ensure_live()?;
        self.check_span(offset, len)?;
        Ok(MemoryRegion {
            shared: Arc::clone(&self.shared),
            slab: self.slab,
            base: self.base + offset,
            len,
            element_size,
        })
    }

    /// The sub-region holding element `index`.
    pub fn element(&self, index: usize) -> Result<MemoryRegion> {
        self.ensure_live()?;
        self.check_index(index)?;
        let size = self.element_size;
        self.slice_with_element(index * size, size, size)
    }

    /// Read a scalar at a byte offset, in native byte order.
    pub fn read<T: Scalar>(&self, offset: usize) -> Result<T> {
        self.with_span(offset, std::mem::size_of::<T>(), |bytes| {
            bytemuck::pod_read_unaligned(bytes)
        })
    }

    /// Write a scalar at a byte offset, in native byte order.
    pub fn write<T: Scalar>(&self, offset: usize, value: T) -> Result<()> {
        self.with_span_mut(offset, std::mem::size_of::<T>(), |bytes| {
            bytes.copy_from_slice(bytemuck::bytes_of(&value))
        })
    }

    /// Copy `len` bytes starting at `offset`.
    pub fn read_bytes(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        self.with_span(offset, len, |bytes| bytes.to_vec())
    }

    /// Overwrite bytes starting at `offset`.
    pub fn write_bytes(&self, offset: usize, data: &[u8]) -> Result<()> {
        self.with_span_mut(offset, data.len(), |bytes| bytes.copy_from_slice(data))
    }

    /// Copy the whole region.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.read_bytes(0, self.len)
    }

    /// Lend the region's exact byte span to `f`, e.g. for a native call.
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        self.with_span(0, self.len, f)
    }

    /// Lend the region's exact byte span to `f` for writing.
    pub fn with_bytes_mut<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        self.with_span_mut(0, self.len, f)
    }

    fn with_span<R>(&self, offset: usize, len: usize, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let state = self.shared.read();
        if state.released {
            return Err(UseAfterFreeError {
                scope: self.shared.id,
            }
            .into());
        }
        self.check_span(offset, len)?;

        let bytes: &[u8] = bytemuck::cast_slice(&state.slabs[self.slab]);
        let start = self.base + offset;
        Ok(f(&bytes[start..start + len]))
    }

    fn with_span_mut<R>(
        &self,
        offset: usize,
        len: usize,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> Result<R> {
        let mut state = self.shared.write();
        if state.released {
            return Err(UseAfterFreeError {
                scope: self.shared.id,
            }
            .into());
        }
        self.check_span(offset, len)?;

        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut state.slabs[self.slab]);
        let start = self.base + offset;
        Ok(f(&mut bytes[start..start + len]))
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.shared.read().released {
            return Err(UseAfterFreeError {
                scope: self.shared.id,
            }
            .into());
        }
        Ok(())
    }

    fn check_span(&self, offset: usize, len: usize) -> Result<(), BoundsError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(BoundsError::Offset {
                offset,
                len,
                region_len: self.len,
            }),
        }
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<(), BoundsError> {
        let count = self.element_count();
        if index < count {
            Ok(())
        } else {
            Err(BoundsError::Index { index, count })
        }
    }
}

impl fmt::Debug for MemoryRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRegion")
            .field("scope", &self.shared.id)
            .field("base", &self.base)
            .field("len", &self.len)
            .field("element_size", &self.element_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::memory::Scope;

    #[test]
    fn test_read_write_roundtrip() {
        let scope = Scope::new();
        let region = scope.allocate_bytes(16).unwrap();

        region.write::<u32>(4, 0xdead_beef).unwrap();
        region.write::<f64>(8, 1.5).unwrap();
        assert_eq!(region.read::<u32>(4).unwrap(), 0xdead_beef);
        assert_eq!(region.read::<f64>(8).unwrap(), 1.5);
        assert_eq!(region.read::<u32>(0).unwrap(), 0);
    }

    #[test]
    fn test_bounds() {
        let scope = Scope::new();
        let region = scope.allocate_bytes(8).unwrap();

        assert!(matches!(region.read::<u32>(8), Err(Error::Bounds(_))));
        assert!(matches!(region.read::<u64>(1), Err(Error::Bounds(_))));
        assert!(matches!(region.write::<u8>(8, 1), Err(Error::Bounds(_))));
        assert!(matches!(region.read::<u8>(usize::MAX), Err(Error::Bounds(_))));
        assert!(region.read::<u8>(7).is_ok());
    }

    #[test]
    fn test_slice_shares_storage() {
        let scope = Scope::new();
        let region = scope.allocate_bytes(16).unwrap();
        let tail = region.slice(8, 8).unwrap();

        tail.write::<u16>(2, 0x1234).unwrap();
        assert_eq!(region.read::<u16>(10).unwrap(), 0x1234);
        assert!(matches!(tail.read::<u16>(7), Err(Error::Bounds(_))));
        assert!(matches!(region.slice(9, 8), Err(Error::Bounds(_))));
        assert!(tail.same_span(&region.slice(8, 8).unwrap()));
        assert!(!tail.same_span(&region));
    }

    #[test]
    fn test_with_bytes_lends_exact_span() {
        let scope = Scope::new();
        let region = scope.allocate_bytes(12).unwrap().slice(4, 4).unwrap();

        region.with_bytes_mut(|bytes| bytes.fill(0xab)).unwrap();
        let len = region.with_bytes(|bytes| bytes.len()).unwrap();
        assert_eq!(len, 4);
        assert_eq!(region.to_vec().unwrap(), vec![0xab; 4]);
    }
}
