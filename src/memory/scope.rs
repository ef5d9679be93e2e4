//! Scopes own the memory behind every region allocated from them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{InvalidArgumentError, Result};
use crate::layout::GroupLayout;
use crate::memory::region::{MemoryRegion, ScopeShared};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// A lifetime scope for zero-initialized native memory.
///
/// All regions allocated from a scope are released together when the scope
/// is closed or dropped. After that, every access through any of those
/// regions fails with [`UseAfterFreeError`](crate::error::UseAfterFreeError).
pub struct Scope {
    shared: Arc<ScopeShared>,
}

impl Scope {
    pub fn new() -> Self {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("opened scope #{}", id);
        Scope {
            shared: Arc::new(ScopeShared::new(id)),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn is_open(&self) -> bool {
        !self.shared.read().released
    }

    /// Allocate one zeroed instance of a group.
    pub fn allocate(&self, layout: &GroupLayout) -> Result<MemoryRegion> {
        self.allocate_array(layout, 1usize)
    }

    /// Allocate `count` contiguous zeroed instances of a group.
    ///
    /// Element `i` starts at byte `i * layout.size()`. A count of zero yields
    /// an empty region; a negative or unrepresentable count is rejected.
    pub fn allocate_array<N>(&self, layout: &GroupLayout, count: N) -> Result<MemoryRegion>
    where
        N: TryInto<usize> + Copy + fmt::Display,
    {
        let n: usize = count.try_into().map_err(|_| {
            InvalidArgumentError::new(format!(
                "element count {} for `{}` must be a non-negative size",
                count,
                layout.name()
            ))
        })?;
        let len = n.checked_mul(layout.size()).ok_or_else(|| {
            InvalidArgumentError::new(format!(
                "{} elements of `{}` overflow the address space",
                n,
                layout.name()
            ))
        })?;

        let region = self.allocate_raw(len, layout.size())?;
        tracing::debug!(
            "allocated {} x `{}` ({} bytes) in scope #{}",
            n,
            layout.name(),
            len,
            self.id()
        );
        Ok(region)
    }

    /// Copy `bytes` into a new region holding `bytes.len() / layout.size()`
    /// instances of a group, e.g. an array a native library handed back.
    ///
    /// The length must be a whole number of elements.
    pub fn allocate_array_from(&self, layout: &GroupLayout, bytes: &[u8]) -> Result<MemoryRegion> {
        if bytes.len() % layout.size() != 0 {
            return Err(InvalidArgumentError::new(format!(
                "{} bytes is not a whole number of `{}` elements ({} bytes each)",
                bytes.len(),
                layout.name(),
                layout.size()
            ))
            .into());
        }

        let region = self.allocate_raw(bytes.len(), layout.size())?;
        region.write_bytes(0, bytes)?;
        tracing::debug!(
            "copied {} x `{}` ({} bytes) into scope #{}",
            region.element_count(),
            layout.name(),
            bytes.len(),
            self.id()
        );
        Ok(region)
    }

    /// Allocate `len` zeroed bytes with no group attached.
    pub fn allocate_bytes(&self, len: usize) -> Result<MemoryRegion> {
        let region = self.allocate_raw(len, 1)?;
        tracing::debug!("allocated {} bytes in scope #{}", len, self.id());
        Ok(region)
    }

    /// Number of allocations made so far.
    pub fn region_count(&self) -> usize {
        self.shared.read().slabs.len()
    }

    /// Bytes reserved by this scope, including word padding.
    pub fn allocated_bytes(&self) -> usize {
        self.shared
            .read()
            .slabs
            .iter()
            .map(|slab| slab.len() * 8)
            .sum()
    }

    /// Release every region of this scope.
    pub fn close(self) {
        self.release();
    }

    fn allocate_raw(&self, len: usize, element_size: usize) -> Result<MemoryRegion> {
        if len > isize::MAX as usize {
            return Err(
                InvalidArgumentError::new(format!("{} bytes exceeds the allocation limit", len))
                    .into(),
            );
        }

        let words = len.div_ceil(8);
        let mut state = self.shared.write();
        state.slabs.push(vec![0u64; words].into_boxed_slice());
        let slab = state.slabs.len() - 1;
        drop(state);

        Ok(MemoryRegion::new(
            Arc::clone(&self.shared),
            slab,
            len,
            element_size,
        ))
    }

    fn release(&self) {
        let mut state = self.shared.write();
        if state.released {
            return;
        }
        state.released = true;

        let regions = state.slabs.len();
        let bytes: usize = state.slabs.iter().map(|slab| slab.len() * 8).sum();
        state.slabs = Vec::new();
        tracing::debug!(
            "released scope #{} ({} regions, {} bytes)",
            self.shared.id,
            regions,
            bytes
        );
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.shared.id)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Run `f` with a fresh scope, releasing it on every exit path.
///
/// ```
/// use harbour_layout::memory::with_scope;
///
/// let leaked = with_scope(|scope| scope.allocate_bytes(4)).unwrap();
/// assert!(leaked.read::<u32>(0).is_err());
/// ```
pub fn with_scope<R, E>(f: impl FnOnce(&Scope) -> Result<R, E>) -> Result<R, E> {
    let scope = Scope::new();
    f(&scope)
}
