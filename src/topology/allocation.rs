//! Assembly-phase memory allocation.
//!
//! # Responsibilities
//! - Provide the allocate/deallocate capability used while the topology is built
//! - Supply the process-wide system-heap allocator ([`MALLOCATOR`])
//! - Allow a byte budget to be imposed on assembly ([`BoundedAllocator`])
//!
//! # Design Decisions
//! - Only used during the single-threaded assembly phase
//! - Allocation failure is reported, never retried; the caller treats it as fatal
//! - Blocks are zero-initialized so they can be viewed as byte slices

use std::alloc::{GlobalAlloc, Layout, System};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

/// Alignment of every block handed out during assembly.
pub const BLOCK_ALIGN: usize = 16;

/// Errors returned by an [`AssemblyAllocator`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("zero-size allocation requested for memory id {identifier}")]
    ZeroSize { identifier: u32 },

    #[error("allocation of {size} bytes for memory id {identifier} has no valid layout")]
    Layout { identifier: u32, size: usize },

    #[error("out of memory allocating {size} bytes for memory id {identifier}")]
    Exhausted { identifier: u32, size: usize },

    #[error("allocation of {size} bytes for memory id {identifier} exceeds budget ({used} of {budget} bytes in use)")]
    BudgetExceeded {
        identifier: u32,
        size: usize,
        used: usize,
        budget: usize,
    },
}

/// An owned, zero-initialized memory block.
///
/// A block must be given back to the allocator that produced it via
/// [`AssemblyAllocator::deallocate`]; dropping it leaks the memory.
#[derive(Debug)]
pub struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The block is uniquely owned and only exposes its bytes through `&`/`&mut self`.
unsafe impl Send for Block {}
unsafe impl Sync for Block {}

impl Block {
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for `len` initialized bytes for the lifetime of the block.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }
}

/// Allocation capability used by the assembly phase.
pub trait AssemblyAllocator: Send + Sync {
    /// Allocate `size` bytes tagged with a memory `identifier`.
    fn allocate(&self, identifier: u32, size: usize) -> Result<Block, AllocationError>;

    /// Return a block obtained from [`AssemblyAllocator::allocate`].
    fn deallocate(&self, identifier: u32, block: Block);
}

/// General-purpose allocator backed by the system heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct MallocAllocator;

/// Process-wide allocator used for topology construction.
pub static MALLOCATOR: MallocAllocator = MallocAllocator;

impl AssemblyAllocator for MallocAllocator {
    fn allocate(&self, identifier: u32, size: usize) -> Result<Block, AllocationError> {
        if size == 0 {
            return Err(AllocationError::ZeroSize { identifier });
        }
        let layout = Layout::from_size_align(size, BLOCK_ALIGN)
            .map_err(|_| AllocationError::Layout { identifier, size })?;

        // SAFETY: layout has non-zero size.
        let ptr = unsafe { System.alloc_zeroed(layout) };
        let ptr = NonNull::new(ptr).ok_or(AllocationError::Exhausted { identifier, size })?;

        tracing::trace!(identifier, size, "Assembly allocation");
        Ok(Block { ptr, layout })
    }

    fn deallocate(&self, identifier: u32, block: Block) {
        tracing::trace!(identifier, size = block.len(), "Assembly deallocation");
        // SAFETY: the block was produced by `allocate` with this exact layout.
        unsafe { System.dealloc(block.ptr.as_ptr(), block.layout) }
    }
}

/// Wraps another allocator and refuses requests past a byte budget.
#[derive(Debug)]
pub struct BoundedAllocator<A> {
    inner: A,
    budget: usize,
    used: AtomicUsize,
}

impl<A: AssemblyAllocator> BoundedAllocator<A> {
    pub fn new(inner: A, budget: usize) -> Self {
        Self {
            inner,
            budget,
            used: AtomicUsize::new(0),
        }
    }

    /// Bytes currently allocated through this wrapper.
    pub fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }

    pub fn budget(&self) -> usize {
        self.budget
    }
}

impl<A: AssemblyAllocator> AssemblyAllocator for BoundedAllocator<A> {
    fn allocate(&self, identifier: u32, size: usize) -> Result<Block, AllocationError> {
        let mut used = self.used.load(Ordering::Relaxed);
        loop {
            let next = used.saturating_add(size);
            if next > self.budget {
                tracing::warn!(identifier, size, used, budget = self.budget, "Assembly memory budget exceeded");
                return Err(AllocationError::BudgetExceeded {
                    identifier,
                    size,
                    used,
                    budget: self.budget,
                });
            }
            match self.used.compare_exchange_weak(used, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(x) => used = x,
            }
        }

        self.inner.allocate(identifier, size).inspect_err(|_| {
            self.used.fetch_sub(size, Ordering::Relaxed);
        })
    }

    fn deallocate(&self, identifier: u32, block: Block) {
        self.used.fetch_sub(block.len(), Ordering::Relaxed);
        self.inner.deallocate(identifier, block);
    }
}

impl<A: AssemblyAllocator + ?Sized> AssemblyAllocator for &A {
    fn allocate(&self, identifier: u32, size: usize) -> Result<Block, AllocationError> {
        (**self).allocate(identifier, size)
    }

    fn deallocate(&self, identifier: u32, block: Block) {
        (**self).deallocate(identifier, block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malloc_round_trip() {
        let mut block = MALLOCATOR.allocate(7, 64).unwrap();
        assert_eq!(block.len(), 64);
        assert!(block.as_slice().iter().all(|b| *b == 0));
        block.as_mut_slice()[63] = 0xAB;
        assert_eq!(block.as_slice()[63], 0xAB);
        MALLOCATOR.deallocate(7, block);
    }

    #[test]
    fn test_zero_size_rejected() {
        assert_eq!(
            MALLOCATOR.allocate(3, 0).unwrap_err(),
            AllocationError::ZeroSize { identifier: 3 }
        );
    }

    #[test]
    fn test_bounded_allocator_budget() {
        let bounded = BoundedAllocator::new(MallocAllocator, 100);
        let a = bounded.allocate(1, 60).unwrap();
        assert_eq!(bounded.used(), 60);

        let err = bounded.allocate(2, 50).unwrap_err();
        assert_eq!(
            err,
            AllocationError::BudgetExceeded {
                identifier: 2,
                size: 50,
                used: 60,
                budget: 100,
            }
        );
        assert_eq!(bounded.used(), 60);

        bounded.deallocate(1, a);
        assert_eq!(bounded.used(), 0);

        let b = bounded.allocate(2, 100).unwrap();
        bounded.deallocate(2, b);
    }

    #[test]
    fn test_allocator_by_reference() {
        fn take<A: AssemblyAllocator>(alloc: A) -> Block {
            alloc.allocate(9, 8).unwrap()
        }
        let block = take(&MALLOCATOR);
        MALLOCATOR.deallocate(9, block);
    }
}
