//! Size-class caching buffer pool
//!
//! Tensor construction and destruction are frequent and bursty, so freed
//! buffers are not returned to the system: they are parked on a free list
//! keyed by byte size and handed back out on the next allocation of that
//! size. The pool is an explicit capability threaded through constructors,
//! the same way a device handle would be.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::alloc::{alloc_zeroed, dealloc, Layout as AllocLayout};
use std::collections::HashMap;
use std::sync::Arc;

/// Allocation alignment in bytes. Generous enough for any element type and
/// for SIMD loads over the buffer.
const ALIGN: usize = 64;

/// Caching allocator handle
///
/// Cheap to clone; all clones share the same free lists and counters.
/// Buffers cached on the free list are only released to the system by
/// [`BufferPool::drain`] or when the last handle is dropped.
///
/// The free-list state is internally locked, so sharing a pool between
/// threads is memory-safe. The tensors allocated from it are not
/// synchronized in any way.
#[derive(Clone, Default)]
pub struct BufferPool {
    state: Arc<Mutex<PoolState>>,
}

#[derive(Default)]
struct PoolState {
    /// Freed, not-yet-reused buffers keyed by byte size
    free: HashMap<usize, Vec<u64>>,
    /// Total bytes handed out over the pool's lifetime
    allocated_bytes: usize,
    /// Total bytes returned over the pool's lifetime
    deallocated_bytes: usize,
}

impl BufferPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate `size_bytes` of zeroed memory
    ///
    /// Reuses a cached buffer of the exact size when one is available,
    /// otherwise requests fresh memory from the system. Returns
    /// [`Error::OutOfMemory`] if the system allocation fails.
    pub fn allocate(&self, size_bytes: usize) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let mut state = self.state.lock();
        let ptr = match state.free.get_mut(&size_bytes).and_then(Vec::pop) {
            Some(cached) => {
                // Cached buffers hold stale data from their previous life.
                unsafe { std::ptr::write_bytes(cached as *mut u8, 0, size_bytes) };
                cached
            }
            None => {
                let layout = alloc_layout(size_bytes);
                let raw = unsafe { alloc_zeroed(layout) };
                if raw.is_null() {
                    return Err(Error::OutOfMemory { size: size_bytes });
                }
                raw as u64
            }
        };
        state.allocated_bytes += size_bytes;
        Ok(ptr)
    }

    /// Return a buffer to the pool
    ///
    /// The buffer is retained on the free list, not freed to the system.
    /// Must be called exactly once per allocation; double-free is not
    /// guarded against.
    pub fn deallocate(&self, ptr: u64, size_bytes: usize) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        let mut state = self.state.lock();
        state.deallocated_bytes += size_bytes;
        state.free.entry(size_bytes).or_default().push(ptr);
    }

    /// Total bytes handed out over the pool's lifetime
    pub fn allocated_bytes(&self) -> usize {
        self.state.lock().allocated_bytes
    }

    /// Total bytes returned over the pool's lifetime
    pub fn deallocated_bytes(&self) -> usize {
        self.state.lock().deallocated_bytes
    }

    /// Whether every allocation has been matched by a deallocation
    ///
    /// A leak-detector diagnostic for test suites, not a runtime invariant.
    pub fn is_balanced(&self) -> bool {
        let state = self.state.lock();
        state.allocated_bytes == state.deallocated_bytes
    }

    /// Number of buffers currently parked on the free lists
    pub fn cached_buffers(&self) -> usize {
        self.state.lock().free.values().map(Vec::len).sum()
    }

    /// Release all cached buffers back to the system
    pub fn drain(&self) {
        self.state.lock().release_cached();
    }
}

impl PoolState {
    fn release_cached(&mut self) {
        for (size, buffers) in self.free.drain() {
            for ptr in buffers {
                unsafe { dealloc(ptr as *mut u8, alloc_layout(size)) };
            }
        }
    }
}

impl Drop for PoolState {
    fn drop(&mut self) {
        self.release_cached();
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BufferPool")
            .field("allocated_bytes", &state.allocated_bytes)
            .field("deallocated_bytes", &state.deallocated_bytes)
            .field("cached", &state.free.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

fn alloc_layout(size_bytes: usize) -> AllocLayout {
    AllocLayout::from_size_align(size_bytes, ALIGN).expect("Invalid allocation layout")
}
