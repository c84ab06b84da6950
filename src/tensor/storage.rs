//! Storage: pooled element buffers with Arc-based sharing

use crate::error::Result;
use crate::pool::BufferPool;
use crate::Elem;
use std::sync::Arc;

const ELEM_SIZE: usize = std::mem::size_of::<Elem>();

/// Storage for tensor elements
///
/// Storage wraps one pool allocation with reference counting, enabling
/// zero-copy views (slice, transpose, permute, view) that share the
/// underlying buffer. The element offset of a view lives in its `Layout`,
/// not here.
///
/// The buffer is returned to its pool when the last reference is dropped.
pub struct Storage {
    inner: Arc<StorageInner>,
}

struct StorageInner {
    /// Base pointer of the pool allocation
    ptr: u64,
    /// Number of elements (not bytes)
    len: usize,
    /// Pool the buffer came from and returns to
    pool: BufferPool,
}

impl Storage {
    /// Allocate `len` zero-initialized elements from `pool`
    pub fn zeroed(len: usize, pool: &BufferPool) -> Result<Self> {
        let ptr = pool.allocate(len * ELEM_SIZE)?;
        Ok(Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                pool: pool.clone(),
            }),
        })
    }

    /// Allocate `len` elements, each set to `value`
    pub fn filled(len: usize, value: Elem, pool: &BufferPool) -> Result<Self> {
        let storage = Self::zeroed(len, pool)?;
        for i in 0..len {
            storage.set(i, value);
        }
        Ok(storage)
    }

    /// Allocate a fresh buffer copy-initialized from `data`
    pub fn from_slice(data: &[Elem], pool: &BufferPool) -> Result<Self> {
        let storage = Self::zeroed(data.len(), pool)?;
        if !data.is_empty() {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    data.as_ptr(),
                    storage.inner.ptr as *mut Elem,
                    data.len(),
                );
            }
        }
        Ok(storage)
    }

    /// Number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Whether the buffer holds zero elements
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// The pool this buffer was drawn from
    #[inline]
    pub fn pool(&self) -> &BufferPool {
        &self.inner.pool
    }

    /// Number of views currently sharing this buffer
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Read the element at buffer index `i`
    #[inline]
    pub fn get(&self, i: usize) -> Elem {
        debug_assert!(i < self.inner.len);
        unsafe { *(self.inner.ptr as *const Elem).add(i) }
    }

    /// Write the element at buffer index `i`
    ///
    /// Takes `&self`: aliased views mutate the same shared buffer. Callers
    /// must not race a write against reads through another alias.
    #[inline]
    pub fn set(&self, i: usize, value: Elem) {
        debug_assert!(i < self.inner.len);
        unsafe { *(self.inner.ptr as *mut Elem).add(i) = value }
    }
}

impl Clone for Storage {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for StorageInner {
    fn drop(&mut self) {
        self.pool.deallocate(self.ptr, self.len * ELEM_SIZE);
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("ptr", &format!("0x{:x}", self.inner.ptr))
            .field("len", &self.inner.len)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}
