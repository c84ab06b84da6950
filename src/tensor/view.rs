//! TensorView: the strided addressing core
//!
//! A view couples a shared [`Storage`] with a [`Layout`] and resolves
//! multi-indices to storage positions. Slice, transpose, view, and permute
//! derive new layouts over the same buffer without touching element data.
//!
//! Nothing here is bounds-checked; the `Tensor` facade validates every
//! index and dimension argument before it reaches this layer.

use super::layout::{Idx, IndexIter, Layout};
use super::shape::Shape;
use super::storage::Storage;
use crate::error::Result;
use crate::pool::BufferPool;
use crate::Elem;
use smallvec::SmallVec;

/// Strided view over a shared element buffer
#[derive(Clone)]
pub struct TensorView {
    storage: Storage,
    layout: Layout,
}

impl TensorView {
    /// Couple an existing storage with a layout
    pub fn new(storage: Storage, layout: Layout) -> Self {
        Self { storage, layout }
    }

    /// Fresh zero-filled contiguous view of the given shape
    pub fn from_shape(shape: Shape, pool: &BufferPool) -> Result<Self> {
        let storage = Storage::zeroed(shape.elem_count(), pool)?;
        let layout = Layout::contiguous(&shape);
        Ok(Self { storage, layout })
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.layout.elem_count()
    }

    /// Extent of dimension `dim`
    #[inline]
    pub fn size(&self, dim: usize) -> usize {
        self.layout.shape()[dim]
    }

    /// The view's shape
    #[inline]
    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    /// The view's strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    /// Element offset of this view into its storage
    #[inline]
    pub fn offset(&self) -> usize {
        self.layout.offset()
    }

    /// Whether the strides match the default row-major layout
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.layout.is_contiguous()
    }

    /// The underlying shared storage
    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Read the element at a full multi-index. Unchecked.
    #[inline]
    pub fn at(&self, idx: &[usize]) -> Elem {
        self.storage.get(self.layout.index_unchecked(idx))
    }

    /// Write the element at a full multi-index. Unchecked.
    #[inline]
    pub fn set_at(&self, idx: &[usize], value: Elem) {
        self.storage.set(self.layout.index_unchecked(idx), value);
    }

    /// Flat element access at local offset `i`, relative to this view's
    /// own offset. Unchecked.
    #[inline]
    pub fn item(&self, i: usize) -> Elem {
        self.storage.get(self.layout.offset() + i)
    }

    /// Flat element write at local offset `i`. Unchecked.
    #[inline]
    pub fn set_item(&self, i: usize, value: Elem) {
        self.storage.set(self.layout.offset() + i, value);
    }

    /// Broadcast-aware multi-index evaluation
    ///
    /// The supplied index is right-aligned against this view's dimensions:
    /// when `idx` has more entries than the rank, only the trailing `rank`
    /// entries apply; when it has fewer, the leading dimensions read index
    /// 0. Extent-1 dimensions carry stride 0, so an oversized consumer
    /// index along them is a no-op. This is the NumPy broadcasting rule.
    #[inline]
    pub fn eval(&self, idx: &[usize]) -> Elem {
        let ndim = self.ndim();
        let supplied = idx.len();
        let strides = self.layout.strides();
        let mut linear = self.layout.offset() as isize;
        for dim in 0..ndim {
            let i = if dim + supplied >= ndim {
                idx[dim + supplied - ndim]
            } else {
                0
            };
            linear += i as isize * strides[dim];
        }
        self.storage.get(linear as usize)
    }

    /// Fix dimension `dim` to `index`: same storage, extent-1 stride-0 axis
    pub fn slice(&self, index: usize, dim: usize) -> TensorView {
        Self::new(self.storage.clone(), self.layout.select(dim, index))
    }

    /// Sub-range view `[start, end)` along `dim`: same storage and stride
    pub fn slice_range(&self, start: usize, end: usize, dim: usize) -> TensorView {
        Self::new(self.storage.clone(), self.layout.narrow(dim, start, end))
    }

    /// Swap two dimensions: same storage, same offset
    pub fn transpose(&self, dim0: usize, dim1: usize) -> TensorView {
        Self::new(self.storage.clone(), self.layout.transpose(dim0, dim1))
    }

    /// Reinterpret the storage under a new shape with fresh contiguous
    /// strides. Element-count equality is enforced by the facade.
    pub fn view(&self, shape: &Shape) -> TensorView {
        Self::new(self.storage.clone(), self.layout.reshaped(shape))
    }

    /// Reorder dimensions: output dimension `i` is input dimension `order[i]`
    pub fn permute(&self, order: &[usize]) -> TensorView {
        Self::new(self.storage.clone(), self.layout.permute(order))
    }

    /// Reduce over dimension `dim`, producing a fresh contiguous view of
    /// rank n-1 (rank 1 with shape `[1]` when reducing a vector)
    ///
    /// Accumulation goes through [`TensorView::eval`], so the reduction is
    /// transparent over broadcast axes.
    pub fn sum_dim(&self, dim: usize) -> Result<TensorView> {
        let ndim = self.ndim();
        let mut out_shape = self.shape().removed(dim);
        if out_shape.is_empty() {
            out_shape.push(1);
        }
        let out = TensorView::from_shape(out_shape, self.storage.pool())?;

        let extent = self.size(dim);
        for out_idx in IndexIter::new(out.shape().clone()) {
            // Rebuild the full-rank index with `dim` reinserted.
            let mut full: Idx = SmallVec::with_capacity(ndim);
            if ndim == 1 {
                full.push(0);
            } else {
                full.extend(out_idx[..dim].iter().copied());
                full.push(0);
                full.extend(out_idx[dim..].iter().copied());
            }

            let mut acc = 0.0;
            for i in 0..extent {
                full[dim] = i;
                acc += self.eval(&full);
            }
            out.set_at(&out_idx, acc);
        }
        Ok(out)
    }

    /// Full reduction to a scalar via odometer enumeration
    pub fn sum(&self) -> Elem {
        let mut acc = 0.0;
        for idx in IndexIter::new(self.shape().clone()) {
            acc += self.eval(&idx);
        }
        acc
    }

    /// Materialize `f` into every element of this view, in odometer order
    pub fn fill_from<F: Fn(&[usize]) -> Elem>(&self, f: F) {
        for idx in IndexIter::new(self.shape().clone()) {
            self.set_at(&idx, f(&idx));
        }
    }
}

impl std::fmt::Debug for TensorView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TensorView")
            .field("shape", &self.shape().as_slice())
            .field("strides", &self.strides())
            .field("offset", &self.offset())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange(shape: &[usize], pool: &BufferPool) -> TensorView {
        let shape = Shape::from(shape);
        let data: Vec<Elem> = (0..shape.elem_count()).map(|i| i as Elem).collect();
        let storage = Storage::from_slice(&data, pool).unwrap();
        let layout = Layout::contiguous(&shape);
        TensorView::new(storage, layout)
    }

    #[test]
    fn test_eval_exact_rank() {
        let pool = BufferPool::new();
        let v = arange(&[2, 3], &pool);
        assert_eq!(v.eval(&[0, 0]), 0.0);
        assert_eq!(v.eval(&[1, 2]), 5.0);
    }

    #[test]
    fn test_eval_right_aligned_excess_indices() {
        let pool = BufferPool::new();
        let v = arange(&[3], &pool);
        // A rank-3 consumer indexing a rank-1 operand uses the trailing entry.
        assert_eq!(v.eval(&[7, 9, 2]), 2.0);
    }

    #[test]
    fn test_eval_missing_leading_indices() {
        let pool = BufferPool::new();
        let v = arange(&[2, 3], &pool);
        // Supplied indices align to the trailing dimensions; dim 0 reads 0.
        assert_eq!(v.eval(&[2]), 2.0);
    }

    #[test]
    fn test_slice_fixes_dimension() {
        let pool = BufferPool::new();
        let v = arange(&[2, 3], &pool);
        let s = v.slice(1, 0);
        assert_eq!(s.shape().as_slice(), &[1, 3]);
        assert_eq!(s.at(&[0, 0]), 3.0);
        assert_eq!(s.at(&[0, 2]), 5.0);
        // Shares storage with the source.
        assert_eq!(v.storage().ref_count(), 2);
    }

    #[test]
    fn test_sum_dim_vector_gives_unit_shape() {
        let pool = BufferPool::new();
        let v = arange(&[4], &pool);
        let s = v.sum_dim(0).unwrap();
        assert_eq!(s.shape().as_slice(), &[1]);
        assert_eq!(s.at(&[0]), 6.0);
    }

    #[test]
    fn test_sum_full() {
        let pool = BufferPool::new();
        let v = arange(&[2, 3], &pool);
        assert_eq!(v.sum(), 15.0);
    }
}
