//! Layout: shape, strides, and offset for tensor memory layout

use super::shape::{Shape, STACK_DIMS};
use super::strides::Strides;
use smallvec::SmallVec;
use std::fmt;

/// A multi-index into a tensor, stack-allocated for the common ranks.
pub(crate) type Idx = SmallVec<[usize; STACK_DIMS]>;

/// Layout describes how a view addresses the elements of a shared buffer
///
/// Address of the element at indices `[i0, i1, ..., in]`:
///   `offset + i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]`
///
/// Extent-1 dimensions carry stride 0, so broadcasting along them is a
/// no-op read. This layer performs no bounds checking; validation lives in
/// the `Tensor` facade.
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shape: size along each dimension
    shape: Shape,
    /// Strides: offset (in elements) between consecutive elements along each dimension
    strides: Strides,
    /// Offset: starting element index in the underlying storage
    offset: usize,
}

impl Layout {
    /// Create a new contiguous (row-major/C-order) layout from a shape
    pub fn contiguous(shape: &Shape) -> Self {
        let strides = Self::compute_contiguous_strides(shape);
        Self {
            shape: shape.clone(),
            strides,
            offset: 0,
        }
    }

    /// Create a layout with explicit shape, strides, and offset
    pub fn new(shape: Shape, strides: Strides, offset: usize) -> Self {
        debug_assert_eq!(shape.ndim(), strides.len());
        Self {
            shape,
            strides,
            offset,
        }
    }

    /// Compute contiguous strides for a shape (row-major order)
    ///
    /// Extent-1 dimensions get stride 0 rather than their row-major step,
    /// making them broadcasting axes from the moment of construction.
    fn compute_contiguous_strides(shape: &[usize]) -> Strides {
        let mut strides = Strides::with_capacity(shape.len());
        let mut step = 1isize;
        for &dim in shape.iter().rev() {
            strides.push(if dim == 1 { 0 } else { step });
            step *= dim as isize;
        }
        strides.reverse();
        strides
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        &self.strides
    }

    /// Get the offset
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Check if the strides match the default row-major layout for the shape
    pub fn is_contiguous(&self) -> bool {
        self.strides == Self::compute_contiguous_strides(&self.shape)
    }

    /// Compute the linear storage index for a full multi-index. Unchecked.
    #[inline]
    pub fn index_unchecked(&self, idx: &[usize]) -> usize {
        let mut linear = self.offset as isize;
        for (&i, &stride) in idx.iter().zip(self.strides.iter()) {
            linear += i as isize * stride;
        }
        linear as usize
    }

    /// Fix dimension `dim` to `index`: extent becomes 1, stride becomes 0,
    /// and the offset advances past the skipped elements.
    pub fn select(&self, dim: usize, index: usize) -> Self {
        let mut out = self.clone();
        out.offset = (out.offset as isize + index as isize * self.strides[dim]) as usize;
        out.shape[dim] = 1;
        out.strides[dim] = 0;
        out
    }

    /// Restrict dimension `dim` to the sub-range `[start, end)`. The stride
    /// is unchanged; only the extent shrinks and the offset advances.
    pub fn narrow(&self, dim: usize, start: usize, end: usize) -> Self {
        let mut out = self.clone();
        out.offset = (out.offset as isize + start as isize * self.strides[dim]) as usize;
        out.shape[dim] = end - start;
        out
    }

    /// Swap two dimensions' extents and strides; same offset.
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Self {
        let mut out = self.clone();
        out.shape.swap(dim0, dim1);
        out.strides.swap(dim0, dim1);
        out
    }

    /// Reorder dimensions so output dimension `i` is input dimension
    /// `order[i]`, extent and stride both taken from the source dimension.
    pub fn permute(&self, order: &[usize]) -> Self {
        let shape: Shape = order.iter().map(|&d| self.shape[d]).collect();
        let strides: Strides = order.iter().map(|&d| self.strides[d]).collect();
        Self::new(shape, strides, self.offset)
    }

    /// Reinterpret the same storage under a new shape with fresh contiguous
    /// strides. Element-count equality is the caller's responsibility.
    pub fn reshaped(&self, shape: &Shape) -> Self {
        Self {
            shape: shape.clone(),
            strides: Self::compute_contiguous_strides(shape),
            offset: self.offset,
        }
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layout {{ shape: {:?}, strides: {:?}, offset: {} }}",
            self.shape.as_slice(),
            self.strides.as_slice(),
            self.offset
        )
    }
}

/// Odometer enumeration of every multi-index of a shape, row-major: the
/// last dimension increments fastest, carrying into more significant
/// dimensions on overflow.
pub(crate) struct IndexIter {
    shape: Shape,
    next: Option<Idx>,
}

impl IndexIter {
    pub(crate) fn new(shape: Shape) -> Self {
        let start: Idx = shape.iter().map(|_| 0).collect();
        Self {
            shape,
            next: Some(start),
        }
    }
}

impl Iterator for IndexIter {
    type Item = Idx;

    fn next(&mut self) -> Option<Idx> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        for dim in (0..succ.len()).rev() {
            succ[dim] += 1;
            if succ[dim] < self.shape[dim] {
                self.next = Some(succ);
                return Some(current);
            }
            succ[dim] = 0;
        }
        // Wrapped past the most significant dimension: enumeration is done.
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous(&Shape::from([2, 3, 4]));
        assert_eq!(layout.shape().as_slice(), &[2, 3, 4]);
        assert_eq!(layout.strides(), &[12, 4, 1]);
        assert_eq!(layout.elem_count(), 24);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_contiguous_unit_dims_get_stride_zero() {
        let layout = Layout::contiguous(&Shape::from([1, 3, 1]));
        assert_eq!(layout.strides(), &[0, 1, 0]);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn test_transpose() {
        let layout = Layout::contiguous(&Shape::from([2, 3, 4]));
        let transposed = layout.transpose(1, 2);
        assert_eq!(transposed.shape().as_slice(), &[2, 4, 3]);
        assert_eq!(transposed.strides(), &[12, 1, 4]);
        assert!(!transposed.is_contiguous());
        // Involution restores the original.
        assert_eq!(transposed.transpose(1, 2), layout);
    }

    #[test]
    fn test_select() {
        let layout = Layout::contiguous(&Shape::from([2, 3, 4]));
        let sliced = layout.select(1, 2);
        assert_eq!(sliced.shape().as_slice(), &[2, 1, 4]);
        assert_eq!(sliced.strides(), &[12, 0, 1]);
        assert_eq!(sliced.offset(), 8);
    }

    #[test]
    fn test_narrow() {
        let layout = Layout::contiguous(&Shape::from([2, 3, 4]));
        let narrowed = layout.narrow(2, 1, 3);
        assert_eq!(narrowed.shape().as_slice(), &[2, 3, 2]);
        assert_eq!(narrowed.strides(), &[12, 4, 1]);
        assert_eq!(narrowed.offset(), 1);
    }

    #[test]
    fn test_permute() {
        let layout = Layout::contiguous(&Shape::from([2, 3, 4]));
        let permuted = layout.permute(&[2, 0, 1]);
        assert_eq!(permuted.shape().as_slice(), &[4, 2, 3]);
        assert_eq!(permuted.strides(), &[1, 12, 4]);
    }

    #[test]
    fn test_index_unchecked() {
        let layout = Layout::contiguous(&Shape::from([2, 3]));
        assert_eq!(layout.index_unchecked(&[0, 0]), 0);
        assert_eq!(layout.index_unchecked(&[0, 2]), 2);
        assert_eq!(layout.index_unchecked(&[1, 0]), 3);
        assert_eq!(layout.index_unchecked(&[1, 2]), 5);
    }

    #[test]
    fn test_index_iter_row_major() {
        let order: Vec<Vec<usize>> = IndexIter::new(Shape::from([2, 3]))
            .map(|idx| idx.to_vec())
            .collect();
        assert_eq!(
            order,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn test_index_iter_count() {
        assert_eq!(IndexIter::new(Shape::from([2, 3, 4])).count(), 24);
        assert_eq!(IndexIter::new(Shape::from([1])).count(), 1);
    }
}
