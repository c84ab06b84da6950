//! Shape type: dimensions of a tensor

use smallvec::SmallVec;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// Create an empty shape.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Create an empty shape with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(SmallVec::with_capacity(capacity))
    }

    /// Push a dimension.
    pub fn push(&mut self, dim: usize) {
        self.0.push(dim);
    }

    /// Remove dimension at index.
    pub fn remove(&mut self, index: usize) -> usize {
        self.0.remove(index)
    }

    /// Swap two dimensions.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.0.swap(a, b);
    }

    /// Reverse dimension order.
    pub fn reverse(&mut self) {
        self.0.reverse();
    }

    /// View shape as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Whether this shape has zero dimensions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of elements: the product of all extents.
    #[inline]
    pub fn elem_count(&self) -> usize {
        self.0.iter().product()
    }

    /// Product of the extents in `[start, end)`.
    pub fn sub_elem_count(&self, start: usize, end: usize) -> usize {
        self.0[start..end].iter().product()
    }

    /// Copy of this shape with dimension `dim` dropped.
    ///
    /// Used for reduction results; reducing a rank-1 shape yields an empty
    /// shape, which callers substitute with `[1]`.
    pub fn removed(&self, dim: usize) -> Shape {
        let mut out = self.clone();
        out.remove(dim);
        out
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl DerefMut for Shape {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.as_mut_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elem_count() {
        let shape = Shape::from([2, 3, 4]);
        assert_eq!(shape.ndim(), 3);
        assert_eq!(shape.elem_count(), 24);
        assert_eq!(shape.sub_elem_count(1, 3), 12);
        assert_eq!(shape.sub_elem_count(2, 2), 1);
    }

    #[test]
    fn test_removed() {
        let shape = Shape::from([2, 3, 4]);
        assert_eq!(shape.removed(1).as_slice(), &[2, 4]);
        assert_eq!(shape.removed(0).as_slice(), &[3, 4]);

        let rank1 = Shape::from([5]);
        assert!(rank1.removed(0).is_empty());
    }

    #[test]
    fn test_equality() {
        assert_eq!(Shape::from([2, 3]), Shape::from(vec![2, 3]));
        assert_ne!(Shape::from([2, 3]), Shape::from([3, 2]));
        assert_ne!(Shape::from([2, 3]), Shape::from([2, 3, 1]));
    }
}
