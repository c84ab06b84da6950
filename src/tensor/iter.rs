//! Row-major element iteration over strided views

use super::layout::Idx;
use super::view::TensorView;
use crate::Elem;

/// Double-ended, exact-size iterator over a tensor's elements in
/// row-major (last dimension fastest) order
///
/// Works directly on the view's layout, so it visits non-contiguous
/// tensors (transposed, sliced, permuted) in their logical order.
pub struct Iter<'a> {
    view: &'a TensorView,
    front: Idx,
    back: Idx,
    remaining: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(view: &'a TensorView) -> Self {
        let ndim = view.ndim();
        let mut front = Idx::with_capacity(ndim);
        let mut back = Idx::with_capacity(ndim);
        for dim in 0..ndim {
            front.push(0);
            back.push(view.size(dim) - 1);
        }
        Self {
            view,
            front,
            back,
            remaining: view.numel(),
        }
    }

    /// Advance `idx` to the next row-major position, wrapping the
    /// trailing dimensions like an odometer.
    fn increment(&mut self) {
        for dim in (0..self.front.len()).rev() {
            self.front[dim] += 1;
            if self.front[dim] < self.view.size(dim) {
                return;
            }
            self.front[dim] = 0;
        }
    }

    fn decrement(&mut self) {
        for dim in (0..self.back.len()).rev() {
            if self.back[dim] > 0 {
                self.back[dim] -= 1;
                return;
            }
            self.back[dim] = self.view.size(dim) - 1;
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = Elem;

    fn next(&mut self) -> Option<Elem> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.view.at(&self.front);
        self.increment();
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Elem> {
        if self.remaining == 0 {
            return None;
        }
        let value = self.view.at(&self.back);
        self.decrement();
        self.remaining -= 1;
        Some(value)
    }
}

impl ExactSizeIterator for Iter<'_> {}
