//! Core Tensor type: the checked public facade

use super::iter::Iter;
use super::layout::Layout;
use super::shape::Shape;
use super::storage::Storage;
use super::view::TensorView;
use crate::error::{Error, Result};
use crate::expr::{Expr, MatmulKind};
use crate::pool::BufferPool;
use crate::Elem;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// N-dimensional array over a pooled, shared element buffer
///
/// `Tensor` owns exactly one strided view. Shape-transforming operations
/// (`slice`, `transpose`, `view`, `permute`) derive a new view over the
/// same storage, so they are zero-copy; `Clone` likewise shares storage.
/// Arithmetic builds lazy [`Expr`] trees that materialize on
/// [`Tensor::from_expr`] or [`Tensor::assign`].
///
/// All index and dimension arguments are validated here, at the facade;
/// the view layer underneath is unchecked. Building with the `unchecked`
/// feature compiles the validation out.
///
/// # Example
///
/// ```
/// use tensr::prelude::*;
///
/// let pool = BufferPool::new();
/// let a = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], &[2, 2], &pool)?;
/// let b = Tensor::ones(&[2, 2], &pool)?;
/// let sum = Tensor::from_expr(&(&a + &b))?;
/// assert_eq!(sum.get(&[1, 1])?, 5.0);
/// # Ok::<(), tensr::error::Error>(())
/// ```
pub struct Tensor {
    view: TensorView,
}

impl Tensor {
    // ===== Construction =====

    /// Create a zero-filled tensor of the given shape
    pub fn new(shape: &[usize], pool: &BufferPool) -> Result<Self> {
        check_extents(shape)?;
        let view = TensorView::from_shape(Shape::from(shape), pool)?;
        Ok(Self { view })
    }

    /// Create a tensor copy-initialized from a slice of elements
    ///
    /// `data.len()` must equal the product of the shape's extents.
    pub fn from_slice(data: &[Elem], shape: &[usize], pool: &BufferPool) -> Result<Self> {
        check_extents(shape)?;
        let shape = Shape::from(shape);
        if data.len() != shape.elem_count() {
            return Err(Error::ShapeMismatch {
                expected: shape.as_slice().to_vec(),
                got: vec![data.len()],
            });
        }
        let storage = Storage::from_slice(data, pool)?;
        let layout = Layout::contiguous(&shape);
        Ok(Self {
            view: TensorView::new(storage, layout),
        })
    }

    /// Create a tensor filled with a scalar value
    pub fn full(shape: &[usize], value: Elem, pool: &BufferPool) -> Result<Self> {
        check_extents(shape)?;
        let shape = Shape::from(shape);
        let storage = Storage::filled(shape.elem_count(), value, pool)?;
        let layout = Layout::contiguous(&shape);
        Ok(Self {
            view: TensorView::new(storage, layout),
        })
    }

    /// Wrap an existing view (internal composition)
    pub(crate) fn from_view(view: TensorView) -> Self {
        Self { view }
    }

    /// Create a tensor filled with zeros
    pub fn zeros(shape: &[usize], pool: &BufferPool) -> Result<Self> {
        Self::new(shape, pool)
    }

    /// Create a tensor filled with ones
    pub fn ones(shape: &[usize], pool: &BufferPool) -> Result<Self> {
        Self::full(shape, 1.0, pool)
    }

    /// Create a tensor of uniform random values in [0, 1)
    pub fn rand(shape: &[usize], pool: &BufferPool) -> Result<Self> {
        let tensor = Self::new(shape, pool)?;
        let mut rng = rand::rng();
        for i in 0..tensor.numel() {
            tensor.view.set_item(i, rng.random::<Elem>());
        }
        Ok(tensor)
    }

    /// Create a tensor of standard-normal random values
    pub fn randn(shape: &[usize], pool: &BufferPool) -> Result<Self> {
        let tensor = Self::new(shape, pool)?;
        let mut rng = rand::rng();
        for i in 0..tensor.numel() {
            let v: Elem = StandardNormal.sample(&mut rng);
            tensor.view.set_item(i, v);
        }
        Ok(tensor)
    }

    /// Zero-filled tensor with `other`'s shape, drawn from `other`'s pool
    pub fn zeros_like(other: &Tensor) -> Result<Self> {
        Self::zeros(other.shape(), other.pool())
    }

    /// One-filled tensor with `other`'s shape, drawn from `other`'s pool
    pub fn ones_like(other: &Tensor) -> Result<Self> {
        Self::ones(other.shape(), other.pool())
    }

    /// Uniform-random tensor with `other`'s shape, drawn from `other`'s pool
    pub fn rand_like(other: &Tensor) -> Result<Self> {
        Self::rand(other.shape(), other.pool())
    }

    /// Normal-random tensor with `other`'s shape, drawn from `other`'s pool
    pub fn randn_like(other: &Tensor) -> Result<Self> {
        Self::randn(other.shape(), other.pool())
    }

    /// Materialize an expression into a fresh tensor
    ///
    /// The tensor is sized to the expression's eagerly computed shape and
    /// allocated from the pool of the expression's first tensor operand.
    /// Every destination element is evaluated in odometer order.
    pub fn from_expr(expr: &Expr) -> Result<Self> {
        let pool = expr.first_pool().ok_or_else(|| {
            Error::invalid_argument("expr", "expression has no tensor operand")
        })?;
        let out = Self::new(expr.shape(), &pool)?;
        out.view.fill_from(|idx| expr.eval(idx));
        Ok(out)
    }

    // ===== Accessors =====

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.view.shape()
    }

    /// Get the strides
    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.view.strides()
    }

    /// Get the number of dimensions (rank)
    #[inline]
    pub fn ndim(&self) -> usize {
        self.view.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.view.numel()
    }

    /// Get this tensor's element offset into its shared storage
    #[inline]
    pub fn offset(&self) -> usize {
        self.view.offset()
    }

    /// Extent of dimension `dim`
    pub fn size(&self, dim: usize) -> Result<usize> {
        self.check_dim(dim)?;
        Ok(self.view.size(dim))
    }

    /// Check if the tensor is contiguous in memory
    #[inline]
    pub fn is_contiguous(&self) -> bool {
        self.view.is_contiguous()
    }

    /// The pool this tensor's storage was drawn from
    #[inline]
    pub fn pool(&self) -> &BufferPool {
        self.view.storage().pool()
    }

    /// The underlying strided view
    #[inline]
    pub fn as_view(&self) -> &TensorView {
        &self.view
    }

    // ===== Element access =====

    /// Read the element at a multi-index, bounds-checked
    pub fn get(&self, idx: &[usize]) -> Result<Elem> {
        self.check_index(idx)?;
        Ok(self.view.at(idx))
    }

    /// Write the element at a multi-index, bounds-checked
    pub fn set(&mut self, idx: &[usize], value: Elem) -> Result<()> {
        self.check_index(idx)?;
        self.view.set_at(idx, value);
        Ok(())
    }

    /// Extract the scalar value of a single-element tensor
    pub fn item(&self) -> Result<Elem> {
        if self.numel() != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![1],
                got: self.shape().to_vec(),
            });
        }
        Ok(self.view.item(0))
    }

    /// Raw flat element read at local offset `i`, relative to this view's
    /// offset. Not bounds-checked against the view's shape.
    #[inline]
    pub fn item_at(&self, i: usize) -> Elem {
        self.view.item(i)
    }

    /// Raw flat element write at local offset `i`. Not bounds-checked
    /// against the view's shape.
    #[inline]
    pub fn set_item_at(&mut self, i: usize, value: Elem) {
        self.view.set_item(i, value);
    }

    // ===== View operations (zero-copy) =====

    /// Fix dimension `dim` to `index` (zero-copy slice)
    ///
    /// The result keeps the rank: the sliced dimension has extent 1 and
    /// stride 0, making it a broadcasting axis.
    pub fn slice(&self, index: usize, dim: usize) -> Result<Self> {
        self.check_dim(dim)?;
        if !cfg!(feature = "unchecked") && index >= self.view.size(dim) {
            return Err(Error::IndexOutOfBounds {
                index,
                dim,
                size: self.view.size(dim),
            });
        }
        Ok(Self::from_view(self.view.slice(index, dim)))
    }

    /// Restrict dimension `dim` to `[start, end)` (zero-copy slice)
    pub fn slice_range(&self, start: usize, end: usize, dim: usize) -> Result<Self> {
        self.check_dim(dim)?;
        let size = self.view.size(dim);
        if !cfg!(feature = "unchecked") && (start >= end || end > size) {
            return Err(Error::InvalidRange { start, end, size });
        }
        Ok(Self::from_view(self.view.slice_range(start, end, dim)))
    }

    /// Swap two dimensions (zero-copy)
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self> {
        self.check_dim(dim0)?;
        self.check_dim(dim1)?;
        Ok(Self::from_view(self.view.transpose(dim0, dim1)))
    }

    /// Reinterpret the storage under a new shape (zero-copy)
    ///
    /// The new shape's element count must equal this tensor's.
    pub fn view(&self, shape: &[usize]) -> Result<Self> {
        check_extents(shape)?;
        let shape = Shape::from(shape);
        if !cfg!(feature = "unchecked") && shape.elem_count() != self.numel() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                got: shape.as_slice().to_vec(),
            });
        }
        Ok(Self::from_view(self.view.view(&shape)))
    }

    /// Reorder dimensions so output dimension `i` is input dimension
    /// `order[i]` (zero-copy)
    pub fn permute(&self, order: &[usize]) -> Result<Self> {
        if !cfg!(feature = "unchecked") {
            if order.len() != self.ndim() {
                return Err(Error::RankMismatch {
                    expected: self.ndim(),
                    got: order.len(),
                });
            }
            let mut seen = vec![false; self.ndim()];
            for &dim in order {
                if dim >= self.ndim() {
                    return Err(Error::InvalidDimension {
                        dim,
                        ndim: self.ndim(),
                    });
                }
                if seen[dim] {
                    return Err(Error::invalid_argument(
                        "order",
                        format!("dimension {dim} appears more than once"),
                    ));
                }
                seen[dim] = true;
            }
        }
        Ok(Self::from_view(self.view.permute(order)))
    }

    // ===== Reductions =====

    /// Sum over dimension `dim`, removing it from the result shape
    /// (a vector reduces to shape `[1]`)
    pub fn sum_dim(&self, dim: usize) -> Result<Self> {
        self.check_dim(dim)?;
        Ok(Self::from_view(self.view.sum_dim(dim)?))
    }

    /// Sum of every element
    pub fn sum(&self) -> Elem {
        self.view.sum()
    }

    // ===== Lazy arithmetic =====

    /// Leaf expression over this tensor, sharing its storage
    pub fn expr(&self) -> Expr {
        Expr::leaf(self)
    }

    /// Lazy elementwise addition with broadcasting
    pub fn add(&self, other: &Tensor) -> Result<Expr> {
        self.expr().add(other.expr())
    }

    /// Lazy elementwise subtraction with broadcasting
    pub fn sub(&self, other: &Tensor) -> Result<Expr> {
        self.expr().sub(other.expr())
    }

    /// Lazy elementwise multiplication with broadcasting
    pub fn mul(&self, other: &Tensor) -> Result<Expr> {
        self.expr().mul(other.expr())
    }

    /// Lazy elementwise division with broadcasting
    pub fn div(&self, other: &Tensor) -> Result<Expr> {
        self.expr().div(other.expr())
    }

    /// Lazy elementwise negation
    pub fn neg(&self) -> Expr {
        self.expr().neg()
    }

    /// Lazy elementwise sine
    pub fn sin(&self) -> Expr {
        self.expr().sin()
    }

    /// Lazy elementwise cosine
    pub fn cos(&self) -> Expr {
        self.expr().cos()
    }

    /// Lazy elementwise tangent
    pub fn tan(&self) -> Expr {
        self.expr().tan()
    }

    /// Lazy 2-D matrix product
    pub fn mm(&self, other: &Tensor) -> Result<Expr> {
        Expr::matmul(MatmulKind::Mm, self.expr(), other.expr())
    }

    /// Lazy batched 3-D matrix product
    pub fn bmm(&self, other: &Tensor) -> Result<Expr> {
        Expr::matmul(MatmulKind::Bmm, self.expr(), other.expr())
    }

    /// Lazy general N-D matrix product with batch broadcasting
    pub fn matmul(&self, other: &Tensor) -> Result<Expr> {
        Expr::matmul(MatmulKind::Matmul, self.expr(), other.expr())
    }

    // ===== Materialization =====

    /// Materialize an expression into this tensor's existing storage
    ///
    /// Shapes must already match exactly; expression assignment never
    /// resizes its destination.
    pub fn assign(&mut self, expr: &Expr) -> Result<()> {
        if self.view.shape() != expr.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape().to_vec(),
                got: expr.shape().as_slice().to_vec(),
            });
        }
        self.view.fill_from(|idx| expr.eval(idx));
        Ok(())
    }

    /// Replace this tensor's contents with a deep copy of `other`
    ///
    /// Fresh storage is allocated and every element copied; the result
    /// never aliases `other`.
    pub fn copy_from(&mut self, other: &Tensor) -> Result<()> {
        let shape = Shape::from(other.shape());
        let storage = Storage::zeroed(shape.elem_count(), other.pool())?;
        let view = TensorView::new(storage, Layout::contiguous(&shape));
        view.fill_from(|idx| other.view.at(idx));
        self.view = view;
        Ok(())
    }

    // ===== Iteration =====

    /// Bidirectional iterator over elements in row-major order
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(&self.view)
    }

    // ===== Validation =====

    fn check_dim(&self, dim: usize) -> Result<()> {
        if cfg!(feature = "unchecked") {
            return Ok(());
        }
        if dim >= self.ndim() {
            return Err(Error::InvalidDimension {
                dim,
                ndim: self.ndim(),
            });
        }
        Ok(())
    }

    fn check_index(&self, idx: &[usize]) -> Result<()> {
        if cfg!(feature = "unchecked") {
            return Ok(());
        }
        if idx.len() != self.ndim() {
            return Err(Error::RankMismatch {
                expected: self.ndim(),
                got: idx.len(),
            });
        }
        for (dim, (&index, &size)) in idx.iter().zip(self.shape().iter()).enumerate() {
            if index >= size {
                return Err(Error::IndexOutOfBounds { index, dim, size });
            }
        }
        Ok(())
    }
}

/// Live tensors have rank >= 1 and every extent >= 1; an extent-1
/// dimension is a valid broadcasting axis, an extent-0 one is not.
fn check_extents(shape: &[usize]) -> Result<()> {
    if cfg!(feature = "unchecked") {
        return Ok(());
    }
    if shape.is_empty() {
        return Err(Error::invalid_argument("shape", "rank must be at least 1"));
    }
    if let Some(pos) = shape.iter().position(|&d| d == 0) {
        return Err(Error::invalid_argument(
            "shape",
            format!("dimension {pos} has extent 0"),
        ));
    }
    Ok(())
}

impl Clone for Tensor {
    /// Clone copies the view triple but shares the underlying storage
    /// (zero-copy). Use [`Tensor::copy_from`] for a deep copy.
    fn clone(&self) -> Self {
        Self {
            view: self.view.clone(),
        }
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("strides", &self.strides())
            .field("contiguous", &self.is_contiguous())
            .finish()
    }
}

impl<'a> IntoIterator for &'a Tensor {
    type Item = Elem;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
