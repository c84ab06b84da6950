//! Lazy expression trees over tensor views
//!
//! Building an expression records operand references and an operator tag;
//! no element data is touched until the expression is materialized by
//! [`Tensor::from_expr`](crate::tensor::Tensor::from_expr) or
//! [`Tensor::assign`](crate::tensor::Tensor::assign). The result shape is
//! computed eagerly at construction so assignment can pre-size its
//! destination, and so shape violations surface where the expression is
//! written, not where it is evaluated.
//!
//! Leaves hold views that share the operand tensor's storage: expressions
//! are lazy, not snapshots. Mutating a tensor between building an
//! expression over it and materializing that expression changes the
//! materialized result.

mod ops;

pub use ops::{broadcast_shape, matmul_shape, BinaryOp, MatmulKind, UnaryOp};

use crate::error::{Error, Result};
use crate::pool::BufferPool;
use crate::tensor::{Shape, Tensor, TensorView};
use crate::Elem;
use smallvec::SmallVec;

/// A deferred arithmetic expression over tensors
///
/// Composed through the arithmetic methods on [`Tensor`] and the standard
/// operator overloads. The operators panic on shape violations; the
/// fallible constructors ([`Expr::binary`], [`Expr::matmul`]) are the
/// non-panicking path.
#[derive(Clone, Debug)]
pub struct Expr {
    kind: ExprKind,
    shape: Shape,
}

#[derive(Clone, Debug)]
enum ExprKind {
    /// A tensor operand, sharing its storage
    Leaf(TensorView),
    /// A constant, broadcast against everything
    Scalar(Elem),
    /// Elementwise binary node
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Elementwise unary node
    Unary { op: UnaryOp, arg: Box<Expr> },
    /// Matrix-product node; `inner` is the contraction extent
    Matmul {
        kind: MatmulKind,
        inner: usize,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Leaf expression over a tensor, sharing its storage
    pub fn leaf(tensor: &Tensor) -> Expr {
        let view = tensor.as_view().clone();
        let shape = view.shape().clone();
        Expr {
            kind: ExprKind::Leaf(view),
            shape,
        }
    }

    /// Scalar constant, rank 0, broadcasts against any operand
    pub fn scalar(value: Elem) -> Expr {
        Expr {
            kind: ExprKind::Scalar(value),
            shape: Shape::new(),
        }
    }

    /// Elementwise binary node; operand shapes must broadcast together
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Result<Expr> {
        let shape = ops::broadcast_shape(&lhs.shape, &rhs.shape)
            .ok_or_else(|| Error::broadcast(&lhs.shape, &rhs.shape))?;
        Ok(Expr {
            kind: ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            shape,
        })
    }

    /// Elementwise unary node; shape is the operand's
    pub fn unary(op: UnaryOp, arg: Expr) -> Expr {
        let shape = arg.shape.clone();
        Expr {
            kind: ExprKind::Unary {
                op,
                arg: Box::new(arg),
            },
            shape,
        }
    }

    /// Matrix-product node of the given variant
    pub fn matmul(kind: MatmulKind, lhs: Expr, rhs: Expr) -> Result<Expr> {
        let (shape, inner) = ops::matmul_shape(kind, &lhs.shape, &rhs.shape)?;
        Ok(Expr {
            kind: ExprKind::Matmul {
                kind,
                inner,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            shape,
        })
    }

    /// The expression's eagerly computed result shape
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Result rank
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Evaluate the expression at one multi-index
    ///
    /// A pure function of (operator, operand results, index); leaves apply
    /// the right-aligned broadcasting rule of
    /// [`TensorView::eval`](crate::tensor::TensorView::eval).
    pub fn eval(&self, idx: &[usize]) -> Elem {
        match &self.kind {
            ExprKind::Leaf(view) => view.eval(idx),
            ExprKind::Scalar(value) => *value,
            ExprKind::Binary { op, lhs, rhs } => op.apply(lhs.eval(idx), rhs.eval(idx)),
            ExprKind::Unary { op, arg } => op.apply(arg.eval(idx)),
            ExprKind::Matmul {
                inner, lhs, rhs, ..
            } => self.eval_matmul(idx, *inner, lhs, rhs),
        }
    }

    /// Contraction loop for the matmul variants
    ///
    /// The consumer index is right-aligned to this node's rank, split into
    /// batch part plus the output coordinates (i, j), and the shared inner
    /// dimension is summed over. Operands with fewer batch dimensions
    /// right-align in their own `eval`.
    fn eval_matmul(&self, idx: &[usize], inner: usize, lhs: &Expr, rhs: &Expr) -> Elem {
        let ndim = self.shape.ndim();
        let supplied = idx.len();
        let mut local: SmallVec<[usize; 4]> = SmallVec::with_capacity(ndim);
        for dim in 0..ndim {
            local.push(if dim + supplied >= ndim {
                idx[dim + supplied - ndim]
            } else {
                0
            });
        }
        let (i, j) = (local[ndim - 2], local[ndim - 1]);

        let mut lhs_idx = local.clone();
        lhs_idx[ndim - 2] = i;
        let mut rhs_idx = local;
        rhs_idx[ndim - 1] = j;

        let mut acc = 0.0;
        for k in 0..inner {
            lhs_idx[ndim - 1] = k;
            rhs_idx[ndim - 2] = k;
            acc += lhs.eval(&lhs_idx) * rhs.eval(&rhs_idx);
        }
        acc
    }

    /// Pool of the first tensor leaf, used to size materialization targets
    pub(crate) fn first_pool(&self) -> Option<BufferPool> {
        match &self.kind {
            ExprKind::Leaf(view) => Some(view.storage().pool().clone()),
            ExprKind::Scalar(_) => None,
            ExprKind::Binary { lhs, rhs, .. } | ExprKind::Matmul { lhs, rhs, .. } => {
                lhs.first_pool().or_else(|| rhs.first_pool())
            }
            ExprKind::Unary { arg, .. } => arg.first_pool(),
        }
    }

    /// Fallible addition
    pub fn add(self, rhs: Expr) -> Result<Expr> {
        Expr::binary(BinaryOp::Add, self, rhs)
    }

    /// Fallible subtraction
    pub fn sub(self, rhs: Expr) -> Result<Expr> {
        Expr::binary(BinaryOp::Sub, self, rhs)
    }

    /// Fallible multiplication
    pub fn mul(self, rhs: Expr) -> Result<Expr> {
        Expr::binary(BinaryOp::Mul, self, rhs)
    }

    /// Fallible division
    pub fn div(self, rhs: Expr) -> Result<Expr> {
        Expr::binary(BinaryOp::Div, self, rhs)
    }

    /// Elementwise negation
    pub fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }

    /// Elementwise sine
    pub fn sin(self) -> Expr {
        Expr::unary(UnaryOp::Sin, self)
    }

    /// Elementwise cosine
    pub fn cos(self) -> Expr {
        Expr::unary(UnaryOp::Cos, self)
    }

    /// Elementwise tangent
    pub fn tan(self) -> Expr {
        Expr::unary(UnaryOp::Tan, self)
    }

    /// 2-D matrix product
    pub fn mm(self, rhs: Expr) -> Result<Expr> {
        Expr::matmul(MatmulKind::Mm, self, rhs)
    }

    /// Batched 3-D matrix product
    pub fn bmm(self, rhs: Expr) -> Result<Expr> {
        Expr::matmul(MatmulKind::Bmm, self, rhs)
    }

    /// General N-D batched matrix product
    pub fn nd_matmul(self, rhs: Expr) -> Result<Expr> {
        Expr::matmul(MatmulKind::Matmul, self, rhs)
    }
}

// Operator sugar. Each overload delegates to the fallible constructors and
// panics with the error display on a shape violation; callers that need to
// recover use the Result-returning methods instead.
macro_rules! impl_binary_operators {
    ($trait:ident, $method:ident, $op:expr) => {
        impl std::ops::$trait<Expr> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl std::ops::$trait<&Tensor> for Expr {
            type Output = Expr;
            fn $method(self, rhs: &Tensor) -> Expr {
                Expr::binary($op, self, Expr::leaf(rhs)).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl std::ops::$trait<Expr> for &Tensor {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, Expr::leaf(self), rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl std::ops::$trait<&Tensor> for &Tensor {
            type Output = Expr;
            fn $method(self, rhs: &Tensor) -> Expr {
                Expr::binary($op, Expr::leaf(self), Expr::leaf(rhs))
                    .unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl std::ops::$trait<Elem> for Expr {
            type Output = Expr;
            fn $method(self, rhs: Elem) -> Expr {
                Expr::binary($op, self, Expr::scalar(rhs)).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl std::ops::$trait<Expr> for Elem {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, Expr::scalar(self), rhs).unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl std::ops::$trait<Elem> for &Tensor {
            type Output = Expr;
            fn $method(self, rhs: Elem) -> Expr {
                Expr::binary($op, Expr::leaf(self), Expr::scalar(rhs))
                    .unwrap_or_else(|e| panic!("{e}"))
            }
        }

        impl std::ops::$trait<&Tensor> for Elem {
            type Output = Expr;
            fn $method(self, rhs: &Tensor) -> Expr {
                Expr::binary($op, Expr::scalar(self), Expr::leaf(rhs))
                    .unwrap_or_else(|e| panic!("{e}"))
            }
        }
    };
}

impl_binary_operators!(Add, add, BinaryOp::Add);
impl_binary_operators!(Sub, sub, BinaryOp::Sub);
impl_binary_operators!(Mul, mul, BinaryOp::Mul);
impl_binary_operators!(Div, div, BinaryOp::Div);

impl std::ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }
}

impl std::ops::Neg for &Tensor {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, Expr::leaf(self))
    }
}
