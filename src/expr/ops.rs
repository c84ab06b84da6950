//! Operator catalog and shape rules for lazy expressions

use crate::error::{Error, Result};
use crate::tensor::Shape;
use crate::Elem;

/// Binary elementwise operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// Addition: a + b
    Add,
    /// Subtraction: a - b
    Sub,
    /// Multiplication: a * b
    Mul,
    /// Division: a / b
    Div,
}

impl BinaryOp {
    /// Apply the operation to two scalars
    #[inline]
    pub fn apply(self, lhs: Elem, rhs: Elem) -> Elem {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }
}

/// Unary elementwise operation kind
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// Negation: -a
    Neg,
    /// Sine: sin(a)
    Sin,
    /// Cosine: cos(a)
    Cos,
    /// Tangent: tan(a)
    Tan,
}

impl UnaryOp {
    /// Apply the operation to a scalar
    #[inline]
    pub fn apply(self, v: Elem) -> Elem {
        match self {
            UnaryOp::Neg => -v,
            UnaryOp::Sin => v.sin(),
            UnaryOp::Cos => v.cos(),
            UnaryOp::Tan => v.tan(),
        }
    }
}

/// Matrix-product variant
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MatmulKind {
    /// Pure 2-D matrix product
    Mm,
    /// Batched 3-D matrix product, batch dimension preserved
    Bmm,
    /// General N-D product: leading dimensions broadcast, trailing two contract
    Matmul,
}

/// Compute the broadcast shape of two shapes
///
/// Shapes are compared from the trailing dimension backward; a pair is
/// compatible when the extents are equal or either is 1, and missing
/// leading dimensions count as extent 1. Returns None when incompatible.
pub fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Shape> {
    let max_ndim = a.len().max(b.len());
    let mut result = Shape::with_capacity(max_ndim);

    for i in 0..max_ndim {
        let a_dim = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let b_dim = if i < b.len() { b[b.len() - 1 - i] } else { 1 };

        if a_dim == b_dim {
            result.push(a_dim);
        } else if a_dim == 1 {
            result.push(b_dim);
        } else if b_dim == 1 {
            result.push(a_dim);
        } else {
            return None; // Incompatible shapes
        }
    }

    result.reverse();
    Some(result)
}

/// Validate operand shapes for a matrix product and compute the result
/// shape plus the contraction extent
pub fn matmul_shape(kind: MatmulKind, a: &[usize], b: &[usize]) -> Result<(Shape, usize)> {
    match kind {
        MatmulKind::Mm => {
            require_rank(a, 2)?;
            require_rank(b, 2)?;
            if a[1] != b[0] {
                return Err(Error::shape_mismatch(a, b));
            }
            Ok((Shape::from([a[0], b[1]]), a[1]))
        }
        MatmulKind::Bmm => {
            require_rank(a, 3)?;
            require_rank(b, 3)?;
            if a[0] != b[0] || a[2] != b[1] {
                return Err(Error::shape_mismatch(a, b));
            }
            Ok((Shape::from([a[0], a[1], b[2]]), a[2]))
        }
        MatmulKind::Matmul => {
            if a.len() < 2 {
                return Err(Error::RankMismatch {
                    expected: 2,
                    got: a.len(),
                });
            }
            if b.len() < 2 {
                return Err(Error::RankMismatch {
                    expected: 2,
                    got: b.len(),
                });
            }
            let (m, inner) = (a[a.len() - 2], a[a.len() - 1]);
            let (b_inner, n) = (b[b.len() - 2], b[b.len() - 1]);
            if inner != b_inner {
                return Err(Error::shape_mismatch(a, b));
            }
            let mut shape = broadcast_shape(&a[..a.len() - 2], &b[..b.len() - 2])
                .ok_or_else(|| Error::broadcast(a, b))?;
            shape.push(m);
            shape.push(n);
            Ok((shape, inner))
        }
    }
}

fn require_rank(shape: &[usize], rank: usize) -> Result<()> {
    if shape.len() != rank {
        return Err(Error::RankMismatch {
            expected: rank,
            got: shape.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(
            broadcast_shape(&[3, 1], &[1, 4]),
            Some(Shape::from([3, 4]))
        );
        assert_eq!(
            broadcast_shape(&[2, 3, 4], &[3, 4]),
            Some(Shape::from([2, 3, 4]))
        );
        assert_eq!(broadcast_shape(&[4], &[2, 3, 4]), Some(Shape::from([2, 3, 4])));
        assert_eq!(broadcast_shape(&[], &[2, 2]), Some(Shape::from([2, 2])));
        assert_eq!(broadcast_shape(&[3], &[4]), None);
        assert_eq!(broadcast_shape(&[2, 8], &[3, 4]), None);
    }

    #[test]
    fn test_broadcast_shape_commutes() {
        assert_eq!(
            broadcast_shape(&[2, 1, 4], &[3, 1]),
            broadcast_shape(&[3, 1], &[2, 1, 4])
        );
    }

    #[test]
    fn test_mm_shape() {
        let (shape, inner) = matmul_shape(MatmulKind::Mm, &[2, 3], &[3, 4]).unwrap();
        assert_eq!(shape.as_slice(), &[2, 4]);
        assert_eq!(inner, 3);

        assert!(matmul_shape(MatmulKind::Mm, &[2, 3], &[4, 2]).is_err());
        assert!(matmul_shape(MatmulKind::Mm, &[2, 3, 4], &[4, 2]).is_err());
    }

    #[test]
    fn test_bmm_shape() {
        let (shape, inner) = matmul_shape(MatmulKind::Bmm, &[5, 2, 3], &[5, 3, 4]).unwrap();
        assert_eq!(shape.as_slice(), &[5, 2, 4]);
        assert_eq!(inner, 3);

        assert!(matmul_shape(MatmulKind::Bmm, &[5, 2, 3], &[6, 3, 4]).is_err());
    }

    #[test]
    fn test_matmul_shape_broadcasts_batch() {
        let (shape, inner) = matmul_shape(MatmulKind::Matmul, &[1, 2], &[5, 2, 1]).unwrap();
        assert_eq!(shape.as_slice(), &[5, 1, 1]);
        assert_eq!(inner, 2);

        let (shape, _) = matmul_shape(MatmulKind::Matmul, &[7, 1, 2, 3], &[4, 3, 5]).unwrap();
        assert_eq!(shape.as_slice(), &[7, 4, 2, 5]);
    }
}
