//! Human-readable tensor display

use super::core::Tensor;
use super::layout::Idx;
use std::fmt;

/// Widest rendering of any element at 4 decimal places; shared across
/// the whole tensor so columns line up.
fn value_width(tensor: &Tensor) -> usize {
    tensor
        .iter()
        .map(|v| format!("{v:.4}").len())
        .max()
        .unwrap_or(1)
}

fn fmt_level(
    f: &mut fmt::Formatter<'_>,
    tensor: &Tensor,
    idx: &mut Idx,
    dim: usize,
    width: usize,
) -> fmt::Result {
    let ndim = tensor.ndim();
    write!(f, "[")?;
    let extent = tensor.shape()[dim];
    for i in 0..extent {
        idx.push(i);
        if dim + 1 == ndim {
            let v = tensor.get(idx).map_err(|_| fmt::Error)?;
            write!(f, "{v:>width$.4}")?;
        } else {
            fmt_level(f, tensor, idx, dim + 1, width)?;
        }
        idx.pop();
        if i + 1 < extent {
            if dim + 1 == ndim {
                write!(f, ", ")?;
            } else {
                // One newline per closed bracket level, then re-indent
                // under the opening bracket of this level.
                writeln!(f, ",")?;
                for _ in dim + 2..ndim {
                    writeln!(f)?;
                }
                write!(f, "{}", " ".repeat(dim + 1))?;
            }
        }
    }
    write!(f, "]")
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = value_width(self);
        let mut idx = Idx::new();
        fmt_level(f, self, &mut idx, 0, width)
    }
}
