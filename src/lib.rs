//! tensr: a small strided tensor library with lazy expression evaluation
//! and pooled buffer allocation
//!
//! Three pieces fit together:
//!
//! - [`tensor::Tensor`]: an N-dimensional array over shared, refcounted
//!   storage. Slicing, transposition, reshaping, and permutation are
//!   zero-copy layout transforms over the same buffer.
//! - [`expr::Expr`]: arithmetic on tensors builds a lazy expression tree
//!   instead of computing immediately. Shapes are checked and broadcast
//!   eagerly at construction; element values are computed only when the
//!   expression is materialized with [`tensor::Tensor::from_expr`] or
//!   [`tensor::Tensor::assign`], one destination element at a time and
//!   without operand temporaries.
//! - [`pool::BufferPool`]: a caching allocator that recycles freed
//!   buffers by size class, so repeated materializations of same-shaped
//!   intermediates hit the free list instead of the system allocator.
//!
//! ```
//! use tensr::prelude::*;
//!
//! let pool = BufferPool::new();
//! let x = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3], &pool)?;
//! let w = Tensor::ones(&[3, 2], &pool)?;
//!
//! // Lazy: nothing is computed here.
//! let expr = x.mm(&w)? + 0.5;
//!
//! // Materialized in one pass.
//! let y = Tensor::from_expr(&expr)?;
//! assert_eq!(y.shape(), &[2, 2]);
//! assert_eq!(y.get(&[0, 0])?, 6.5);
//! # Ok::<(), tensr::error::Error>(())
//! ```
//!
//! Validation lives at the `Tensor` facade and can be compiled out with
//! the `unchecked` cargo feature once call sites are trusted.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod expr;
pub mod pool;
pub mod tensor;

/// Element scalar type used throughout the crate
pub type Elem = f64;

/// Convenience re-exports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::expr::Expr;
    pub use crate::pool::BufferPool;
    pub use crate::tensor::Tensor;
    pub use crate::Elem;
}
