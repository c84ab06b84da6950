//! Error types for tensr

use thiserror::Error;

/// Result type alias using tensr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tensr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Index out of bounds on checked element access
    #[error("Index {index} out of bounds for dimension {dim} of size {size}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// The dimension being indexed
        dim: usize,
        /// Size of that dimension
        size: usize,
    },

    /// Rank mismatch where exact dimensionality agreement is required
    #[error("Rank mismatch: expected {expected} dimensions, got {got}")]
    RankMismatch {
        /// Expected number of dimensions
        expected: usize,
        /// Actual number of dimensions
        got: usize,
    },

    /// Shapes cannot be broadcast together
    #[error("Cannot broadcast shapes {lhs:?} and {rhs:?}")]
    BroadcastError {
        /// Left-hand side shape
        lhs: Vec<usize>,
        /// Right-hand side shape
        rhs: Vec<usize>,
    },

    /// Invalid dimension index
    #[error("Invalid dimension {dim} for tensor with {ndim} dimensions")]
    InvalidDimension {
        /// The invalid dimension
        dim: usize,
        /// Number of dimensions
        ndim: usize,
    },

    /// Invalid slice range
    #[error("Invalid range [{start}, {end}) for dimension of size {size}")]
    InvalidRange {
        /// Range start (inclusive)
        start: usize,
        /// Range end (exclusive)
        end: usize,
        /// Size of the dimension
        size: usize,
    },

    /// Shape mismatch in an operation
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Invalid argument provided to an operation
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl Error {
    /// Create a shape mismatch error
    pub fn shape_mismatch(expected: &[usize], got: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }

    /// Create a broadcast error
    pub fn broadcast(lhs: &[usize], rhs: &[usize]) -> Self {
        Self::BroadcastError {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }
}
