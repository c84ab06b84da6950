//! Strided N-dimensional tensors over pooled storage
//!
//! Layering, bottom to top:
//! - [`Storage`]: shared, refcounted element buffer drawn from a pool
//! - [`Shape`] / [`Strides`] / [`Layout`]: the strided index map
//! - [`TensorView`]: unchecked storage + layout pair with the
//!   zero-copy transforms and broadcast-aware evaluation
//! - [`Tensor`]: the checked public facade

mod core;
mod format;
mod iter;
mod layout;
mod shape;
mod storage;
mod strides;
mod view;

pub use self::core::Tensor;
pub use iter::Iter;
pub use layout::Layout;
pub use shape::Shape;
pub use storage::Storage;
pub use strides::Strides;
pub use view::TensorView;
