//! Strided N-dimensional arrays.
//!
//! [`NDarray<T>`] stores elements flat in row-major order next to a shape and
//! its derived strides; every operation materializes a fresh array. The
//! [`shape`] module holds the pure planning functions (broadcast resolution,
//! reshape inference, reduction and contraction plans) and is usable on its
//! own. Element semantics come from the scalar kernel the array is
//! instantiated with, see [`ag_kernel::NumKernel`].

mod array;
mod error;
mod fmt;
mod ops;
pub mod shape;

pub use array::NDarray;
pub use error::{NdError, NdResult};

pub use ag_kernel::{KernelError, NumKernel};
