//! Reverse-mode automatic differentiation over [`ag_ndarray`] arrays.
//!
//! Expressions are built from [`Function`] handles; `forward` recomputes
//! values bottom-up and `backward` pushes gradients top-down, summing where
//! the graph fans out or a forward broadcast has to fold back.

mod finite_diff;
mod function;

pub use finite_diff::central_diff;
pub use function::Function;
