//! Sparse matrix functionality for `weakform`.
//!
//! The central type is [`SparseAccumulator`], a global matrix that accepts repeated additive
//! insertion of dense blocks and is later compacted into a [`CsrMatrix`]. The [`ops`] module
//! contains the handful of CSR kernels needed by form assembly and boundary condition
//! elimination.

use nalgebra::RealField;

pub use nalgebra;
pub use nalgebra_sparse;
pub use nalgebra_sparse::CsrMatrix;

mod accumulator;
pub mod ops;

pub use accumulator::*;

/// Scalar type used throughout assembly.
pub trait Real: RealField + Copy + Send + Sync {}

impl<T: RealField + Copy + Send + Sync> Real for T {}
