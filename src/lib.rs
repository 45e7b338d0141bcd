//! Assembly of finite element forms into sparse linear systems.
//!
//! A [`BilinearForm`](assembly::bilinear::BilinearForm) collects element integrators for the
//! four traversal kinds (domain elements, boundary elements, interior faces and boundary
//! faces), assembles their local matrices into a global sparse matrix and eliminates
//! essential boundary conditions from the resulting system. Rectangular operators between
//! two different spaces are handled by
//! [`MixedBilinearForm`](assembly::mixed::MixedBilinearForm), and right-hand sides by
//! [`LinearForm`](assembly::linear::LinearForm).
//!
//! Meshes, basis functions and concrete physics are provided by the caller through the
//! [`FiniteElementSpace`](space::FiniteElementSpace) trait and the integrator traits in
//! [`integrator`].

pub mod assembly;
pub mod connectivity;
pub mod dof;
pub mod eliminate;
pub mod error;
pub mod integrator;
pub mod options;
pub mod space;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use weakform_sparse::{ops as sparse_ops, Real, SparseAccumulator};
