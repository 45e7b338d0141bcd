//! Scatter of local (element-level) quantities into global ones.
//!
//! Every function here honors the orientation of [`SignedDof`]s: a local matrix entry `(a, b)`
//! is scattered as `sign_a * sign_b * local[(a, b)]`, a local vector entry `a` as
//! `sign_a * local[a]`.
use crate::dof::SignedDof;
use crate::Real;
use nalgebra::base::storage::Storage;
use nalgebra::{DVector, Dim, Matrix, U1};
use weakform_sparse::SparseAccumulator;

/// Adds a local matrix into the global accumulator at `test_dofs x trial_dofs`.
///
/// Entries are always added, never overwritten. If `skip_zeros` is set, entries that are
/// exactly zero after applying the orientation signs are not stored.
///
/// # Panics
///
/// Panics if the local matrix does not have dimensions `test_dofs.len() x trial_dofs.len()`,
/// or if a DOF is out of bounds for the accumulator.
pub fn scatter_local_to_global<T, R, C, S>(
    accumulator: &mut SparseAccumulator<T>,
    test_dofs: &[SignedDof],
    trial_dofs: &[SignedDof],
    local: &Matrix<T, R, C, S>,
    skip_zeros: bool,
) where
    T: Real,
    R: Dim,
    C: Dim,
    S: Storage<T, R, C>,
{
    assert_eq!(local.nrows(), test_dofs.len(), "Local matrix rows must match test DOFs.");
    assert_eq!(local.ncols(), trial_dofs.len(), "Local matrix columns must match trial DOFs.");

    for (b, trial) in trial_dofs.iter().enumerate() {
        let trial_sign: T = trial.sign();
        for (a, test) in test_dofs.iter().enumerate() {
            let value = test.sign::<T>() * trial_sign * local[(a, b)];
            if !(skip_zeros && value == T::zero()) {
                accumulator.add_entry(test.index(), trial.index(), value);
            }
        }
    }
}

/// Adds a local vector into a global vector at the given DOFs.
///
/// # Panics
///
/// Panics if the lengths do not match or a DOF is out of bounds.
pub fn scatter_local_vector_to_global<T, S>(global: &mut DVector<T>, dofs: &[SignedDof], local: &Matrix<T, nalgebra::Dyn, U1, S>)
where
    T: Real,
    S: Storage<T, nalgebra::Dyn, U1>,
{
    assert_eq!(local.len(), dofs.len(), "Local vector must match DOFs.");
    for (dof, &value) in dofs.iter().zip(local.iter()) {
        global[dof.index()] += dof.sign::<T>() * value;
    }
}

/// Gathers the entries of a global vector at the given DOFs into a local vector.
///
/// The inverse of [`scatter_local_vector_to_global`] for a single element: the local value is
/// `sign * global[index]`.
pub fn gather_global_to_local<T: Real>(global: &DVector<T>, dofs: &[SignedDof]) -> DVector<T> {
    DVector::from_iterator(
        dofs.len(),
        dofs.iter().map(|dof| dof.sign::<T>() * global[dof.index()]),
    )
}
