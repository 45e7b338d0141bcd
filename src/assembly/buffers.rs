use crate::assembly::global::scatter_local_to_global;
use crate::dof::SignedDof;
use crate::Real;
use nalgebra::{DMatrix, DMatrixViewMut};
use std::sync::Arc;
use weakform_sparse::SparseAccumulator;

/// Reusable per-thread storage for computing one local contribution at a time.
#[derive(Debug)]
pub(crate) struct LocalBuffers<T: Real> {
    pub test_dofs: Vec<SignedDof>,
    pub trial_dofs: Vec<SignedDof>,
    pub matrix: DMatrix<T>,
    integrator_output: DMatrix<T>,
}

impl<T: Real> Default for LocalBuffers<T> {
    fn default() -> Self {
        Self {
            test_dofs: Vec::new(),
            trial_dofs: Vec::new(),
            matrix: DMatrix::zeros(0, 0),
            integrator_output: DMatrix::zeros(0, 0),
        }
    }
}

impl<T: Real> LocalBuffers<T> {
    pub fn clear_dofs(&mut self) {
        self.test_dofs.clear();
        self.trial_dofs.clear();
    }

    /// Makes the trial DOFs a copy of the test DOFs, for square forms.
    pub fn use_test_dofs_as_trial(&mut self) {
        self.trial_dofs.clear();
        self.trial_dofs.extend_from_slice(&self.test_dofs);
    }

    /// Evaluates all integrators on a zeroed output of shape `test x trial` and sums the results
    /// into [`matrix`](Self::matrix).
    pub fn sum_integrators<I: ?Sized>(
        &mut self,
        integrators: &[Arc<I>],
        mut assemble: impl FnMut(&I, DMatrixViewMut<T>) -> eyre::Result<()>,
    ) -> eyre::Result<()> {
        let (nrows, ncols) = (self.test_dofs.len(), self.trial_dofs.len());
        self.matrix.resize_mut(nrows, ncols, T::zero());
        self.matrix.fill(T::zero());
        self.integrator_output.resize_mut(nrows, ncols, T::zero());

        for integrator in integrators {
            self.integrator_output.fill(T::zero());
            assemble(integrator.as_ref(), DMatrixViewMut::from(&mut self.integrator_output))?;
            self.matrix += &self.integrator_output;
        }
        Ok(())
    }

    pub fn scatter_into(&self, accumulator: &mut SparseAccumulator<T>, skip_zeros: bool) {
        scatter_local_to_global(accumulator, &self.test_dofs, &self.trial_dofs, &self.matrix, skip_zeros);
    }

    /// Copies the current contribution out of the buffers, for deferred scattering.
    pub fn to_contribution(&self) -> LocalContribution<T> {
        LocalContribution {
            test_dofs: self.test_dofs.clone(),
            trial_dofs: self.trial_dofs.clone(),
            matrix: self.matrix.clone(),
        }
    }
}

/// A computed local matrix together with the DOFs it is scattered to.
#[derive(Debug, Clone)]
pub(crate) struct LocalContribution<T: Real> {
    pub test_dofs: Vec<SignedDof>,
    pub trial_dofs: Vec<SignedDof>,
    pub matrix: DMatrix<T>,
}

impl<T: Real> LocalContribution<T> {
    pub fn scatter_into(&self, accumulator: &mut SparseAccumulator<T>, skip_zeros: bool) {
        scatter_local_to_global(accumulator, &self.test_dofs, &self.trial_dofs, &self.matrix, skip_zeros);
    }
}
