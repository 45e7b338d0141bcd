//! Rectangular forms coupling a trial space and a different test space.
use crate::assembly::assemble_items;
use crate::assembly::bilinear::check_len;
use crate::eliminate::{eliminate_columns, eliminate_rows, EliminationLedger, EliminationState, EssentialSelection};
use crate::error::FormError;
use crate::integrator::{IntegratorKind, MixedIntegrator, SharedMixedIntegrator};
use crate::options::AssemblyOptions;
use crate::space::FiniteElementSpace;
use crate::Real;
use eyre::WrapErr;
use log::debug;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use std::fmt;
use std::sync::Arc;
use weakform_sparse::ops::{spmv, spmv_transpose};
use weakform_sparse::SparseAccumulator;

fn check_compatible<Trial, Test>(trial_space: &Trial, test_space: &Test) -> Result<(), FormError>
where
    Trial: FiniteElementSpace + ?Sized,
    Test: FiniteElementSpace + ?Sized,
{
    if trial_space.num_elements() != test_space.num_elements() {
        return Err(FormError::MismatchedSpaces {
            reason: format!(
                "trial space has {} elements, test space has {}",
                trial_space.num_elements(),
                test_space.num_elements()
            ),
        });
    }
    if trial_space.num_boundary_elements() != test_space.num_boundary_elements() {
        return Err(FormError::MismatchedSpaces {
            reason: format!(
                "trial space has {} boundary elements, test space has {}",
                trial_space.num_boundary_elements(),
                test_space.num_boundary_elements()
            ),
        });
    }
    Ok(())
}

/// A bilinear form `b(u, v)` with trial functions `u` and test functions `v` from two
/// different spaces over the same mesh.
///
/// The global matrix has one row per test DOF and one column per trial DOF. Both spaces must
/// enumerate the same elements and boundary elements, which is checked on construction.
/// Mixed forms have no face terms.
pub struct MixedBilinearForm<T, Trial, Test>
where
    T: Real,
    Trial: FiniteElementSpace + ?Sized,
    Test: FiniteElementSpace + ?Sized,
{
    trial_space: Arc<Trial>,
    test_space: Arc<Test>,
    options: AssemblyOptions,
    domain_integrators: Vec<SharedMixedIntegrator<T, Trial, Test>>,
    boundary_integrators: Vec<SharedMixedIntegrator<T, Trial, Test>>,
    matrix: Option<SparseAccumulator<T>>,
    eliminated_trial: Option<SparseAccumulator<T>>,
    trial_eliminations: EliminationLedger<T>,
}

impl<T, Trial, Test> fmt::Debug for MixedBilinearForm<T, Trial, Test>
where
    T: Real,
    Trial: FiniteElementSpace + ?Sized,
    Test: FiniteElementSpace + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixedBilinearForm")
            .field("num_trial_dofs", &self.trial_space.num_dofs())
            .field("num_test_dofs", &self.test_space.num_dofs())
            .field("options", &self.options)
            .field("num_domain_integrators", &self.domain_integrators.len())
            .field("num_boundary_integrators", &self.boundary_integrators.len())
            .field("matrix", &self.matrix)
            .field("eliminated_trial", &self.eliminated_trial)
            .finish()
    }
}

impl<T, Trial, Test> MixedBilinearForm<T, Trial, Test>
where
    T: Real,
    Trial: FiniteElementSpace + ?Sized,
    Test: FiniteElementSpace + ?Sized,
{
    pub fn new(trial_space: Arc<Trial>, test_space: Arc<Test>) -> Result<Self, FormError> {
        Self::with_options(trial_space, test_space, AssemblyOptions::default())
    }

    pub fn with_options(
        trial_space: Arc<Trial>,
        test_space: Arc<Test>,
        options: AssemblyOptions,
    ) -> Result<Self, FormError> {
        check_compatible(trial_space.as_ref(), test_space.as_ref())?;
        Ok(Self {
            trial_space,
            test_space,
            options,
            domain_integrators: Vec::new(),
            boundary_integrators: Vec::new(),
            matrix: None,
            eliminated_trial: None,
            trial_eliminations: EliminationLedger::default(),
        })
    }

    pub fn trial_space(&self) -> &Arc<Trial> {
        &self.trial_space
    }

    pub fn test_space(&self) -> &Arc<Test> {
        &self.test_space
    }

    /// The number of rows of the form, i.e. the number of test DOFs.
    pub fn num_rows(&self) -> usize {
        self.test_space.num_dofs()
    }

    /// The number of columns of the form, i.e. the number of trial DOFs.
    pub fn num_cols(&self) -> usize {
        self.trial_space.num_dofs()
    }

    pub fn add_shared_integrator(
        &mut self,
        kind: IntegratorKind,
        integrator: SharedMixedIntegrator<T, Trial, Test>,
    ) -> Result<(), FormError> {
        if kind.is_face() || !integrator.supports(kind) {
            return Err(FormError::UnsupportedIntegrator { kind });
        }
        match kind {
            IntegratorKind::Domain => self.domain_integrators.push(integrator),
            _ => self.boundary_integrators.push(integrator),
        }
        Ok(())
    }

    pub fn add_domain_integrator(
        &mut self,
        integrator: impl MixedIntegrator<T, Trial, Test> + 'static,
    ) -> Result<(), FormError> {
        self.add_shared_integrator(IntegratorKind::Domain, Arc::new(integrator))
    }

    pub fn add_boundary_integrator(
        &mut self,
        integrator: impl MixedIntegrator<T, Trial, Test> + 'static,
    ) -> Result<(), FormError> {
        self.add_shared_integrator(IntegratorKind::Boundary, Arc::new(integrator))
    }

    fn accumulator_mut(&mut self) -> &mut SparseAccumulator<T> {
        let (nrows, ncols) = (self.num_rows(), self.num_cols());
        self.matrix
            .get_or_insert_with(|| SparseAccumulator::new(nrows, ncols))
    }

    /// Assembles all registered integrators into the global matrix.
    ///
    /// Each local matrix has shape `test DOFs x trial DOFs` of the same element in both spaces.
    /// Fails with [`FormError::AssemblyAfterElimination`] once trial DOFs were eliminated.
    pub fn assemble(&mut self, skip_zeros: bool) -> eyre::Result<()> {
        self.trial_eliminations.ensure_empty()?;
        let (nrows, ncols) = (self.num_rows(), self.num_cols());
        let parallel = self.options.parallel;
        let trial_space = self.trial_space.as_ref();
        let test_space = self.test_space.as_ref();
        let domain_integrators = &self.domain_integrators;
        let boundary_integrators = &self.boundary_integrators;
        let accumulator = self
            .matrix
            .get_or_insert_with(|| SparseAccumulator::new(nrows, ncols));

        if !domain_integrators.is_empty() {
            let count = assemble_items(accumulator, test_space.num_elements(), parallel, skip_zeros, |buffers, i| {
                buffers.clear_dofs();
                test_space.populate_element_dofs(&mut buffers.test_dofs, i);
                trial_space.populate_element_dofs(&mut buffers.trial_dofs, i);
                let trial_element = trial_space.element(i);
                let test_element = test_space.element(i);
                buffers
                    .sum_integrators(domain_integrators, |integrator, output| {
                        integrator.assemble_mixed_element_matrix(&trial_element, &test_element, output)
                    })
                    .wrap_err_with(|| format!("failed to assemble mixed domain element {i}"))?;
                Ok(true)
            })?;
            debug!("Assembled {count} mixed domain elements into {nrows}x{ncols} matrix");
        }

        if !boundary_integrators.is_empty() {
            let count = assemble_items(
                accumulator,
                test_space.num_boundary_elements(),
                parallel,
                skip_zeros,
                |buffers, i| {
                    buffers.clear_dofs();
                    test_space.populate_boundary_element_dofs(&mut buffers.test_dofs, i);
                    trial_space.populate_boundary_element_dofs(&mut buffers.trial_dofs, i);
                    let trial_element = trial_space.boundary_element(i);
                    let test_element = test_space.boundary_element(i);
                    buffers
                        .sum_integrators(boundary_integrators, |integrator, output| {
                            integrator.assemble_mixed_element_matrix(&trial_element, &test_element, output)
                        })
                        .wrap_err_with(|| format!("failed to assemble mixed boundary element {i}"))?;
                    Ok(true)
                },
            )?;
            debug!("Assembled {count} mixed boundary elements into {nrows}x{ncols} matrix");
        }

        Ok(())
    }

    pub fn finalize(&mut self, skip_zeros: bool) {
        self.accumulator_mut().finalize(skip_zeros);
    }

    pub fn matrix(&self) -> Option<&CsrMatrix<T>> {
        self.matrix.as_ref().and_then(SparseAccumulator::csr)
    }

    /// The trial columns removed by [`eliminate_trial_dofs`](Self::eliminate_trial_dofs)
    /// without known values.
    pub fn eliminated_trial_matrix(&self) -> Option<&CsrMatrix<T>> {
        self.eliminated_trial
            .as_ref()
            .and_then(SparseAccumulator::csr)
    }

    /// # Panics
    ///
    /// Panics if `(i, j)` is out of bounds.
    pub fn entry(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.num_rows() && j < self.num_cols(),
            "Entry ({i}, {j}) is out of bounds."
        );
        self.matrix
            .as_ref()
            .map(|matrix| matrix.get(i, j))
            .unwrap_or_else(T::zero)
    }

    fn finalized_matrix(&self) -> Result<&CsrMatrix<T>, FormError> {
        self.matrix().ok_or(FormError::NotFinalized)
    }

    /// Computes `y = B x` for a trial vector `x` and a test vector `y`.
    pub fn mult(&self, x: &DVector<T>, y: &mut DVector<T>) -> eyre::Result<()> {
        let matrix = self.finalized_matrix()?;
        check_len("x", matrix.ncols(), x.len())?;
        check_len("y", matrix.nrows(), y.len())?;
        y.fill(T::zero());
        spmv(T::one(), y, T::one(), matrix, x);
        Ok(())
    }

    /// Computes `y += alpha * B x`.
    pub fn add_mult(&self, x: &DVector<T>, y: &mut DVector<T>, alpha: T) -> eyre::Result<()> {
        let matrix = self.finalized_matrix()?;
        check_len("x", matrix.ncols(), x.len())?;
        check_len("y", matrix.nrows(), y.len())?;
        spmv(T::one(), y, alpha, matrix, x);
        Ok(())
    }

    /// Computes `y += alpha * B^T x` for a test vector `x` and a trial vector `y`.
    pub fn add_mult_transpose(&self, x: &DVector<T>, y: &mut DVector<T>, alpha: T) -> eyre::Result<()> {
        let matrix = self.finalized_matrix()?;
        check_len("x", matrix.nrows(), x.len())?;
        check_len("y", matrix.ncols(), y.len())?;
        spmv_transpose(T::one(), y, alpha, matrix, x);
        Ok(())
    }

    /// Eliminates constrained trial DOFs by zeroing their columns.
    ///
    /// With `Some((solution, rhs))`, the removed column entries times the prescribed trial
    /// values are subtracted from the test-space `rhs`. Without values, the removed entries
    /// are kept in the [eliminated trial matrix](Self::eliminated_trial_matrix) and can be
    /// applied later with [`eliminate_trial_vdofs_in_rhs`](Self::eliminate_trial_vdofs_in_rhs).
    /// Rows are left intact.
    pub fn eliminate_trial_dofs(
        &mut self,
        selection: EssentialSelection<'_>,
        values: Option<(&DVector<T>, &mut DVector<T>)>,
    ) -> eyre::Result<()> {
        let (nrows, ncols) = (self.num_rows(), self.num_cols());
        let dofs = selection.resolve(self.trial_space.as_ref())?;
        let skip_zeros = self.options.skip_zeros;

        let fresh = match values {
            Some((solution, rhs)) => {
                check_len("solution", ncols, solution.len())?;
                check_len("rhs", nrows, rhs.len())?;
                let fresh = self
                    .trial_eliminations
                    .register(&dofs, |dof| EliminationState::Value(solution[dof]))?;
                let matrix = self.accumulator_mut().finalized_mut(skip_zeros);
                eliminate_columns(matrix, &fresh, |row, col, value| rhs[row] -= value * solution[col]);
                fresh
            }
            None => {
                let fresh = self
                    .trial_eliminations
                    .register(&dofs, |_| EliminationState::Deferred { prescribed: None })?;
                let matrix = self
                    .matrix
                    .get_or_insert_with(|| SparseAccumulator::new(nrows, ncols))
                    .finalized_mut(skip_zeros);
                let eliminated = self
                    .eliminated_trial
                    .get_or_insert_with(|| SparseAccumulator::new(nrows, ncols));
                eliminate_columns(matrix, &fresh, |row, col, value| eliminated.add_entry(row, col, value));
                eliminated.finalize(skip_zeros);
                fresh
            }
        };

        debug!("Eliminated {} trial DOFs from mixed form", fresh.len());
        Ok(())
    }

    /// Computes `b -= B_e x`, where `B_e` holds the trial columns eliminated without values.
    pub fn eliminate_trial_vdofs_in_rhs(&self, x: &DVector<T>, b: &mut DVector<T>) -> eyre::Result<()> {
        let eliminated = self
            .eliminated_trial_matrix()
            .ok_or(FormError::MissingEliminatedMatrix)?;
        check_len("x", eliminated.ncols(), x.len())?;
        check_len("b", eliminated.nrows(), b.len())?;
        spmv(T::one(), b, -T::one(), eliminated, x);
        Ok(())
    }

    /// Eliminates constrained test DOFs by zeroing their rows.
    ///
    /// Test DOFs carry no values, so no right-hand side is involved.
    pub fn eliminate_test_dofs(&mut self, selection: EssentialSelection<'_>) -> eyre::Result<()> {
        let dofs = selection.resolve(self.test_space.as_ref())?;
        let skip_zeros = self.options.skip_zeros;
        let matrix = self.accumulator_mut().finalized_mut(skip_zeros);
        eliminate_rows(matrix, &dofs);
        debug!("Eliminated {} test DOFs from mixed form", dofs.len());
        Ok(())
    }

    /// Discards the assembled matrices and eliminations, optionally rebinding to new spaces.
    ///
    /// The new pair of spaces is checked for compatibility first. On error, the form is left
    /// unchanged.
    pub fn update(&mut self, trial_space: Option<Arc<Trial>>, test_space: Option<Arc<Test>>) -> Result<(), FormError> {
        let trial_space = trial_space.unwrap_or_else(|| Arc::clone(&self.trial_space));
        let test_space = test_space.unwrap_or_else(|| Arc::clone(&self.test_space));
        check_compatible(trial_space.as_ref(), test_space.as_ref())?;
        self.trial_space = trial_space;
        self.test_space = test_space;
        self.matrix = None;
        self.eliminated_trial = None;
        self.trial_eliminations.clear();
        debug!(
            "Reset mixed form with {} test and {} trial DOFs",
            self.num_rows(),
            self.num_cols()
        );
        Ok(())
    }
}
