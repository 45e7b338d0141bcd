//! Square forms over a single finite element space.
use crate::assembly::assemble_items;
use crate::assembly::buffers::LocalBuffers;
use crate::assembly::global::scatter_local_to_global;
use crate::dof::SignedDof;
use crate::eliminate::{
    eliminate_dofs_in_rhs, eliminate_rows_cols_deferred, eliminate_rows_cols_with_values, EliminationLedger,
    EliminationState, EssentialSelection,
};
use crate::error::FormError;
use crate::integrator::{BilinearIntegrator, IntegratorKind, SharedBilinearIntegrator};
use crate::options::{AssemblyOptions, DiagonalPolicy};
use crate::space::{FaceElements, FiniteElementSpace};
use crate::Real;
use eyre::WrapErr;
use log::debug;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use std::fmt;
use std::sync::Arc;
use weakform_sparse::ops::{diagonal_entry, spmv, spmv_transpose};
use weakform_sparse::SparseAccumulator;

/// A linear system ready to be handed to a solver.
///
/// Produced by [`BilinearForm::form_linear_system`]. Solve `matrix * x = b` starting from the
/// initial guess `x`, then pass the solution to [`BilinearForm::recover_fem_solution`].
#[derive(Debug)]
pub struct LinearSystem<'a, T: Real> {
    pub matrix: &'a CsrMatrix<T>,
    pub x: DVector<T>,
    pub b: DVector<T>,
}

pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), FormError> {
    if expected == actual {
        Ok(())
    } else {
        Err(FormError::DimensionMismatch { what, expected, actual })
    }
}

pub(crate) fn check_index(what: &'static str, index: usize, len: usize) -> Result<(), FormError> {
    if index < len {
        Ok(())
    } else {
        Err(FormError::IndexOutOfRange { what, index, len })
    }
}

struct IntegratorLists<T: Real, S: FiniteElementSpace + ?Sized> {
    domain: Vec<SharedBilinearIntegrator<T, S>>,
    boundary: Vec<SharedBilinearIntegrator<T, S>>,
    interior_face: Vec<SharedBilinearIntegrator<T, S>>,
    boundary_face: Vec<SharedBilinearIntegrator<T, S>>,
}

// Cloning shares the integrators
impl<T: Real, S: FiniteElementSpace + ?Sized> Clone for IntegratorLists<T, S> {
    fn clone(&self) -> Self {
        Self {
            domain: self.domain.clone(),
            boundary: self.boundary.clone(),
            interior_face: self.interior_face.clone(),
            boundary_face: self.boundary_face.clone(),
        }
    }
}

impl<T: Real, S: FiniteElementSpace + ?Sized> Default for IntegratorLists<T, S> {
    fn default() -> Self {
        Self {
            domain: Vec::new(),
            boundary: Vec::new(),
            interior_face: Vec::new(),
            boundary_face: Vec::new(),
        }
    }
}

impl<T: Real, S: FiniteElementSpace + ?Sized> IntegratorLists<T, S> {
    fn get(&self, kind: IntegratorKind) -> &[SharedBilinearIntegrator<T, S>] {
        match kind {
            IntegratorKind::Domain => &self.domain,
            IntegratorKind::Boundary => &self.boundary,
            IntegratorKind::InteriorFace => &self.interior_face,
            IntegratorKind::BoundaryFace => &self.boundary_face,
        }
    }

    fn get_mut(&mut self, kind: IntegratorKind) -> &mut Vec<SharedBilinearIntegrator<T, S>> {
        match kind {
            IntegratorKind::Domain => &mut self.domain,
            IntegratorKind::Boundary => &mut self.boundary,
            IntegratorKind::InteriorFace => &mut self.interior_face,
            IntegratorKind::BoundaryFace => &mut self.boundary_face,
        }
    }
}

/// A bilinear form `a(u, v)` with trial and test functions from the same space.
///
/// The form owns its integrators (shared with other forms through [`Arc`]) and the assembled
/// global matrix. The matrix is created on the first call to [`assemble`](Self::assemble),
/// can be assembled into repeatedly, and has to be [finalized](Self::finalize) before it can be
/// used as an operator. Essential conditions are eliminated in place, and the removed
/// entries are kept for later right-hand side corrections.
pub struct BilinearForm<T: Real, S: FiniteElementSpace + ?Sized> {
    space: Arc<S>,
    options: AssemblyOptions,
    integrators: IntegratorLists<T, S>,
    matrix: Option<SparseAccumulator<T>>,
    eliminated: Option<SparseAccumulator<T>>,
    eliminations: EliminationLedger<T>,
}

impl<T: Real, S: FiniteElementSpace + ?Sized> fmt::Debug for BilinearForm<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BilinearForm")
            .field("num_dofs", &self.space.num_dofs())
            .field("options", &self.options)
            .field("num_domain_integrators", &self.integrators.domain.len())
            .field("num_boundary_integrators", &self.integrators.boundary.len())
            .field("num_interior_face_integrators", &self.integrators.interior_face.len())
            .field("num_boundary_face_integrators", &self.integrators.boundary_face.len())
            .field("matrix", &self.matrix)
            .field("eliminated", &self.eliminated)
            .field("num_eliminated_dofs", &self.eliminations.len())
            .finish()
    }
}

impl<T: Real, S: FiniteElementSpace + ?Sized> BilinearForm<T, S> {
    pub fn new(space: Arc<S>) -> Self {
        Self::with_options(space, AssemblyOptions::default())
    }

    pub fn with_options(space: Arc<S>, options: AssemblyOptions) -> Self {
        Self {
            space,
            options,
            integrators: IntegratorLists::default(),
            matrix: None,
            eliminated: None,
            eliminations: EliminationLedger::default(),
        }
    }

    /// Creates a form that shares all integrators (and the options) of another form.
    ///
    /// Integrators added to either form afterwards are not shared.
    pub fn sharing_integrators(space: Arc<S>, other: &Self) -> Self {
        Self {
            integrators: other.integrators.clone(),
            ..Self::with_options(space, other.options)
        }
    }

    pub fn space(&self) -> &Arc<S> {
        &self.space
    }

    pub fn options(&self) -> &AssemblyOptions {
        &self.options
    }

    /// The number of rows (and columns) of the form.
    pub fn num_dofs(&self) -> usize {
        self.space.num_dofs()
    }

    pub fn integrators(&self, kind: IntegratorKind) -> &[SharedBilinearIntegrator<T, S>] {
        self.integrators.get(kind)
    }

    /// Registers an integrator that may be shared with other forms.
    ///
    /// Fails with [`FormError::UnsupportedIntegrator`] if the integrator does not support `kind`.
    pub fn add_shared_integrator(
        &mut self,
        kind: IntegratorKind,
        integrator: SharedBilinearIntegrator<T, S>,
    ) -> Result<(), FormError> {
        if !integrator.supports(kind) {
            return Err(FormError::UnsupportedIntegrator { kind });
        }
        self.integrators.get_mut(kind).push(integrator);
        Ok(())
    }

    pub fn add_integrator(
        &mut self,
        kind: IntegratorKind,
        integrator: impl BilinearIntegrator<T, S> + 'static,
    ) -> Result<(), FormError> {
        self.add_shared_integrator(kind, Arc::new(integrator))
    }

    pub fn add_domain_integrator(&mut self, integrator: impl BilinearIntegrator<T, S> + 'static) -> Result<(), FormError> {
        self.add_integrator(IntegratorKind::Domain, integrator)
    }

    pub fn add_boundary_integrator(
        &mut self,
        integrator: impl BilinearIntegrator<T, S> + 'static,
    ) -> Result<(), FormError> {
        self.add_integrator(IntegratorKind::Boundary, integrator)
    }

    pub fn add_interior_face_integrator(
        &mut self,
        integrator: impl BilinearIntegrator<T, S> + 'static,
    ) -> Result<(), FormError> {
        self.add_integrator(IntegratorKind::InteriorFace, integrator)
    }

    pub fn add_boundary_face_integrator(
        &mut self,
        integrator: impl BilinearIntegrator<T, S> + 'static,
    ) -> Result<(), FormError> {
        self.add_integrator(IntegratorKind::BoundaryFace, integrator)
    }

    fn accumulator_mut(&mut self) -> &mut SparseAccumulator<T> {
        let n = self.space.num_dofs();
        self.matrix
            .get_or_insert_with(|| SparseAccumulator::new(n, n))
    }

    /// Assembles all registered integrators into the global matrix.
    ///
    /// Contributions are added to whatever the matrix already holds. Traversal kinds without
    /// integrators are skipped entirely. If `skip_zeros` is set, local entries that are exactly
    /// zero do not enter the sparsity pattern.
    ///
    /// Assembling into a matrix from which DOFs were eliminated fails with
    /// [`FormError::AssemblyAfterElimination`]; call [`update`](Self::update) first.
    pub fn assemble(&mut self, skip_zeros: bool) -> eyre::Result<()> {
        self.eliminations.ensure_empty()?;
        let n = self.space.num_dofs();
        let parallel = self.options.parallel;
        let space = self.space.as_ref();
        let integrators = &self.integrators;
        let accumulator = self
            .matrix
            .get_or_insert_with(|| SparseAccumulator::new(n, n));

        if !integrators.domain.is_empty() {
            let count = assemble_items(accumulator, space.num_elements(), parallel, skip_zeros, |buffers, i| {
                compute_element_matrix_into(space, &integrators.domain, buffers, i)
                    .wrap_err_with(|| format!("failed to assemble domain element {i}"))?;
                Ok(true)
            })?;
            debug!("Assembled {count} domain elements into {n}x{n} matrix");
        }

        if !integrators.boundary.is_empty() {
            let count = assemble_items(
                accumulator,
                space.num_boundary_elements(),
                parallel,
                skip_zeros,
                |buffers, i| {
                    buffers.clear_dofs();
                    space.populate_boundary_element_dofs(&mut buffers.test_dofs, i);
                    buffers.use_test_dofs_as_trial();
                    let element = space.boundary_element(i);
                    buffers
                        .sum_integrators(&integrators.boundary, |integrator, output| {
                            integrator.assemble_element_matrix(&element, output)
                        })
                        .wrap_err_with(|| format!("failed to assemble boundary element {i}"))?;
                    Ok(true)
                },
            )?;
            debug!("Assembled {count} boundary elements into {n}x{n} matrix");
        }

        if !integrators.interior_face.is_empty() {
            let count = assemble_items(accumulator, space.num_faces(), parallel, skip_zeros, |buffers, i| {
                let Some(adjacency) = space.interior_face(i) else {
                    return Ok(false);
                };
                let Some(second_index) = adjacency.second else {
                    return Ok(false);
                };
                buffers.clear_dofs();
                space.populate_element_dofs(&mut buffers.test_dofs, adjacency.first);
                space.populate_element_dofs(&mut buffers.test_dofs, second_index);
                buffers.use_test_dofs_as_trial();
                let first = space.element(adjacency.first);
                let second = space.element(second_index);
                let face = FaceElements {
                    face: &adjacency.face,
                    first: &first,
                    second: Some(&second),
                };
                buffers
                    .sum_integrators(&integrators.interior_face, |integrator, output| {
                        integrator.assemble_face_matrix(&face, output)
                    })
                    .wrap_err_with(|| format!("failed to assemble interior face {i}"))?;
                Ok(true)
            })?;
            debug!("Assembled {count} of {} interior faces", space.num_faces());
        }

        if !integrators.boundary_face.is_empty() {
            let count = assemble_items(
                accumulator,
                space.num_boundary_elements(),
                parallel,
                skip_zeros,
                |buffers, i| {
                    let Some(adjacency) = space.boundary_face(i) else {
                        return Ok(false);
                    };
                    buffers.clear_dofs();
                    space.populate_element_dofs(&mut buffers.test_dofs, adjacency.first);
                    buffers.use_test_dofs_as_trial();
                    let first = space.element(adjacency.first);
                    let face = FaceElements {
                        face: &adjacency.face,
                        first: &first,
                        second: None,
                    };
                    buffers
                        .sum_integrators(&integrators.boundary_face, |integrator, output| {
                            integrator.assemble_face_matrix(&face, output)
                        })
                        .wrap_err_with(|| format!("failed to assemble boundary face of boundary element {i}"))?;
                    Ok(true)
                },
            )?;
            debug!("Assembled {count} boundary faces");
        }

        Ok(())
    }

    /// Compacts the assembled matrix, creating an empty matrix if nothing was assembled.
    pub fn finalize(&mut self, skip_zeros: bool) {
        self.accumulator_mut().finalize(skip_zeros);
    }

    pub fn is_finalized(&self) -> bool {
        self.matrix
            .as_ref()
            .map(SparseAccumulator::is_finalized)
            .unwrap_or(false)
    }

    /// Computes the summed local matrix of all domain integrators for one element.
    ///
    /// The matrix is local: orientation signs are not applied.
    pub fn compute_element_matrix(&self, element_index: usize) -> eyre::Result<DMatrix<T>> {
        check_index("element", element_index, self.space.num_elements())?;
        let mut buffers = LocalBuffers::default();
        compute_element_matrix_into(self.space.as_ref(), &self.integrators.domain, &mut buffers, element_index)
            .wrap_err_with(|| format!("failed to compute matrix of element {element_index}"))?;
        Ok(buffers.matrix)
    }

    /// Scatters a caller-provided local matrix of the given element into the global matrix.
    pub fn assemble_element_matrix(
        &mut self,
        element_index: usize,
        element_matrix: &DMatrix<T>,
        skip_zeros: bool,
    ) -> eyre::Result<()> {
        check_index("element", element_index, self.space.num_elements())?;
        self.eliminations.ensure_empty()?;
        let mut dofs = Vec::new();
        self.space.populate_element_dofs(&mut dofs, element_index);
        check_len("element matrix rows", dofs.len(), element_matrix.nrows())?;
        check_len("element matrix columns", dofs.len(), element_matrix.ncols())?;
        scatter_local_to_global(self.accumulator_mut(), &dofs, &dofs, element_matrix, skip_zeros);
        Ok(())
    }

    /// The finalized global matrix, if available.
    pub fn matrix(&self) -> Option<&CsrMatrix<T>> {
        self.matrix.as_ref().and_then(SparseAccumulator::csr)
    }

    /// The entries removed by [`eliminate_essential_bc_matrix`](Self::eliminate_essential_bc_matrix).
    pub fn eliminated_matrix(&self) -> Option<&CsrMatrix<T>> {
        self.eliminated.as_ref().and_then(SparseAccumulator::csr)
    }

    /// The value of the global matrix at `(i, j)`, zero if nothing has been assembled there.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of bounds.
    pub fn entry(&self, i: usize, j: usize) -> T {
        let n = self.num_dofs();
        assert!(i < n && j < n, "Entry ({i}, {j}) is out of bounds.");
        self.matrix
            .as_ref()
            .map(|matrix| matrix.get(i, j))
            .unwrap_or_else(T::zero)
    }

    fn finalized_matrix(&self) -> Result<&CsrMatrix<T>, FormError> {
        self.matrix().ok_or(FormError::NotFinalized)
    }

    /// Computes `y = A x`.
    pub fn mult(&self, x: &DVector<T>, y: &mut DVector<T>) -> eyre::Result<()> {
        let matrix = self.finalized_matrix()?;
        check_len("x", matrix.ncols(), x.len())?;
        check_len("y", matrix.nrows(), y.len())?;
        y.fill(T::zero());
        spmv(T::one(), y, T::one(), matrix, x);
        Ok(())
    }

    /// Computes `y += alpha * A x`.
    pub fn add_mult(&self, x: &DVector<T>, y: &mut DVector<T>, alpha: T) -> eyre::Result<()> {
        let matrix = self.finalized_matrix()?;
        check_len("x", matrix.ncols(), x.len())?;
        check_len("y", matrix.nrows(), y.len())?;
        spmv(T::one(), y, alpha, matrix, x);
        Ok(())
    }

    /// Computes `y += alpha * A^T x`.
    pub fn add_mult_transpose(&self, x: &DVector<T>, y: &mut DVector<T>, alpha: T) -> eyre::Result<()> {
        let matrix = self.finalized_matrix()?;
        check_len("x", matrix.nrows(), x.len())?;
        check_len("y", matrix.ncols(), y.len())?;
        spmv_transpose(T::one(), y, alpha, matrix, x);
        Ok(())
    }

    /// Eliminates essential DOFs with the prescribed values taken from `solution`.
    ///
    /// The matrix is finalized first if necessary. For every constrained DOF `k`, the column
    /// entries times `solution[k]` are moved to `rhs`, row and column `k` are zeroed, the
    /// diagonal is chosen by `policy` and `rhs[k]` is set to `diagonal * solution[k]`.
    ///
    /// Eliminating a DOF again with the same value only resets `rhs[k]`. A different value, or
    /// a DOF that was eliminated with [`eliminate_essential_bc_matrix`](Self::eliminate_essential_bc_matrix),
    /// is an error and leaves the form unchanged.
    pub fn eliminate_essential_bc(
        &mut self,
        selection: EssentialSelection<'_>,
        solution: &DVector<T>,
        rhs: &mut DVector<T>,
        policy: DiagonalPolicy,
    ) -> eyre::Result<()> {
        let n = self.num_dofs();
        check_len("solution", n, solution.len())?;
        check_len("rhs", n, rhs.len())?;
        let dofs = selection.resolve(self.space.as_ref())?;
        let fresh = self
            .eliminations
            .register(&dofs, |dof| EliminationState::Value(solution[dof]))?;

        let skip_zeros = self.options.skip_zeros;
        let matrix = self.accumulator_mut().finalized_mut(skip_zeros);
        eliminate_rows_cols_with_values(matrix, &fresh, policy, solution, rhs);
        for &dof in dofs.iter().filter(|dof| fresh.binary_search(dof).is_err()) {
            rhs[dof] = diagonal_entry(matrix, dof) * solution[dof];
        }
        debug!(
            "Eliminated {} essential DOFs with known values ({} already eliminated)",
            fresh.len(),
            dofs.len() - fresh.len()
        );
        Ok(())
    }

    /// Eliminates essential DOFs given by a per-DOF marker, see
    /// [`eliminate_essential_bc`](Self::eliminate_essential_bc).
    pub fn eliminate_essential_bc_from_dofs(
        &mut self,
        dof_marker: &[bool],
        solution: &DVector<T>,
        rhs: &mut DVector<T>,
        policy: DiagonalPolicy,
    ) -> eyre::Result<()> {
        self.eliminate_essential_bc(EssentialSelection::DofMarker(dof_marker), solution, rhs, policy)
    }

    /// Eliminates the given signed DOFs with known values. Orientations are ignored.
    pub fn eliminate_vdofs(
        &mut self,
        vdofs: &[SignedDof],
        solution: &DVector<T>,
        rhs: &mut DVector<T>,
        policy: DiagonalPolicy,
    ) -> eyre::Result<()> {
        self.eliminate_essential_bc(EssentialSelection::SignedDofs(vdofs), solution, rhs, policy)
    }

    /// Eliminates the given signed DOFs from the matrix only.
    pub fn eliminate_vdofs_matrix(&mut self, vdofs: &[SignedDof], policy: DiagonalPolicy) -> eyre::Result<()> {
        self.eliminate_essential_bc_matrix(EssentialSelection::SignedDofs(vdofs), policy)
    }

    /// Eliminates essential DOFs from the matrix only.
    ///
    /// The removed entries are accumulated in the [eliminated matrix](Self::eliminated_matrix),
    /// so that right-hand sides can be corrected later with
    /// [`eliminate_vdofs_in_rhs`](Self::eliminate_vdofs_in_rhs) once the values are known.
    pub fn eliminate_essential_bc_matrix(
        &mut self,
        selection: EssentialSelection<'_>,
        policy: DiagonalPolicy,
    ) -> eyre::Result<()> {
        let dofs = selection.resolve(self.space.as_ref())?;
        self.eliminate_deferred(&dofs, policy)?;
        Ok(())
    }

    fn eliminate_deferred(&mut self, dofs: &[usize], policy: DiagonalPolicy) -> Result<(), FormError> {
        let n = self.num_dofs();
        let fresh = self
            .eliminations
            .register(dofs, |_| EliminationState::Deferred { prescribed: None })?;

        let skip_zeros = self.options.skip_zeros;
        let matrix = self
            .matrix
            .get_or_insert_with(|| SparseAccumulator::new(n, n))
            .finalized_mut(skip_zeros);
        let eliminated = self
            .eliminated
            .get_or_insert_with(|| SparseAccumulator::new(n, n));
        eliminate_rows_cols_deferred(matrix, &fresh, policy, eliminated);
        eliminated.finalize(skip_zeros);
        debug!(
            "Eliminated {} essential DOFs from the matrix ({} already eliminated)",
            fresh.len(),
            dofs.len() - fresh.len()
        );
        Ok(())
    }

    /// Applies the deferred elimination to a right-hand side.
    ///
    /// Computes `b -= A_e x`, where `A_e` is the eliminated matrix, and sets
    /// `b[k] = A(k, k) x[k]` for every DOF eliminated from the matrix only. The same
    /// elimination can be applied to any number of right-hand sides.
    pub fn eliminate_vdofs_in_rhs(&self, x: &DVector<T>, b: &mut DVector<T>) -> eyre::Result<()> {
        let eliminated = self
            .eliminated_matrix()
            .ok_or(FormError::MissingEliminatedMatrix)?;
        let matrix = self.finalized_matrix()?;
        check_len("x", matrix.ncols(), x.len())?;
        check_len("b", matrix.nrows(), b.len())?;
        eliminate_dofs_in_rhs(matrix, eliminated, &self.eliminations.deferred_dofs(), x, b);
        Ok(())
    }

    /// Forms the linear system `A X = B` with the essential DOFs eliminated.
    ///
    /// The matrix is finalized and the essential DOFs are eliminated from it using the
    /// diagonal policy of the form's options. `x` provides the prescribed values at the
    /// essential DOFs and serves as initial guess elsewhere. `b` is not modified; the
    /// corrected right-hand side is returned as part of the system.
    pub fn form_linear_system(
        &mut self,
        selection: EssentialSelection<'_>,
        x: &DVector<T>,
        b: &DVector<T>,
    ) -> eyre::Result<LinearSystem<'_, T>> {
        let n = self.num_dofs();
        check_len("x", n, x.len())?;
        check_len("b", n, b.len())?;
        let dofs = selection.resolve(self.space.as_ref())?;

        self.finalize(self.options.skip_zeros);
        self.eliminate_deferred(&dofs, self.options.diagonal_policy)?;
        let mut reduced_b = b.clone();
        self.eliminate_vdofs_in_rhs(x, &mut reduced_b)?;
        self.eliminations.prescribe(&dofs, x);

        Ok(LinearSystem {
            matrix: self.finalized_matrix()?,
            x: x.clone(),
            b: reduced_b,
        })
    }

    /// Recovers the full solution from the solution of a system formed by
    /// [`form_linear_system`](Self::form_linear_system).
    ///
    /// All eliminated DOFs with known values receive exactly their prescribed value.
    /// `b` is the right-hand side of the formed system; it is only checked for size, since
    /// eliminated systems are solved exactly at the essential DOFs.
    pub fn recover_fem_solution(&self, reduced_x: &DVector<T>, b: &DVector<T>, x: &mut DVector<T>) -> eyre::Result<()> {
        let n = self.num_dofs();
        check_len("reduced solution", n, reduced_x.len())?;
        check_len("b", n, b.len())?;
        check_len("x", n, x.len())?;
        x.copy_from(reduced_x);
        for (dof, value) in self.eliminations.prescribed_values() {
            x[dof] = value;
        }
        Ok(())
    }

    /// Discards the assembled matrices and all eliminations, optionally rebinding to a new space.
    ///
    /// Integrators are kept.
    pub fn update(&mut self, space: Option<Arc<S>>) {
        if let Some(space) = space {
            self.space = space;
        }
        self.matrix = None;
        self.eliminated = None;
        self.eliminations.clear();
        debug!("Reset bilinear form with {} DOFs", self.space.num_dofs());
    }
}

fn compute_element_matrix_into<T, S>(
    space: &S,
    integrators: &[SharedBilinearIntegrator<T, S>],
    buffers: &mut LocalBuffers<T>,
    element_index: usize,
) -> eyre::Result<()>
where
    T: Real,
    S: FiniteElementSpace + ?Sized,
{
    buffers.clear_dofs();
    space.populate_element_dofs(&mut buffers.test_dofs, element_index);
    buffers.use_test_dofs_as_trial();
    let element = space.element(element_index);
    buffers.sum_integrators(integrators, |integrator, output| {
        integrator.assemble_element_matrix(&element, output)
    })
}
