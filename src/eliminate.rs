//! Elimination of essential (Dirichlet) conditions from assembled sparse systems.
//!
//! Eliminating a DOF `k` from a square system zeroes row `k` and column `k` of the matrix,
//! except for the diagonal entry which is chosen by a [`DiagonalPolicy`]. The entries removed
//! from column `k` carry the coupling of the prescribed value to the other equations, and must
//! be moved to the right-hand side. This can happen immediately when the value is known
//! ([`eliminate_rows_cols_with_values`]), or later by keeping the removed entries in a separate
//! matrix ([`eliminate_rows_cols_deferred`]) that is applied to any number of right-hand sides.
//!
//! Both flavors are built on [`eliminate_rows_cols_with`], which performs the structural
//! zeroing and reports every removed entry to a caller-provided sink.
use crate::dof::{decode_signed_index, SignedDof};
use crate::error::FormError;
use crate::options::DiagonalPolicy;
use crate::space::FiniteElementSpace;
use crate::Real;
use itertools::Itertools;
use log::warn;
use nalgebra::DVector;
use nalgebra_sparse::CsrMatrix;
use std::collections::BTreeMap;
use weakform_sparse::ops::ensure_diagonal_entries;
use weakform_sparse::SparseAccumulator;

/// A set of constrained DOFs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EssentialSelection<'a> {
    /// Boundary attributes, where attribute `a` is selected if `marker[a - 1]` is set.
    BoundaryMarker(&'a [bool]),
    Dofs(&'a [usize]),
    /// DOFs with orientation, as produced by a space. Only the global index is used.
    SignedDofs(&'a [SignedDof]),
    /// DOFs in the legacy packed representation, see [`decode_signed_index`].
    EncodedDofs(&'a [isize]),
    /// One flag per DOF of the space.
    DofMarker(&'a [bool]),
}

impl<'a> EssentialSelection<'a> {
    /// Resolves the selection to a sorted list of distinct global DOF indices of the space.
    pub fn resolve<S: FiniteElementSpace + ?Sized>(&self, space: &S) -> Result<Vec<usize>, FormError> {
        let num_dofs = space.num_dofs();
        let mut dofs: Vec<usize> = match *self {
            EssentialSelection::BoundaryMarker(marker) => space
                .essential_dofs(marker)?
                .iter()
                .map(SignedDof::index)
                .collect(),
            EssentialSelection::Dofs(dofs) => dofs.to_vec(),
            EssentialSelection::SignedDofs(dofs) => dofs.iter().map(SignedDof::index).collect(),
            EssentialSelection::EncodedDofs(dofs) => dofs
                .iter()
                .map(|&d| decode_signed_index(d).index())
                .collect(),
            EssentialSelection::DofMarker(marker) => {
                if marker.len() != num_dofs {
                    return Err(FormError::DimensionMismatch {
                        what: "essential DOF marker",
                        expected: num_dofs,
                        actual: marker.len(),
                    });
                }
                marker.iter().positions(|&is_essential| is_essential).collect()
            }
        };

        if let Some(&dof) = dofs.iter().find(|&&dof| dof >= num_dofs) {
            return Err(FormError::DofOutOfRange { dof, num_dofs });
        }
        dofs.sort_unstable();
        dofs.dedup();
        Ok(dofs)
    }
}

/// An entry removed from the matrix by [`eliminate_rows_cols_with`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RemovedEntry<T> {
    /// A nonzero off-diagonal entry that was set to zero.
    ///
    /// `row_constrained` tells whether the entry was part of a constrained row. Entries of
    /// unconstrained rows always lie in a constrained column.
    OffDiagonal {
        row: usize,
        col: usize,
        value: T,
        row_constrained: bool,
    },
    /// The diagonal entry of a constrained row, after applying the diagonal policy.
    ///
    /// `removed` is the assembled value minus the new value `diagonal`.
    Diagonal { dof: usize, removed: T, diagonal: T },
}

fn membership(len: usize, dofs: &[usize]) -> Vec<bool> {
    let mut is_member = vec![false; len];
    for &dof in dofs {
        is_member[dof] = true;
    }
    is_member
}

fn policy_diagonal<T: Real>(dof: usize, assembled: T, policy: DiagonalPolicy) -> T {
    match policy {
        DiagonalPolicy::One => T::one(),
        DiagonalPolicy::Keep if assembled == T::zero() => {
            warn!("Assembled diagonal of eliminated DOF {dof} is zero, using one instead");
            T::one()
        }
        DiagonalPolicy::Keep => assembled,
    }
}

/// Eliminates the rows and columns of the given DOFs from a square matrix.
///
/// Off-diagonal entries in constrained rows and constrained columns are set to zero, and the
/// diagonal of each constrained row is set according to `policy`. Missing diagonal entries are
/// inserted first, which may change the sparsity pattern. Every removed entry is passed to
/// `record`, so that callers can move it to a right-hand side or into another matrix. All
/// entries are visited in a single pass over the matrix.
///
/// # Panics
///
/// Panics if the matrix is not square or a DOF is out of bounds.
pub fn eliminate_rows_cols_with<T: Real>(
    matrix: &mut CsrMatrix<T>,
    dofs: &[usize],
    policy: DiagonalPolicy,
    mut record: impl FnMut(RemovedEntry<T>),
) {
    assert_eq!(matrix.nrows(), matrix.ncols(), "Matrix must be square.");
    ensure_diagonal_entries(matrix, dofs);
    let is_constrained = membership(matrix.nrows(), dofs);

    for (i, mut row) in matrix.row_iter_mut().enumerate() {
        let (cols, values) = row.cols_and_values_mut();
        if is_constrained[i] {
            for (&j, value) in cols.iter().zip(values.iter_mut()) {
                if j == i {
                    let assembled = *value;
                    let diagonal = policy_diagonal(i, assembled, policy);
                    *value = diagonal;
                    record(RemovedEntry::Diagonal {
                        dof: i,
                        removed: assembled - diagonal,
                        diagonal,
                    });
                } else if *value != T::zero() {
                    record(RemovedEntry::OffDiagonal {
                        row: i,
                        col: j,
                        value: *value,
                        row_constrained: true,
                    });
                    *value = T::zero();
                }
            }
        } else {
            for (&j, value) in cols.iter().zip(values.iter_mut()) {
                if is_constrained[j] && *value != T::zero() {
                    record(RemovedEntry::OffDiagonal {
                        row: i,
                        col: j,
                        value: *value,
                        row_constrained: false,
                    });
                    *value = T::zero();
                }
            }
        }
    }
}

/// Eliminates DOFs with known values, correcting the right-hand side immediately.
///
/// For every unconstrained row `i`, `A(i, k) * solution[k]` is subtracted from `rhs[i]`, and
/// `rhs[k]` is set to `A(k, k) * solution[k]` with the diagonal chosen by `policy`. The
/// reduced system therefore has the solution `solution[k]` at every constrained DOF.
pub fn eliminate_rows_cols_with_values<T: Real>(
    matrix: &mut CsrMatrix<T>,
    dofs: &[usize],
    policy: DiagonalPolicy,
    solution: &DVector<T>,
    rhs: &mut DVector<T>,
) {
    assert_eq!(solution.len(), matrix.ncols(), "Solution must match matrix columns.");
    assert_eq!(rhs.len(), matrix.nrows(), "Right-hand side must match matrix rows.");
    eliminate_rows_cols_with(matrix, dofs, policy, |removed| match removed {
        RemovedEntry::OffDiagonal {
            row,
            col,
            value,
            row_constrained: false,
        } => rhs[row] -= value * solution[col],
        RemovedEntry::OffDiagonal { .. } => {}
        RemovedEntry::Diagonal { dof, diagonal, .. } => rhs[dof] = diagonal * solution[dof],
    });
}

/// Eliminates DOFs whose values are not yet known.
///
/// All removed entries are added to `eliminated`, including the change of the diagonal. The
/// right-hand side correction is applied later with [`eliminate_dofs_in_rhs`].
pub fn eliminate_rows_cols_deferred<T: Real>(
    matrix: &mut CsrMatrix<T>,
    dofs: &[usize],
    policy: DiagonalPolicy,
    eliminated: &mut SparseAccumulator<T>,
) {
    eliminate_rows_cols_with(matrix, dofs, policy, |removed| match removed {
        RemovedEntry::OffDiagonal { row, col, value, .. } => eliminated.add_entry(row, col, value),
        RemovedEntry::Diagonal { dof, removed, .. } => {
            if removed != T::zero() {
                eliminated.add_entry(dof, dof, removed);
            }
        }
    });
}

/// Applies a deferred elimination to a right-hand side.
///
/// Computes `rhs -= eliminated * x` and then sets `rhs[k] = A(k, k) * x[k]` for every
/// constrained DOF `k`, where `A` is the reduced matrix.
pub fn eliminate_dofs_in_rhs<T: Real>(
    matrix: &CsrMatrix<T>,
    eliminated: &CsrMatrix<T>,
    dofs: &[usize],
    x: &DVector<T>,
    rhs: &mut DVector<T>,
) {
    weakform_sparse::ops::spmv(T::one(), rhs, -T::one(), eliminated, x);
    for &dof in dofs {
        rhs[dof] = weakform_sparse::ops::diagonal_entry(matrix, dof) * x[dof];
    }
}

/// Zeroes the given columns of a (possibly rectangular) matrix.
///
/// Every removed nonzero entry is passed to `record` as `(row, col, value)`.
pub fn eliminate_columns<T: Real>(matrix: &mut CsrMatrix<T>, dofs: &[usize], mut record: impl FnMut(usize, usize, T)) {
    let is_constrained = membership(matrix.ncols(), dofs);
    for (i, mut row) in matrix.row_iter_mut().enumerate() {
        let (cols, values) = row.cols_and_values_mut();
        for (&j, value) in cols.iter().zip(values.iter_mut()) {
            if is_constrained[j] && *value != T::zero() {
                record(i, j, *value);
                *value = T::zero();
            }
        }
    }
}

/// Zeroes the given rows of a (possibly rectangular) matrix.
pub fn eliminate_rows<T: Real>(matrix: &mut CsrMatrix<T>, dofs: &[usize]) {
    for &dof in dofs {
        matrix.row_mut(dof).values_mut().fill(T::zero());
    }
}

/// How a DOF has been eliminated.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) enum EliminationState<T> {
    /// Eliminated with a known value.
    Value(T),
    /// Eliminated from the matrix only. The value becomes known once a linear system is formed.
    Deferred { prescribed: Option<T> },
}

/// Keeps track of eliminated DOFs, so that repeated eliminations are consistent.
#[derive(Debug, Clone)]
pub(crate) struct EliminationLedger<T> {
    states: BTreeMap<usize, EliminationState<T>>,
}

impl<T> Default for EliminationLedger<T> {
    fn default() -> Self {
        Self { states: BTreeMap::new() }
    }
}

impl<T: Real> EliminationLedger<T> {
    /// Registers the requested eliminations and returns the DOFs that were not eliminated yet.
    ///
    /// Repeating an elimination with the same value (or repeating a deferred elimination) is a
    /// no-op. A different value or a different flavor is an error, in which case nothing is
    /// registered.
    pub fn register(
        &mut self,
        dofs: &[usize],
        requested: impl Fn(usize) -> EliminationState<T>,
    ) -> Result<Vec<usize>, FormError> {
        let mut fresh = Vec::new();
        for &dof in dofs {
            match (self.states.get(&dof), requested(dof)) {
                (None, _) => fresh.push(dof),
                (Some(EliminationState::Value(existing)), EliminationState::Value(value)) => {
                    if *existing != value {
                        return Err(FormError::ConflictingEliminationValue { dof });
                    }
                }
                (Some(EliminationState::Deferred { .. }), EliminationState::Deferred { .. }) => {}
                (Some(_), _) => return Err(FormError::ConflictingEliminationFlavor { dof }),
            }
        }
        for &dof in &fresh {
            self.states.insert(dof, requested(dof));
        }
        Ok(fresh)
    }

    /// Records the values of deferred eliminations.
    pub fn prescribe(&mut self, dofs: &[usize], x: &DVector<T>) {
        for &dof in dofs {
            if let Some(EliminationState::Deferred { prescribed }) = self.states.get_mut(&dof) {
                *prescribed = Some(x[dof]);
            }
        }
    }

    pub fn deferred_dofs(&self) -> Vec<usize> {
        self.states
            .iter()
            .filter(|(_, state)| matches!(state, EliminationState::Deferred { .. }))
            .map(|(&dof, _)| dof)
            .collect()
    }

    /// All eliminated DOFs with a known value.
    pub fn prescribed_values(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.states.iter().filter_map(|(&dof, state)| match *state {
            EliminationState::Value(value) => Some((dof, value)),
            EliminationState::Deferred { prescribed } => prescribed.map(|value| (dof, value)),
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Fails if any DOF was eliminated, since new contributions would re-populate its row and column.
    pub fn ensure_empty(&self) -> Result<(), FormError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(FormError::AssemblyAfterElimination {
                num_eliminated: self.len(),
            })
        }
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}
