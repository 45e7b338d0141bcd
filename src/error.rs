//! Structural errors reported by assembly and elimination.
//!
//! Fallible operations return [`eyre::Result`]. Conditions caused by a misconfigured form or
//! inconsistent input are reported as a [`FormError`] inside the report, so callers can tell
//! them apart from integrator failures with `report.downcast_ref::<FormError>()`.
use crate::integrator::IntegratorKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("integrator does not support {kind} assembly")]
    UnsupportedIntegrator { kind: IntegratorKind },

    #[error("trial and test spaces are incompatible: {reason}")]
    MismatchedSpaces { reason: String },

    #[error("{what} has length {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{what} index {index} is out of range for length {len}")]
    IndexOutOfRange { what: &'static str, index: usize, len: usize },

    #[error(
        "boundary element {boundary_element} has attribute {attribute}, \
         but the essential marker only covers attributes 1..={marker_len}"
    )]
    AttributeOutOfRange {
        boundary_element: usize,
        attribute: usize,
        marker_len: usize,
    },

    #[error("DOF {dof} is out of range for a space with {num_dofs} DOFs")]
    DofOutOfRange { dof: usize, num_dofs: usize },

    #[error("DOF {dof} was already eliminated with a different prescribed value")]
    ConflictingEliminationValue { dof: usize },

    #[error("DOF {dof} was already eliminated with the other elimination flavor")]
    ConflictingEliminationFlavor { dof: usize },

    #[error("no eliminated contribution matrix is available; eliminate the DOFs from the matrix first")]
    MissingEliminatedMatrix,

    #[error("the system matrix has not been finalized")]
    NotFinalized,

    #[error("{num_eliminated} DOFs were already eliminated; call `update` before assembling again")]
    AssemblyAfterElimination { num_eliminated: usize },
}
