use serde::{Deserialize, Serialize};

/// How the diagonal entry of an eliminated row is treated.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagonalPolicy {
    /// Keep the assembled diagonal entry, preserving the scaling of the matrix.
    ///
    /// A zero diagonal cannot be kept without making the system singular, so it is replaced
    /// by one.
    Keep,
    /// Set the diagonal entry to one.
    #[default]
    One,
}

/// Options that control assembly and elimination.
///
/// Passed to the form constructors. Operations that take an explicit `skip_zeros` or
/// [`DiagonalPolicy`] argument use that argument instead; the options are used whenever a
/// form finalizes or eliminates implicitly, e.g. in `form_linear_system`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyOptions {
    /// Whether exactly zero entries are left out of the sparsity pattern.
    pub skip_zeros: bool,
    pub diagonal_policy: DiagonalPolicy,
    /// Compute local element matrices in parallel.
    ///
    /// The scatter into the global matrix is always sequential.
    pub parallel: bool,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            skip_zeros: true,
            diagonal_policy: DiagonalPolicy::default(),
            parallel: false,
        }
    }
}

impl AssemblyOptions {
    pub fn with_skip_zeros(self, skip_zeros: bool) -> Self {
        Self { skip_zeros, ..self }
    }

    pub fn with_diagonal_policy(self, diagonal_policy: DiagonalPolicy) -> Self {
        Self {
            diagonal_policy,
            ..self
        }
    }

    pub fn with_parallel(self, parallel: bool) -> Self {
        Self { parallel, ..self }
    }
}
