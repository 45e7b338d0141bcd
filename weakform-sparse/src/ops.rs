//! CSR kernels used by form assembly and boundary condition elimination.
use crate::Real;
use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix, SparseEntry};

/// Computes `y = beta * y + alpha * A * x`.
///
/// # Panics
///
/// Panics if the dimensions of `x` or `y` are incompatible with `a`.
pub fn spmv<T: Real>(beta: T, y: &mut DVector<T>, alpha: T, a: &CsrMatrix<T>, x: &DVector<T>) {
    assert_eq!(a.ncols(), x.len(), "Number of columns must match length of x.");
    assert_eq!(a.nrows(), y.len(), "Number of rows must match length of y.");

    for (y_i, row) in y.iter_mut().zip(a.row_iter()) {
        let mut dot = T::zero();
        for (&j, &a_ij) in row.col_indices().iter().zip(row.values()) {
            dot += a_ij * x[j];
        }
        *y_i = beta * *y_i + alpha * dot;
    }
}

/// Computes `y = beta * y + alpha * A^T * x`.
///
/// # Panics
///
/// Panics if the dimensions of `x` or `y` are incompatible with `a`.
pub fn spmv_transpose<T: Real>(beta: T, y: &mut DVector<T>, alpha: T, a: &CsrMatrix<T>, x: &DVector<T>) {
    assert_eq!(a.nrows(), x.len(), "Number of rows must match length of x.");
    assert_eq!(a.ncols(), y.len(), "Number of columns must match length of y.");

    y.scale_mut(beta);
    for (x_i, row) in x.iter().zip(a.row_iter()) {
        for (&j, &a_ij) in row.col_indices().iter().zip(row.values()) {
            y[j] += alpha * a_ij * *x_i;
        }
    }
}

/// Returns the stored diagonal entry of row `i`, or zero if none is stored.
pub fn diagonal_entry<T: Real>(a: &CsrMatrix<T>, i: usize) -> T {
    a.get_entry(i, i)
        .map(|entry| entry.into_value())
        .unwrap_or_else(T::zero)
}

/// Makes sure that the diagonal entries `(i, i)` for all given indices are part of the
/// sparsity pattern.
///
/// Missing entries are inserted as explicit zeros, which requires rebuilding the matrix.
/// Returns the number of inserted entries.
pub fn ensure_diagonal_entries<T: Real>(a: &mut CsrMatrix<T>, indices: &[usize]) -> usize {
    let mut missing: Vec<usize> = indices
        .iter()
        .copied()
        .filter(|&i| !has_stored_entry(a, i, i))
        .collect();
    missing.sort_unstable();
    missing.dedup();

    if !missing.is_empty() {
        let mut coo = CooMatrix::new(a.nrows(), a.ncols());
        for (i, j, v) in a.triplet_iter() {
            coo.push(i, j, *v);
        }
        for &i in &missing {
            coo.push(i, i, T::zero());
        }
        *a = CsrMatrix::from(&coo);
    }

    missing.len()
}

/// Whether `(i, j)` is part of the sparsity pattern of `a`.
pub fn has_stored_entry<T: Real>(a: &CsrMatrix<T>, i: usize, j: usize) -> bool {
    matches!(a.get_entry(i, j), Some(SparseEntry::NonZero(_)))
}

/// Checks whether `a` is numerically symmetric up to the given absolute tolerance.
pub fn is_symmetric<T: Real>(a: &CsrMatrix<T>, tol: T) -> bool {
    if a.nrows() != a.ncols() {
        return false;
    }
    a.triplet_iter().all(|(i, j, v_ij)| {
        let v_ji = a
            .get_entry(j, i)
            .map(|entry| entry.into_value())
            .unwrap_or_else(T::zero);
        (*v_ij - v_ji).abs() <= tol
    })
}
