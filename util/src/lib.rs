use nalgebra::{ClosedAdd, DMatrix, Scalar};
use nalgebra_sparse::CsrMatrix;
use num::Zero;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

/// Asserts that the result is an error carrying a `weakform` error matching the given pattern.
#[macro_export]
macro_rules! assert_form_error {
    ($result:expr, $pattern:pat) => {{
        let report = match $result {
            Ok(_) => panic!("assert_form_error!({}) failed: expected an error", stringify!($result)),
            Err(report) => eyre::Report::from(report),
        };
        match report.downcast_ref::<weakform::error::FormError>() {
            Some($pattern) => {}
            other => panic!("unexpected error: {:?} (report: {:?})", other, report),
        }
    }};
}

/// Dense copy of a CSR matrix, convenient for comparisons in tests.
pub fn dense<T: Scalar + Zero + ClosedAdd>(matrix: &CsrMatrix<T>) -> DMatrix<T> {
    DMatrix::from(matrix)
}

/// Builds a dense matrix from rows of `i32` values.
pub fn dmatrix_from_rows(rows: &[&[i32]]) -> DMatrix<f64> {
    let nrows = rows.len();
    let ncols = rows.first().map(|row| row.len()).unwrap_or(0);
    DMatrix::from_fn(nrows, ncols, |i, j| {
        assert_eq!(rows[i].len(), ncols, "All rows must have the same length.");
        f64::from(rows[i][j])
    })
}
