use crate::Real;
use itertools::izip;
use nalgebra::base::storage::Storage;
use nalgebra::{DMatrix, Dim, Matrix};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

#[derive(Debug, Clone)]
enum AccumulatorState<T: Real> {
    /// Unsorted triplets, possibly with duplicate coordinates.
    Accumulating(CooMatrix<T>),
    Finalized(CsrMatrix<T>),
}

/// A global sparse matrix with additive insertion semantics.
///
/// Entries are collected as triplets while the accumulator is open. Duplicate coordinates are
/// allowed and are summed when the accumulator is finalized into CSR format. The result of
/// finalization is therefore independent of the order in which blocks were added.
///
/// Adding entries to a finalized accumulator re-opens it: the CSR entries are turned back into
/// triplets, and the matrix has to be finalized again before CSR access is possible.
#[derive(Debug, Clone)]
pub struct SparseAccumulator<T: Real> {
    state: AccumulatorState<T>,
}

impl<T: Real> SparseAccumulator<T> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            state: AccumulatorState::Accumulating(CooMatrix::new(nrows, ncols)),
        }
    }

    pub fn nrows(&self) -> usize {
        match &self.state {
            AccumulatorState::Accumulating(coo) => coo.nrows(),
            AccumulatorState::Finalized(csr) => csr.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match &self.state {
            AccumulatorState::Accumulating(coo) => coo.ncols(),
            AccumulatorState::Finalized(csr) => csr.ncols(),
        }
    }

    /// The number of stored entries.
    ///
    /// Before finalization this counts duplicate triplets individually.
    pub fn nnz(&self) -> usize {
        match &self.state {
            AccumulatorState::Accumulating(coo) => coo.nnz(),
            AccumulatorState::Finalized(csr) => csr.nnz(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, AccumulatorState::Finalized(_))
    }

    fn coo_mut(&mut self) -> &mut CooMatrix<T> {
        if let AccumulatorState::Finalized(csr) = &self.state {
            log::trace!(
                "Re-opening finalized {}x{} matrix with {} entries",
                csr.nrows(),
                csr.ncols(),
                csr.nnz()
            );
            let mut coo = CooMatrix::new(csr.nrows(), csr.ncols());
            for (i, j, v) in csr.triplet_iter() {
                coo.push(i, j, *v);
            }
            self.state = AccumulatorState::Accumulating(coo);
        }

        match &mut self.state {
            AccumulatorState::Accumulating(coo) => coo,
            AccumulatorState::Finalized(_) => unreachable!("Accumulator was re-opened above"),
        }
    }

    /// Adds `value` to the entry `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of bounds.
    pub fn add_entry(&mut self, i: usize, j: usize, value: T) {
        self.coo_mut().push(i, j, value);
    }

    /// Adds `block[(a, b)]` to the entry `(rows[a], cols[b])` for all `a` and `b`.
    ///
    /// Index sets may overlap and contain repeated indices, in which case all contributions
    /// are summed. If `skip_zeros` is set, exactly zero entries of the block are not stored.
    ///
    /// # Panics
    ///
    /// Panics if the block dimensions do not match the index sets, or if any index is out
    /// of bounds.
    pub fn add_block<R, C, S>(&mut self, rows: &[usize], cols: &[usize], block: &Matrix<T, R, C, S>, skip_zeros: bool)
    where
        R: Dim,
        C: Dim,
        S: Storage<T, R, C>,
    {
        assert_eq!(rows.len(), block.nrows(), "Row indices must match block rows.");
        assert_eq!(cols.len(), block.ncols(), "Column indices must match block columns.");

        let coo = self.coo_mut();
        for (b, &col) in cols.iter().enumerate() {
            for (a, &row) in rows.iter().enumerate() {
                let value = block[(a, b)];
                if !(skip_zeros && value == T::zero()) {
                    coo.push(row, col, value);
                }
            }
        }
    }

    /// Compacts the accumulated triplets into CSR format.
    ///
    /// Duplicate entries are summed. If `skip_zeros` is set, off-diagonal entries that sum to
    /// exactly zero are dropped from the sparsity pattern. Stored diagonal entries are always
    /// retained so that they can later be modified in place. Finalizing an already finalized
    /// matrix does nothing.
    pub fn finalize(&mut self, skip_zeros: bool) {
        if let AccumulatorState::Accumulating(coo) = &self.state {
            let csr = CsrMatrix::from(coo);
            let csr = if skip_zeros {
                csr.filter(|i, j, v| i == j || *v != T::zero())
            } else {
                csr
            };
            log::trace!(
                "Finalized {}x{} matrix: {} triplets compacted into {} entries",
                csr.nrows(),
                csr.ncols(),
                coo.nnz(),
                csr.nnz()
            );
            self.state = AccumulatorState::Finalized(csr);
        }
    }

    /// Returns the CSR matrix if the accumulator is finalized.
    pub fn csr(&self) -> Option<&CsrMatrix<T>> {
        match &self.state {
            AccumulatorState::Finalized(csr) => Some(csr),
            AccumulatorState::Accumulating(_) => None,
        }
    }

    /// Finalizes the accumulator if necessary and returns the CSR matrix.
    pub fn finalized_mut(&mut self, skip_zeros: bool) -> &mut CsrMatrix<T> {
        self.finalize(skip_zeros);
        match &mut self.state {
            AccumulatorState::Finalized(csr) => csr,
            AccumulatorState::Accumulating(_) => unreachable!("Accumulator was finalized above"),
        }
    }

    pub fn into_csr(mut self, skip_zeros: bool) -> CsrMatrix<T> {
        self.finalize(skip_zeros);
        match self.state {
            AccumulatorState::Finalized(csr) => csr,
            AccumulatorState::Accumulating(_) => unreachable!("Accumulator was finalized above"),
        }
    }

    /// Returns the value of entry `(i, j)`, which is zero if no entry is stored.
    ///
    /// Before finalization this sums all triplets at `(i, j)` and is therefore linear in the
    /// number of stored triplets.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.nrows() && j < self.ncols(), "Entry ({i}, {j}) is out of bounds.");
        match &self.state {
            AccumulatorState::Finalized(csr) => csr
                .get_entry(i, j)
                .map(|entry| entry.into_value())
                .unwrap_or_else(T::zero),
            AccumulatorState::Accumulating(coo) => {
                let mut sum = T::zero();
                for (row, col, v) in coo.triplet_iter() {
                    if row == i && col == j {
                        sum += *v;
                    }
                }
                sum
            }
        }
    }

    /// Builds a dense matrix with the same (summed) entries.
    pub fn to_dense(&self) -> DMatrix<T> {
        let mut dense = DMatrix::zeros(self.nrows(), self.ncols());
        match &self.state {
            AccumulatorState::Finalized(csr) => {
                for (i, j, v) in csr.triplet_iter() {
                    dense[(i, j)] += *v;
                }
            }
            AccumulatorState::Accumulating(coo) => {
                let (rows, cols, values) = (coo.row_indices(), coo.col_indices(), coo.values());
                for (&i, &j, v) in izip!(rows, cols, values) {
                    dense[(i, j)] += *v;
                }
            }
        }
        dense
    }
}
