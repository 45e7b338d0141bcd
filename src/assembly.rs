//! Assembly of global matrices and vectors from element integrators.
use crate::assembly::buffers::{LocalBuffers, LocalContribution};
use crate::Real;
use rayon::prelude::*;
use weakform_sparse::SparseAccumulator;

pub mod bilinear;
pub mod global;
pub mod linear;
pub mod mixed;

mod buffers;

/// Computes the local contributions of `count` items and scatters them into the accumulator.
///
/// `compute` fills the buffers with the DOFs and local matrix of an item, and returns `false`
/// if the item contributes nothing (e.g. an unresolved face). With `parallel` set, local
/// matrices are computed with rayon and then scattered sequentially in item order, so the
/// accumulator is never shared between threads.
///
/// Returns the number of scattered contributions.
fn assemble_items<T, F>(
    accumulator: &mut SparseAccumulator<T>,
    count: usize,
    parallel: bool,
    skip_zeros: bool,
    compute: F,
) -> eyre::Result<usize>
where
    T: Real,
    F: Fn(&mut LocalBuffers<T>, usize) -> eyre::Result<bool> + Sync,
{
    let mut scattered = 0;
    if parallel {
        let contributions: Vec<Option<LocalContribution<T>>> = (0..count)
            .into_par_iter()
            .map_init(LocalBuffers::default, |buffers, index| -> eyre::Result<_> {
                let contributes = compute(buffers, index)?;
                Ok(contributes.then(|| buffers.to_contribution()))
            })
            .collect::<eyre::Result<_>>()?;
        for contribution in contributions.iter().flatten() {
            contribution.scatter_into(accumulator, skip_zeros);
            scattered += 1;
        }
    } else {
        let mut buffers = LocalBuffers::default();
        for index in 0..count {
            if compute(&mut buffers, index)? {
                buffers.scatter_into(accumulator, skip_zeros);
                scattered += 1;
            }
        }
    }
    Ok(scattered)
}
