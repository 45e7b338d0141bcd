//! Proptest strategies for DOFs, local matrices and small connectivity spaces.
use crate::connectivity::ConnectivitySpace;
use crate::dof::{Orientation, SignedDof};
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use nalgebra::DMatrix;

impl Arbitrary for Orientation {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![Just(Orientation::Positive), Just(Orientation::Negative)].boxed()
    }
}

/// Signed DOFs with index in `0 .. num_dofs`.
///
/// # Panics
///
/// Panics if `num_dofs` is zero.
pub fn signed_dof(num_dofs: usize) -> impl Strategy<Value = SignedDof> {
    assert!(num_dofs > 0, "Need at least one DOF to generate signed DOFs.");
    (0..num_dofs, any::<Orientation>()).prop_map(|(index, orientation)| SignedDof::new(index, orientation))
}

/// Matrices with small integer entries.
///
/// Sums of such entries are exact in floating point, so results do not depend on the order
/// of accumulation.
pub fn integer_matrix(nrows: usize, ncols: usize) -> impl Strategy<Value = DMatrix<f64>> {
    vec(-5i32..=5, nrows * ncols).prop_map(move |values| {
        DMatrix::from_iterator(nrows, ncols, values.into_iter().map(f64::from))
    })
}

/// A set of elements, each given by its signed DOFs and its local matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMatrixElements {
    pub num_dofs: usize,
    pub elements: Vec<(Vec<SignedDof>, DMatrix<f64>)>,
}

impl LocalMatrixElements {
    /// A space whose element data is the local matrix of the element.
    pub fn to_space(&self) -> ConnectivitySpace<DMatrix<f64>> {
        let mut space = ConnectivitySpace::new(self.num_dofs);
        for (dofs, matrix) in &self.elements {
            space
                .push_element(dofs.clone(), matrix.clone())
                .expect("Generated DOFs are always in range");
        }
        space
    }

    /// The same elements in a different order, where element `i` of the result is element
    /// `permutation[i]` of `self`.
    pub fn permuted(&self, permutation: &[usize]) -> Self {
        assert_eq!(permutation.len(), self.elements.len(), "Permutation must cover all elements.");
        Self {
            num_dofs: self.num_dofs,
            elements: permutation
                .iter()
                .map(|&i| self.elements[i].clone())
                .collect(),
        }
    }
}

/// Random elements over at most `max_dofs` DOFs, each with at most `max_local_dofs` local DOFs.
///
/// Local DOF lists may repeat global DOFs.
pub fn local_matrix_elements(
    max_dofs: usize,
    max_elements: usize,
    max_local_dofs: usize,
) -> impl Strategy<Value = LocalMatrixElements> {
    (1..=max_dofs.max(1)).prop_flat_map(move |num_dofs| {
        let element = (0..=max_local_dofs).prop_flat_map(move |local_dofs| {
            (vec(signed_dof(num_dofs), local_dofs), integer_matrix(local_dofs, local_dofs))
        });
        vec(element, 0..=max_elements).prop_map(move |elements| LocalMatrixElements { num_dofs, elements })
    })
}

/// Elements together with a permutation of their order.
pub fn local_matrix_elements_with_permutation(
    max_dofs: usize,
    max_elements: usize,
    max_local_dofs: usize,
) -> impl Strategy<Value = (LocalMatrixElements, Vec<usize>)> {
    local_matrix_elements(max_dofs, max_elements, max_local_dofs).prop_flat_map(|elements| {
        let permutation = Just((0..elements.elements.len()).collect::<Vec<_>>()).prop_shuffle();
        (Just(elements), permutation)
    })
}
