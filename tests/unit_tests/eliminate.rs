use crate::{chain_space, copy_local_matrix, laplace_1d, single_element_space, transposed_local_matrix};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::Arc;
use util::{assert_form_error, dense, dmatrix_from_rows};
use weakform::assembly::bilinear::BilinearForm;
use weakform::connectivity::ConnectivitySpace;
use weakform::dof::SignedDof;
use weakform::eliminate::{eliminate_rows_cols_with, EssentialSelection, RemovedEntry};
use weakform::error::FormError;
use weakform::integrator::FnIntegrator;
use weakform::options::{AssemblyOptions, DiagonalPolicy};
use weakform::proptest::{local_matrix_elements, LocalMatrixElements};
use weakform::sparse_ops::is_symmetric;

fn assembled_form(matrix: DMatrix<f64>) -> BilinearForm<f64, ConnectivitySpace<DMatrix<f64>>> {
    let mut form = BilinearForm::<f64, _>::new(Arc::new(single_element_space(matrix)));
    form.add_domain_integrator(FnIntegrator(copy_local_matrix))
        .unwrap();
    form.assemble(true).unwrap();
    form.finalize(true);
    form
}

#[test]
fn eliminate_with_value_and_unit_diagonal() {
    let mut form = assembled_form(dmatrix_from_rows(&[&[4, 1], &[1, 4]]));
    let solution = DVector::from_column_slice(&[5.0, 0.0]);
    let mut rhs = DVector::from_column_slice(&[10.0, 10.0]);

    form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &solution, &mut rhs, DiagonalPolicy::One)
        .unwrap();

    let reduced = dense(form.matrix().unwrap());
    assert_matrix_eq!(reduced, dmatrix_from_rows(&[&[1, 0], &[0, 4]]));
    assert_eq!(rhs, DVector::from_column_slice(&[5.0, 5.0]));

    let x = reduced.lu().solve(&rhs).unwrap();
    assert_matrix_eq!(x, DVector::from_column_slice(&[5.0, 1.25]), comp = abs, tol = 1e-14);
}

#[test]
fn eliminate_with_value_and_kept_diagonal() {
    let mut form = assembled_form(dmatrix_from_rows(&[&[4, 1], &[1, 4]]));
    let solution = DVector::from_column_slice(&[5.0, 0.0]);
    let mut rhs = DVector::from_column_slice(&[10.0, 10.0]);

    form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &solution, &mut rhs, DiagonalPolicy::Keep)
        .unwrap();

    let reduced = dense(form.matrix().unwrap());
    assert_matrix_eq!(reduced, dmatrix_from_rows(&[&[4, 0], &[0, 4]]));
    assert_eq!(rhs, DVector::from_column_slice(&[20.0, 5.0]));
    let x = reduced.lu().solve(&rhs).unwrap();
    assert_matrix_eq!(x, DVector::from_column_slice(&[5.0, 1.25]), comp = abs, tol = 1e-14);
}

#[test]
fn kept_zero_diagonal_falls_back_to_one() {
    let mut form = assembled_form(dmatrix_from_rows(&[&[0, 2], &[2, 3]]));
    let solution = DVector::from_column_slice(&[1.5, 0.0]);
    let mut rhs = DVector::zeros(2);
    form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &solution, &mut rhs, DiagonalPolicy::Keep)
        .unwrap();
    assert_matrix_eq!(dense(form.matrix().unwrap()), dmatrix_from_rows(&[&[1, 0], &[0, 3]]));
    assert_eq!(rhs, DVector::from_column_slice(&[1.5, -3.0]));
}

#[test]
fn missing_diagonal_entry_is_inserted() {
    // With skip_zeros, the zero diagonal never enters the sparsity pattern
    let mut form = BilinearForm::<f64, _>::new(Arc::new(single_element_space(dmatrix_from_rows(&[&[0, 2], &[2, 0]]))));
    form.add_domain_integrator(FnIntegrator(copy_local_matrix))
        .unwrap();
    form.assemble(true).unwrap();
    form.finalize(true);
    assert_eq!(form.matrix().unwrap().nnz(), 2);

    form.eliminate_essential_bc_matrix(EssentialSelection::Dofs(&[1]), DiagonalPolicy::One)
        .unwrap();
    assert_matrix_eq!(dense(form.matrix().unwrap()), dmatrix_from_rows(&[&[0, 0], &[0, 1]]));
    // The change of the diagonal is recorded as well
    assert_matrix_eq!(
        dense(form.eliminated_matrix().unwrap()),
        dmatrix_from_rows(&[&[0, 2], &[2, -1]])
    );
}

#[test]
fn elimination_finalizes_implicitly() {
    let mut form = BilinearForm::<f64, _>::new(Arc::new(chain_space(2, 2.0)));
    form.add_domain_integrator(FnIntegrator(laplace_1d)).unwrap();
    form.assemble(true).unwrap();
    assert!(form.matrix().is_none());

    let solution = DVector::zeros(3);
    let mut rhs = DVector::zeros(3);
    form.eliminate_essential_bc(EssentialSelection::BoundaryMarker(&[true, false]), &solution, &mut rhs, DiagonalPolicy::One)
        .unwrap();
    assert_matrix_eq!(
        dense(form.matrix().unwrap()),
        dmatrix_from_rows(&[&[1, 0, 0], &[0, 2, -1], &[0, -1, 1]]),
        comp = abs,
        tol = 1e-14
    );
}

#[test]
fn deferred_elimination_matches_elimination_with_values() {
    #[rustfmt::skip]
    let matrix = dmatrix_from_rows(&[
        &[ 4, -1,  2,  0],
        &[-1,  5,  1, -2],
        &[ 2,  1,  6,  1],
        &[ 0, -2,  1,  3],
    ]);
    let x = DVector::from_column_slice(&[1.0, -2.0, 0.5, 3.0]);
    let b = DVector::from_column_slice(&[1.0, 2.0, 3.0, 4.0]);
    let dofs = [1, 3];

    for policy in [DiagonalPolicy::One, DiagonalPolicy::Keep] {
        let mut immediate = assembled_form(matrix.clone());
        let mut rhs_immediate = b.clone();
        immediate
            .eliminate_essential_bc(EssentialSelection::Dofs(&dofs), &x, &mut rhs_immediate, policy)
            .unwrap();

        let mut deferred = assembled_form(matrix.clone());
        deferred
            .eliminate_essential_bc_matrix(EssentialSelection::Dofs(&dofs), policy)
            .unwrap();
        let mut rhs_deferred = b.clone();
        deferred
            .eliminate_vdofs_in_rhs(&x, &mut rhs_deferred)
            .unwrap();

        assert_eq!(immediate.matrix(), deferred.matrix());
        assert_matrix_eq!(rhs_immediate, rhs_deferred, comp = abs, tol = 1e-12);

        // The correction can be applied to several right-hand sides
        let mut other_rhs = DVector::zeros(4);
        deferred.eliminate_vdofs_in_rhs(&x, &mut other_rhs).unwrap();
        assert_matrix_eq!(other_rhs, &rhs_deferred - &b, comp = abs, tol = 1e-12);
    }
}

#[test]
fn selections_resolve_to_the_same_dofs() {
    let space = chain_space(3, 1.0);
    let expected = vec![0, 3];
    let signed = [SignedDof::negative(3), SignedDof::positive(0)];
    let selections = [
        EssentialSelection::BoundaryMarker(&[true, true]),
        EssentialSelection::Dofs(&[3, 0, 3]),
        EssentialSelection::SignedDofs(&signed),
        EssentialSelection::EncodedDofs(&[-4, 0]),
        EssentialSelection::DofMarker(&[true, false, false, true]),
    ];
    for selection in selections {
        assert_eq!(selection.resolve(&space).unwrap(), expected);
    }
    assert_eq!(
        EssentialSelection::BoundaryMarker(&[false, true])
            .resolve(&space)
            .unwrap(),
        vec![3]
    );
}

#[test]
fn invalid_selections_are_rejected() {
    let space = chain_space(3, 1.0);
    assert_form_error!(
        EssentialSelection::Dofs(&[4]).resolve(&space),
        FormError::DofOutOfRange { dof: 4, num_dofs: 4 }
    );
    assert_form_error!(
        EssentialSelection::EncodedDofs(&[-5]).resolve(&space),
        FormError::DofOutOfRange { dof: 4, num_dofs: 4 }
    );
    // The right end point has attribute 2, which the marker does not cover
    assert_form_error!(
        EssentialSelection::BoundaryMarker(&[true]).resolve(&space),
        FormError::AttributeOutOfRange {
            boundary_element: 1,
            attribute: 2,
            marker_len: 1
        }
    );
    assert_form_error!(
        EssentialSelection::DofMarker(&[true]).resolve(&space),
        FormError::DimensionMismatch { expected: 4, actual: 1, .. }
    );
}

#[test]
fn eliminating_with_conflicting_values_fails_without_side_effects() {
    let mut form = assembled_form(dmatrix_from_rows(&[&[4, 1, 0], &[1, 4, 1], &[0, 1, 4]]));
    let mut rhs = DVector::zeros(3);
    let solution = DVector::from_column_slice(&[1.0, 0.0, 2.0]);
    form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &solution, &mut rhs, DiagonalPolicy::One)
        .unwrap();

    // Same value again is fine and only resets the right-hand side entry
    let mut rhs_again = DVector::zeros(3);
    form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &solution, &mut rhs_again, DiagonalPolicy::One)
        .unwrap();
    assert_eq!(rhs_again, DVector::from_column_slice(&[1.0, 0.0, 0.0]));

    let before = form.matrix().unwrap().clone();
    let other = DVector::from_column_slice(&[3.0, 0.0, 2.0]);
    let mut rhs_other = DVector::zeros(3);
    assert_form_error!(
        form.eliminate_essential_bc(EssentialSelection::Dofs(&[2, 0]), &other, &mut rhs_other, DiagonalPolicy::One),
        FormError::ConflictingEliminationValue { dof: 0 }
    );
    assert_eq!(form.matrix().unwrap(), &before);
    assert_eq!(rhs_other, DVector::zeros(3));

    assert_form_error!(
        form.eliminate_essential_bc_matrix(EssentialSelection::Dofs(&[0]), DiagonalPolicy::One),
        FormError::ConflictingEliminationFlavor { dof: 0 }
    );
}

#[test]
fn deferred_then_known_value_is_a_flavor_conflict() {
    let mut form = assembled_form(dmatrix_from_rows(&[&[2, 1], &[1, 2]]));
    form.eliminate_essential_bc_matrix(EssentialSelection::Dofs(&[1]), DiagonalPolicy::One)
        .unwrap();
    // Repeating a deferred elimination is fine
    form.eliminate_essential_bc_matrix(EssentialSelection::Dofs(&[1]), DiagonalPolicy::One)
        .unwrap();
    let mut rhs = DVector::zeros(2);
    assert_form_error!(
        form.eliminate_essential_bc_from_dofs(&[false, true], &DVector::zeros(2), &mut rhs, DiagonalPolicy::One),
        FormError::ConflictingEliminationFlavor { dof: 1 }
    );
}

fn laplace_chain_form() -> BilinearForm<f64, ConnectivitySpace<f64>> {
    let mut form = BilinearForm::<f64, _>::new(Arc::new(chain_space(2, 2.0)));
    form.add_domain_integrator(FnIntegrator(laplace_1d)).unwrap();
    form.assemble(true).unwrap();
    form.finalize(true);
    form
}

#[test]
fn assembling_after_elimination_with_values_is_rejected() {
    let mut form = laplace_chain_form();
    let solution = DVector::from_column_slice(&[5.0, 0.0, 0.0]);
    let mut rhs = DVector::from_column_slice(&[10.0, 0.0, 0.0]);
    form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &solution, &mut rhs, DiagonalPolicy::One)
        .unwrap();
    let reduced = dmatrix_from_rows(&[&[1, 0, 0], &[0, 2, -1], &[0, -1, 1]]);
    assert_matrix_eq!(dense(form.matrix().unwrap()), reduced);
    assert_eq!(rhs, DVector::from_column_slice(&[5.0, 5.0, 0.0]));

    assert_form_error!(form.assemble(true), FormError::AssemblyAfterElimination { num_eliminated: 1 });
    assert_form_error!(
        form.assemble_element_matrix(0, &DMatrix::identity(2, 2), true),
        FormError::AssemblyAfterElimination { num_eliminated: 1 }
    );
    // The reduced system is left untouched
    assert!(form.is_finalized());
    assert_matrix_eq!(dense(form.matrix().unwrap()), reduced);

    // After a reset, assembling and eliminating again reproduces the reduced system
    form.update(None);
    form.assemble(true).unwrap();
    let mut rhs = DVector::from_column_slice(&[10.0, 0.0, 0.0]);
    form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &solution, &mut rhs, DiagonalPolicy::One)
        .unwrap();
    assert_matrix_eq!(dense(form.matrix().unwrap()), reduced);
    assert_eq!(rhs, DVector::from_column_slice(&[5.0, 5.0, 0.0]));
}

#[test]
fn assembling_after_deferred_elimination_is_rejected() {
    let x = DVector::from_column_slice(&[5.0, 0.0, 0.0]);
    let b = DVector::from_column_slice(&[10.0, 0.0, 0.0]);

    let mut form = laplace_chain_form();
    let first_b = form
        .form_linear_system(EssentialSelection::Dofs(&[0]), &x, &b)
        .unwrap()
        .b;
    assert_eq!(first_b, DVector::from_column_slice(&[5.0, 5.0, 0.0]));

    assert_form_error!(form.assemble(true), FormError::AssemblyAfterElimination { num_eliminated: 1 });
    assert!(form.eliminated_matrix().is_some());

    form.update(None);
    form.assemble(true).unwrap();
    let system = form
        .form_linear_system(EssentialSelection::Dofs(&[0]), &x, &b)
        .unwrap();
    assert_eq!(system.b, first_b);
    assert_matrix_eq!(
        dense(system.matrix),
        dmatrix_from_rows(&[&[1, 0, 0], &[0, 2, -1], &[0, -1, 1]])
    );

    // Reassembly is also rejected for eliminations from the matrix alone
    let mut form = laplace_chain_form();
    form.eliminate_essential_bc_matrix(EssentialSelection::Dofs(&[2]), DiagonalPolicy::Keep)
        .unwrap();
    assert_form_error!(form.assemble(false), FormError::AssemblyAfterElimination { .. });
}

#[test]
fn eliminate_vdofs_ignores_orientation() {
    let matrix = dmatrix_from_rows(&[&[4, 1, 0], &[1, 4, 1], &[0, 1, 4]]);
    let vdofs = [SignedDof::negative(2)];
    let x = DVector::from_column_slice(&[0.0, 0.0, 2.0]);

    let mut signed = assembled_form(matrix.clone());
    let mut rhs_signed = DVector::zeros(3);
    signed
        .eliminate_vdofs(&vdofs, &x, &mut rhs_signed, DiagonalPolicy::One)
        .unwrap();

    let mut plain = assembled_form(matrix.clone());
    let mut rhs_plain = DVector::zeros(3);
    plain
        .eliminate_essential_bc(EssentialSelection::Dofs(&[2]), &x, &mut rhs_plain, DiagonalPolicy::One)
        .unwrap();
    assert_eq!(signed.matrix(), plain.matrix());
    assert_eq!(rhs_signed, DVector::from_column_slice(&[0.0, -2.0, 2.0]));
    assert_eq!(rhs_signed, rhs_plain);

    let mut deferred = assembled_form(matrix);
    deferred
        .eliminate_vdofs_matrix(&vdofs, DiagonalPolicy::One)
        .unwrap();
    let mut rhs_deferred = DVector::zeros(3);
    deferred
        .eliminate_vdofs_in_rhs(&x, &mut rhs_deferred)
        .unwrap();
    assert_eq!(rhs_deferred, rhs_signed);
}

#[test]
fn eliminate_vdofs_in_rhs_requires_eliminated_matrix() {
    let form = assembled_form(dmatrix_from_rows(&[&[2, 1], &[1, 2]]));
    let mut b = DVector::zeros(2);
    assert_form_error!(
        form.eliminate_vdofs_in_rhs(&DVector::zeros(2), &mut b),
        FormError::MissingEliminatedMatrix
    );
}

#[test]
fn eliminate_dimension_mismatch_is_reported() {
    let mut form = assembled_form(dmatrix_from_rows(&[&[2, 1], &[1, 2]]));
    let mut rhs = DVector::zeros(3);
    assert_form_error!(
        form.eliminate_essential_bc(EssentialSelection::Dofs(&[0]), &DVector::zeros(2), &mut rhs, DiagonalPolicy::One),
        FormError::DimensionMismatch {
            what: "rhs",
            expected: 2,
            actual: 3
        }
    );
}

#[test]
fn form_linear_system_and_recover_solution() {
    for policy in [DiagonalPolicy::One, DiagonalPolicy::Keep] {
        let options = AssemblyOptions::default().with_diagonal_policy(policy);
        let mut form = BilinearForm::<f64, _>::with_options(Arc::new(chain_space(4, 4.0)), options);
        form.add_domain_integrator(FnIntegrator(laplace_1d)).unwrap();
        form.assemble(true).unwrap();

        // Prescribe u(0) = 1 and u(4) = 5 with a zero source, so u(x) = 1 + x
        let mut x = DVector::zeros(5);
        x[0] = 1.0;
        x[4] = 5.0;
        let b = DVector::zeros(5);
        let system = form
            .form_linear_system(EssentialSelection::BoundaryMarker(&[true, true]), &x, &b)
            .unwrap();
        assert_eq!(system.x, x);
        let reduced_x = DMatrix::from(system.matrix)
            .lu()
            .solve(&system.b)
            .unwrap();

        let mut solution = DVector::zeros(5);
        form.recover_fem_solution(&reduced_x, &b, &mut solution)
            .unwrap();
        assert_eq!(solution[0], 1.0);
        assert_eq!(solution[4], 5.0);
        assert_matrix_eq!(
            solution,
            DVector::from_column_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            comp = abs,
            tol = 1e-12
        );
    }
}

#[test]
fn recover_without_eliminations_copies_solution() {
    let form = assembled_form(dmatrix_from_rows(&[&[2, 1], &[1, 2]]));
    let reduced = DVector::from_column_slice(&[0.5, 0.25]);
    let mut x = DVector::zeros(2);
    form.recover_fem_solution(&reduced, &DVector::zeros(2), &mut x)
        .unwrap();
    assert_eq!(x, reduced);
    assert_form_error!(
        form.recover_fem_solution(&reduced, &DVector::zeros(3), &mut x),
        FormError::DimensionMismatch { what: "b", .. }
    );
}

#[test]
fn eliminate_rows_cols_with_reports_removed_entries() {
    let mut matrix = CsrMatrix::from(&dmatrix_from_rows(&[&[4, 1, 0], &[1, 5, 2], &[0, 2, 6]]));
    let mut removed = Vec::new();
    eliminate_rows_cols_with(&mut matrix, &[1], DiagonalPolicy::One, |entry| removed.push(entry));

    assert_eq!(
        removed,
        vec![
            RemovedEntry::OffDiagonal {
                row: 0,
                col: 1,
                value: 1.0,
                row_constrained: false
            },
            RemovedEntry::OffDiagonal {
                row: 1,
                col: 0,
                value: 1.0,
                row_constrained: true
            },
            RemovedEntry::Diagonal {
                dof: 1,
                removed: 4.0,
                diagonal: 1.0
            },
            RemovedEntry::OffDiagonal {
                row: 1,
                col: 2,
                value: 2.0,
                row_constrained: true
            },
            RemovedEntry::OffDiagonal {
                row: 2,
                col: 1,
                value: 2.0,
                row_constrained: false
            },
        ]
    );
    assert_matrix_eq!(DMatrix::from(&matrix), dmatrix_from_rows(&[&[4, 0, 0], &[0, 1, 0], &[0, 0, 6]]));
}

fn elements_with_dof_marker() -> impl Strategy<Value = (LocalMatrixElements, Vec<bool>)> {
    local_matrix_elements(6, 6, 4).prop_flat_map(|elements| {
        let marker = vec(any::<bool>(), elements.num_dofs);
        (Just(elements), marker)
    })
}

proptest! {
    #[test]
    fn kept_diagonal_elimination_preserves_symmetry((elements, marker) in elements_with_dof_marker()) {
        let mut form = BilinearForm::<f64, _>::new(Arc::new(elements.to_space()));
        form.add_domain_integrator(FnIntegrator(copy_local_matrix)).unwrap();
        form.add_domain_integrator(FnIntegrator(transposed_local_matrix)).unwrap();
        form.assemble(true).unwrap();
        form.finalize(true);
        prop_assert!(is_symmetric(form.matrix().unwrap(), 0.0));

        let n = elements.num_dofs;
        let mut rhs = DVector::zeros(n);
        form.eliminate_essential_bc_from_dofs(&marker, &DVector::from_element(n, 1.0), &mut rhs, DiagonalPolicy::Keep)
            .unwrap();
        prop_assert!(is_symmetric(form.matrix().unwrap(), 0.0));
    }

    #[test]
    fn reduced_and_eliminated_matrices_sum_to_original(
        (elements, marker) in elements_with_dof_marker(),
        unit_diagonal in any::<bool>()
    ) {
        let policy = if unit_diagonal { DiagonalPolicy::One } else { DiagonalPolicy::Keep };
        let mut form = BilinearForm::<f64, _>::new(Arc::new(elements.to_space()));
        form.add_domain_integrator(FnIntegrator(copy_local_matrix)).unwrap();
        form.assemble(true).unwrap();
        form.finalize(true);
        let original = dense(form.matrix().unwrap());

        form.eliminate_essential_bc_matrix(EssentialSelection::DofMarker(&marker), policy).unwrap();
        let reduced = dense(form.matrix().unwrap());
        let eliminated = dense(form.eliminated_matrix().unwrap());
        prop_assert_eq!(&reduced + &eliminated, original);

        for (k, &is_essential) in marker.iter().enumerate() {
            if is_essential {
                for j in 0..elements.num_dofs {
                    if j != k {
                        prop_assert_eq!(reduced[(k, j)], 0.0);
                        prop_assert_eq!(reduced[(j, k)], 0.0);
                    }
                }
                prop_assert_ne!(reduced[(k, k)], 0.0);
            }
        }
    }

    #[test]
    fn recovered_solution_has_prescribed_values(
        (elements, marker) in elements_with_dof_marker(),
        unit_diagonal in any::<bool>(),
        values in vec(-10i32..=10, 6)
    ) {
        let policy = if unit_diagonal { DiagonalPolicy::One } else { DiagonalPolicy::Keep };
        let n = elements.num_dofs;
        let options = AssemblyOptions::default().with_diagonal_policy(policy);
        let mut form = BilinearForm::<f64, _>::with_options(Arc::new(elements.to_space()), options);
        form.add_domain_integrator(FnIntegrator(copy_local_matrix)).unwrap();
        form.assemble(true).unwrap();

        let x = DVector::from_iterator(n, values.iter().take(n).map(|&v| f64::from(v)));
        let system = form
            .form_linear_system(EssentialSelection::DofMarker(&marker), &x, &DVector::zeros(n))
            .unwrap();
        // The reduced system fixes each essential DOF to its prescribed value
        for (k, &is_essential) in marker.iter().enumerate() {
            if is_essential {
                let diagonal = system.matrix.get_entry(k, k).unwrap().into_value();
                prop_assert_eq!(system.b[k], diagonal * x[k]);
            }
        }

        // Whatever the solver returns, essential DOFs are recovered exactly
        let reduced_x = DVector::from_element(n, 0.25);
        let mut recovered = DVector::zeros(n);
        form.recover_fem_solution(&reduced_x, &DVector::zeros(n), &mut recovered).unwrap();
        for (k, &is_essential) in marker.iter().enumerate() {
            let expected = if is_essential { x[k] } else { 0.25 };
            prop_assert_eq!(recovered[k], expected);
        }
    }
}
