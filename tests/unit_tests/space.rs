use crate::chain_space;
use util::assert_form_error;
use weakform::connectivity::ConnectivitySpace;
use weakform::dof::SignedDof;
use weakform::error::FormError;
use weakform::space::{FaceAdjacency, FiniteElementSpace};

/// A space defined only through the required trait methods.
struct UniformChain {
    num_elements: usize,
}

impl FiniteElementSpace for UniformChain {
    type Element = ();
    type Face = ();

    fn num_dofs(&self) -> usize {
        self.num_elements + 1
    }

    fn num_elements(&self) -> usize {
        self.num_elements
    }

    fn num_boundary_elements(&self) -> usize {
        2
    }

    fn populate_element_dofs(&self, output: &mut Vec<SignedDof>, element_index: usize) {
        output.extend([SignedDof::positive(element_index), SignedDof::positive(element_index + 1)]);
    }

    fn populate_boundary_element_dofs(&self, output: &mut Vec<SignedDof>, boundary_index: usize) {
        output.push(SignedDof::positive(boundary_index * self.num_elements));
    }

    fn element(&self, _element_index: usize) -> Self::Element {}

    fn boundary_element(&self, _boundary_index: usize) -> Self::Element {}

    fn boundary_attribute(&self, _boundary_index: usize) -> usize {
        1
    }
}

#[test]
fn default_space_methods() {
    let space = UniformChain { num_elements: 3 };
    assert_eq!(space.num_faces(), 0);
    assert_eq!(space.interior_face(0), None);
    assert_eq!(space.boundary_face(0), None);
    assert_eq!(
        space.essential_dofs(&[true]).unwrap(),
        vec![SignedDof::positive(0), SignedDof::positive(3)]
    );
    assert!(space.essential_dofs(&[false]).unwrap().is_empty());
}

#[test]
fn essential_dofs_follow_boundary_order_and_keep_duplicates() {
    let mut space = ConnectivitySpace::<()>::new(4);
    space
        .push_boundary_element(vec![SignedDof::positive(2), SignedDof::negative(3)], 2, ())
        .unwrap();
    space
        .push_boundary_element(vec![SignedDof::positive(0)], 1, ())
        .unwrap();
    space
        .push_boundary_element(vec![SignedDof::negative(3), SignedDof::positive(1)], 2, ())
        .unwrap();

    assert_eq!(
        space.essential_dofs(&[false, true]).unwrap(),
        vec![
            SignedDof::positive(2),
            SignedDof::negative(3),
            SignedDof::negative(3),
            SignedDof::positive(1)
        ]
    );
    assert_eq!(space.essential_dofs(&[true, false, false]).unwrap(), vec![SignedDof::positive(0)]);
}

#[test]
fn essential_dofs_reject_uncovered_attributes() {
    let mut space = ConnectivitySpace::<()>::new(2);
    space
        .push_boundary_element(vec![SignedDof::positive(0)], 0, ())
        .unwrap();
    assert_form_error!(
        space.essential_dofs(&[true]),
        FormError::AttributeOutOfRange {
            boundary_element: 0,
            attribute: 0,
            marker_len: 1
        }
    );

    let space = chain_space(2, 1.0);
    assert_form_error!(
        space.essential_dofs(&[]),
        FormError::AttributeOutOfRange { attribute: 1, .. }
    );
}

#[test]
fn connectivity_space_validates_input() {
    let mut space = ConnectivitySpace::<f64, usize>::new(3);
    assert_form_error!(
        space.push_element(vec![SignedDof::positive(0), SignedDof::negative(3)], 1.0),
        FormError::DofOutOfRange { dof: 3, num_dofs: 3 }
    );
    assert_form_error!(
        space.push_boundary_element(vec![SignedDof::positive(5)], 1, 1.0),
        FormError::DofOutOfRange { dof: 5, num_dofs: 3 }
    );
    assert_eq!(space.num_elements(), 0);
    assert_eq!(space.num_boundary_elements(), 0);

    let first = space
        .push_element(vec![SignedDof::positive(0), SignedDof::positive(1)], 1.0)
        .unwrap();
    assert_form_error!(
        space.push_face(7, first, Some(1)),
        FormError::IndexOutOfRange {
            what: "element",
            index: 1,
            len: 1
        }
    );
    assert_form_error!(
        space.set_boundary_face(0, first, 7),
        FormError::IndexOutOfRange {
            what: "boundary element",
            index: 0,
            len: 0
        }
    );
}

#[test]
fn connectivity_space_resolves_faces() {
    let mut space = ConnectivitySpace::<f64, usize>::new(3);
    space
        .push_element(vec![SignedDof::positive(0), SignedDof::positive(1)], 1.0)
        .unwrap();
    space
        .push_element(vec![SignedDof::positive(1), SignedDof::negative(2)], 2.0)
        .unwrap();
    space
        .push_boundary_element(vec![SignedDof::negative(2)], 1, 0.5)
        .unwrap();
    space.push_face(10, 0, Some(1)).unwrap();
    space.push_face(11, 1, None).unwrap();
    space.set_boundary_face(0, 1, 12).unwrap();

    assert_eq!(space.num_faces(), 2);
    assert_eq!(
        space.interior_face(0),
        Some(FaceAdjacency {
            face: 10,
            first: 0,
            second: Some(1)
        })
    );
    assert_eq!(space.interior_face(1).unwrap().second, None);
    assert_eq!(space.interior_face(2), None);
    assert_eq!(
        space.boundary_face(0),
        Some(FaceAdjacency {
            face: 12,
            first: 1,
            second: None
        })
    );
    assert_eq!(space.boundary_face(1), None);

    assert_eq!(space.element_dofs(1), &[SignedDof::positive(1), SignedDof::negative(2)]);
    assert_eq!(space.boundary_element_dofs(0), &[SignedDof::negative(2)]);
    assert_eq!(space.element_data(1), &2.0);
    assert_eq!(space.element(0), 1.0);
    assert_eq!(space.boundary_element(0), 0.5);
    assert_eq!(space.boundary_attribute(0), 1);

    let mut dofs = vec![SignedDof::positive(0)];
    space.populate_element_dofs(&mut dofs, 1);
    assert_eq!(dofs.len(), 3);
}

#[test]
fn connectivity_space_serializes_to_json() {
    let mut space = chain_space(3, 1.5);
    space.push_element(vec![SignedDof::negative(1)], 0.25).unwrap();
    let json = serde_json::to_string(&space).unwrap();
    let deserialized: ConnectivitySpace<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, space);
}
