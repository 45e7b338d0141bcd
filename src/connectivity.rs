//! A finite element space described by explicit connectivity tables.
//!
//! [`ConnectivitySpace`] stores, for every element, its signed DOF list together with an
//! arbitrary payload that is handed to integrators (typically vertex coordinates or
//! precomputed geometry). Boundary elements additionally carry an attribute and optionally
//! the element they bound, and interior faces store the pair of elements they separate.
//! This is enough to drive every traversal kind of the assemblers, and makes it easy to
//! wrap an external mesh.
use crate::dof::SignedDof;
use crate::error::FormError;
use crate::space::{FaceAdjacency, FiniteElementSpace};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ElementEntry<E> {
    dofs: Vec<SignedDof>,
    data: E,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BoundaryEntry<E, F> {
    dofs: Vec<SignedDof>,
    data: E,
    attribute: usize,
    face: Option<(F, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FaceEntry<F> {
    data: F,
    first: usize,
    second: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivitySpace<E, F = ()> {
    num_dofs: usize,
    elements: Vec<ElementEntry<E>>,
    boundary_elements: Vec<BoundaryEntry<E, F>>,
    faces: Vec<FaceEntry<F>>,
}

impl<E, F> ConnectivitySpace<E, F> {
    /// Creates an empty space with the given number of DOFs.
    pub fn new(num_dofs: usize) -> Self {
        Self {
            num_dofs,
            elements: Vec::new(),
            boundary_elements: Vec::new(),
            faces: Vec::new(),
        }
    }

    fn check_dofs(&self, dofs: &[SignedDof]) -> Result<(), FormError> {
        match dofs.iter().find(|dof| dof.index() >= self.num_dofs) {
            Some(dof) => Err(FormError::DofOutOfRange {
                dof: dof.index(),
                num_dofs: self.num_dofs,
            }),
            None => Ok(()),
        }
    }

    fn check_element(&self, element_index: usize) -> Result<(), FormError> {
        if element_index < self.elements.len() {
            Ok(())
        } else {
            Err(FormError::IndexOutOfRange {
                what: "element",
                index: element_index,
                len: self.elements.len(),
            })
        }
    }

    /// Adds an element and returns its index.
    pub fn push_element(&mut self, dofs: Vec<SignedDof>, data: E) -> Result<usize, FormError> {
        self.check_dofs(&dofs)?;
        self.elements.push(ElementEntry { dofs, data });
        Ok(self.elements.len() - 1)
    }

    /// Adds a boundary element with the given (1-based) attribute and returns its index.
    pub fn push_boundary_element(&mut self, dofs: Vec<SignedDof>, attribute: usize, data: E) -> Result<usize, FormError> {
        self.check_dofs(&dofs)?;
        self.boundary_elements.push(BoundaryEntry {
            dofs,
            data,
            attribute,
            face: None,
        });
        Ok(self.boundary_elements.len() - 1)
    }

    /// Declares that the given boundary element is a face of `element`.
    pub fn set_boundary_face(&mut self, boundary_index: usize, element_index: usize, face: F) -> Result<(), FormError> {
        self.check_element(element_index)?;
        let len = self.boundary_elements.len();
        let entry = self
            .boundary_elements
            .get_mut(boundary_index)
            .ok_or(FormError::IndexOutOfRange {
                what: "boundary element",
                index: boundary_index,
                len,
            })?;
        entry.face = Some((face, element_index));
        Ok(())
    }

    /// Adds a face between `first` and (if present) `second` and returns its index.
    pub fn push_face(&mut self, face: F, first: usize, second: Option<usize>) -> Result<usize, FormError> {
        self.check_element(first)?;
        if let Some(second) = second {
            self.check_element(second)?;
        }
        self.faces.push(FaceEntry {
            data: face,
            first,
            second,
        });
        Ok(self.faces.len() - 1)
    }

    pub fn element_dofs(&self, element_index: usize) -> &[SignedDof] {
        &self.elements[element_index].dofs
    }

    pub fn boundary_element_dofs(&self, boundary_index: usize) -> &[SignedDof] {
        &self.boundary_elements[boundary_index].dofs
    }

    pub fn element_data(&self, element_index: usize) -> &E {
        &self.elements[element_index].data
    }
}

impl<E, F> FiniteElementSpace for ConnectivitySpace<E, F>
where
    E: Clone + Send + Sync,
    F: Clone + Send + Sync,
{
    type Element = E;
    type Face = F;

    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn num_elements(&self) -> usize {
        self.elements.len()
    }

    fn num_boundary_elements(&self) -> usize {
        self.boundary_elements.len()
    }

    fn num_faces(&self) -> usize {
        self.faces.len()
    }

    fn populate_element_dofs(&self, output: &mut Vec<SignedDof>, element_index: usize) {
        output.extend_from_slice(&self.elements[element_index].dofs);
    }

    fn populate_boundary_element_dofs(&self, output: &mut Vec<SignedDof>, boundary_index: usize) {
        output.extend_from_slice(&self.boundary_elements[boundary_index].dofs);
    }

    fn element(&self, element_index: usize) -> E {
        self.elements[element_index].data.clone()
    }

    fn boundary_element(&self, boundary_index: usize) -> E {
        self.boundary_elements[boundary_index].data.clone()
    }

    fn boundary_attribute(&self, boundary_index: usize) -> usize {
        self.boundary_elements[boundary_index].attribute
    }

    fn interior_face(&self, face_index: usize) -> Option<FaceAdjacency<F>> {
        self.faces.get(face_index).map(|entry| FaceAdjacency {
            face: entry.data.clone(),
            first: entry.first,
            second: entry.second,
        })
    }

    fn boundary_face(&self, boundary_index: usize) -> Option<FaceAdjacency<F>> {
        let entry = self.boundary_elements.get(boundary_index)?;
        entry.face.as_ref().map(|(face, element)| FaceAdjacency {
            face: face.clone(),
            first: *element,
            second: None,
        })
    }
}
