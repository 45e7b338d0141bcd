use crate::dof::SignedDof;
use crate::error::FormError;

/// Elements adjacent to a face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceAdjacency<F> {
    /// Geometric data of the face itself, passed on to face integrators.
    pub face: F,
    pub first: usize,
    /// The neighbor on the other side, absent on the boundary or at non-conforming faces.
    pub second: Option<usize>,
}

/// The element data seen by a face integrator.
///
/// For boundary faces, `second` is always `None`.
pub struct FaceElements<'a, S: FiniteElementSpace + ?Sized> {
    pub face: &'a S::Face,
    pub first: &'a S::Element,
    pub second: Option<&'a S::Element>,
}

impl<'a, S: FiniteElementSpace + ?Sized> Clone for FaceElements<'a, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S: FiniteElementSpace + ?Sized> Copy for FaceElements<'a, S> {}

/// A finite element space, as seen by the form assemblers.
///
/// The space owns the mesh and the DOF numbering. Element and face data are opaque to the
/// assemblers and only passed on to integrators.
pub trait FiniteElementSpace: Sync {
    /// Basis and geometry data for a single (boundary) element.
    type Element: Send + Sync;
    /// Geometry data for a single face.
    type Face: Send + Sync;

    /// The total number of (vector) DOFs.
    fn num_dofs(&self) -> usize;

    fn num_elements(&self) -> usize;

    fn num_boundary_elements(&self) -> usize;

    /// The number of faces that may couple two elements.
    fn num_faces(&self) -> usize {
        0
    }

    /// Appends the signed DOFs of the given element to `output`.
    fn populate_element_dofs(&self, output: &mut Vec<SignedDof>, element_index: usize);

    /// Appends the signed DOFs of the given boundary element to `output`.
    fn populate_boundary_element_dofs(&self, output: &mut Vec<SignedDof>, boundary_index: usize);

    fn element(&self, element_index: usize) -> Self::Element;

    fn boundary_element(&self, boundary_index: usize) -> Self::Element;

    /// The (1-based) attribute of the given boundary element.
    fn boundary_attribute(&self, boundary_index: usize) -> usize;

    /// Resolves an interior face to its adjacent elements.
    ///
    /// Returns `None` if the face cannot be resolved.
    fn interior_face(&self, _face_index: usize) -> Option<FaceAdjacency<Self::Face>> {
        None
    }

    /// Resolves the face of a boundary element to the single adjacent element.
    fn boundary_face(&self, _boundary_index: usize) -> Option<FaceAdjacency<Self::Face>> {
        None
    }

    /// Collects the signed DOFs of all boundary elements whose attribute is marked.
    ///
    /// Attribute `a` is marked if `marker[a - 1]` is `true`. DOFs shared by several boundary
    /// elements appear several times. Attributes that no boundary element carries are simply
    /// never visited, but a boundary element whose attribute is not covered by the marker is
    /// reported as [`FormError::AttributeOutOfRange`].
    fn essential_dofs(&self, marker: &[bool]) -> Result<Vec<SignedDof>, FormError> {
        let mut dofs = Vec::new();
        for boundary_index in 0..self.num_boundary_elements() {
            let attribute = self.boundary_attribute(boundary_index);
            if attribute == 0 || attribute > marker.len() {
                return Err(FormError::AttributeOutOfRange {
                    boundary_element: boundary_index,
                    attribute,
                    marker_len: marker.len(),
                });
            }
            if marker[attribute - 1] {
                self.populate_boundary_element_dofs(&mut dofs, boundary_index);
            }
        }
        Ok(dofs)
    }
}
