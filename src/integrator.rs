//! Element integrators: the pluggable local computations that make up a form.
//!
//! An integrator receives the opaque element (or face) data of a
//! [`FiniteElementSpace`](crate::space::FiniteElementSpace) and writes a dense local matrix.
//! The output passed to an integrator is always zeroed and sized by the local DOF lists: for
//! element terms `rows = test DOFs`, `cols = trial DOFs`, and for interior faces both
//! dimensions cover the concatenated DOF lists of the two adjacent elements.
//!
//! Integrators are evaluated independently and their outputs summed, so several integrators
//! registered for the same traversal kind compose additively. An integrator must not rely on
//! the order in which elements are visited.
use crate::error::FormError;
use crate::space::{FaceElements, FiniteElementSpace};
use nalgebra::{DMatrix, DMatrixViewMut, DVectorViewMut, Scalar};
use std::fmt;
use std::sync::Arc;

/// The four kinds of entities a form traverses.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntegratorKind {
    Domain,
    Boundary,
    InteriorFace,
    BoundaryFace,
}

impl IntegratorKind {
    pub const ALL: [IntegratorKind; 4] = [
        IntegratorKind::Domain,
        IntegratorKind::Boundary,
        IntegratorKind::InteriorFace,
        IntegratorKind::BoundaryFace,
    ];

    pub fn is_face(&self) -> bool {
        matches!(self, IntegratorKind::InteriorFace | IntegratorKind::BoundaryFace)
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntegratorKind::Domain => "domain",
            IntegratorKind::Boundary => "boundary",
            IntegratorKind::InteriorFace => "interior face",
            IntegratorKind::BoundaryFace => "boundary face",
        };
        write!(f, "{name}")
    }
}

fn unsupported(kind: IntegratorKind) -> eyre::Report {
    FormError::UnsupportedIntegrator { kind }.into()
}

/// An integrator for square (bilinear) forms.
///
/// The default capabilities cover domain and boundary elements. Face integrators override
/// [`supports`](Self::supports) and [`assemble_face_matrix`](Self::assemble_face_matrix).
pub trait BilinearIntegrator<T: Scalar, S: FiniteElementSpace + ?Sized>: Send + Sync {
    /// Whether the integrator can be registered for the given traversal kind.
    fn supports(&self, kind: IntegratorKind) -> bool {
        !kind.is_face()
    }

    /// Computes the local matrix of a domain or boundary element.
    fn assemble_element_matrix(&self, _element: &S::Element, _output: DMatrixViewMut<T>) -> eyre::Result<()> {
        Err(unsupported(IntegratorKind::Domain))
    }

    /// Computes the local matrix of an interior or boundary face.
    fn assemble_face_matrix(&self, face: &FaceElements<'_, S>, _output: DMatrixViewMut<T>) -> eyre::Result<()> {
        let kind = if face.second.is_some() {
            IntegratorKind::InteriorFace
        } else {
            IntegratorKind::BoundaryFace
        };
        Err(unsupported(kind))
    }
}

/// An integrator for rectangular forms coupling a trial space and a test space.
pub trait MixedIntegrator<T, Trial, Test>: Send + Sync
where
    T: Scalar,
    Trial: FiniteElementSpace + ?Sized,
    Test: FiniteElementSpace + ?Sized,
{
    fn supports(&self, kind: IntegratorKind) -> bool {
        !kind.is_face()
    }

    /// Computes the `test DOFs x trial DOFs` local matrix of a domain or boundary element.
    fn assemble_mixed_element_matrix(
        &self,
        trial: &Trial::Element,
        test: &Test::Element,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()>;
}

/// An integrator for linear forms (right-hand sides).
pub trait LinearIntegrator<T: Scalar, S: FiniteElementSpace + ?Sized>: Send + Sync {
    fn supports(&self, kind: IntegratorKind) -> bool {
        !kind.is_face()
    }

    fn assemble_element_vector(&self, element: &S::Element, output: DVectorViewMut<T>) -> eyre::Result<()>;
}

pub type SharedBilinearIntegrator<T, S> = Arc<dyn BilinearIntegrator<T, S>>;
pub type SharedMixedIntegrator<T, Trial, Test> = Arc<dyn MixedIntegrator<T, Trial, Test>>;
pub type SharedLinearIntegrator<T, S> = Arc<dyn LinearIntegrator<T, S>>;

/// A bilinear integrator backed by a closure computing element matrices.
#[derive(Debug, Clone)]
pub struct FnIntegrator<F>(pub F);

impl<T, S, F> BilinearIntegrator<T, S> for FnIntegrator<F>
where
    T: Scalar,
    S: FiniteElementSpace + ?Sized,
    F: Fn(&S::Element, DMatrixViewMut<T>) -> eyre::Result<()> + Send + Sync,
{
    fn assemble_element_matrix(&self, element: &S::Element, output: DMatrixViewMut<T>) -> eyre::Result<()> {
        (self.0)(element, output)
    }
}

/// A bilinear integrator backed by a closure computing face matrices.
///
/// Supports both interior and boundary faces.
#[derive(Debug, Clone)]
pub struct FnFaceIntegrator<F>(pub F);

impl<T, S, F> BilinearIntegrator<T, S> for FnFaceIntegrator<F>
where
    T: Scalar,
    S: FiniteElementSpace + ?Sized,
    F: Fn(&FaceElements<'_, S>, DMatrixViewMut<T>) -> eyre::Result<()> + Send + Sync,
{
    fn supports(&self, kind: IntegratorKind) -> bool {
        kind.is_face()
    }

    fn assemble_face_matrix(&self, face: &FaceElements<'_, S>, output: DMatrixViewMut<T>) -> eyre::Result<()> {
        (self.0)(face, output)
    }
}

/// A mixed integrator backed by a closure.
#[derive(Debug, Clone)]
pub struct MixedFnIntegrator<F>(pub F);

impl<T, Trial, Test, F> MixedIntegrator<T, Trial, Test> for MixedFnIntegrator<F>
where
    T: Scalar,
    Trial: FiniteElementSpace + ?Sized,
    Test: FiniteElementSpace + ?Sized,
    F: Fn(&Trial::Element, &Test::Element, DMatrixViewMut<T>) -> eyre::Result<()> + Send + Sync,
{
    fn assemble_mixed_element_matrix(
        &self,
        trial: &Trial::Element,
        test: &Test::Element,
        output: DMatrixViewMut<T>,
    ) -> eyre::Result<()> {
        (self.0)(trial, test, output)
    }
}

/// A linear integrator backed by a closure.
#[derive(Debug, Clone)]
pub struct FnLinearIntegrator<F>(pub F);

impl<T, S, F> LinearIntegrator<T, S> for FnLinearIntegrator<F>
where
    T: Scalar,
    S: FiniteElementSpace + ?Sized,
    F: Fn(&S::Element, DVectorViewMut<T>) -> eyre::Result<()> + Send + Sync,
{
    fn assemble_element_vector(&self, element: &S::Element, output: DVectorViewMut<T>) -> eyre::Result<()> {
        (self.0)(element, output)
    }
}

/// An integrator that sums the contributions of several integrators.
///
/// Supports exactly the traversal kinds that all of its parts support.
pub struct SumIntegrator<T: Scalar, S: FiniteElementSpace + ?Sized> {
    parts: Vec<SharedBilinearIntegrator<T, S>>,
}

impl<T: Scalar, S: FiniteElementSpace + ?Sized> Default for SumIntegrator<T, S> {
    fn default() -> Self {
        Self { parts: Vec::new() }
    }
}

impl<T: Scalar, S: FiniteElementSpace + ?Sized> fmt::Debug for SumIntegrator<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SumIntegrator")
            .field("num_parts", &self.parts.len())
            .finish()
    }
}

impl<T, S> SumIntegrator<T, S>
where
    T: nalgebra::RealField + Copy,
    S: FiniteElementSpace + ?Sized,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_integrator(mut self, integrator: impl BilinearIntegrator<T, S> + 'static) -> Self {
        self.parts.push(Arc::new(integrator));
        self
    }

    pub fn with_shared_integrator(mut self, integrator: SharedBilinearIntegrator<T, S>) -> Self {
        self.parts.push(integrator);
        self
    }

    pub fn parts(&self) -> &[SharedBilinearIntegrator<T, S>] {
        &self.parts
    }

    fn sum_parts(
        &self,
        mut output: DMatrixViewMut<T>,
        mut assemble_part: impl FnMut(&dyn BilinearIntegrator<T, S>, DMatrixViewMut<T>) -> eyre::Result<()>,
    ) -> eyre::Result<()> {
        let mut part_output = DMatrix::zeros(output.nrows(), output.ncols());
        for part in &self.parts {
            part_output.fill(T::zero());
            assemble_part(part.as_ref(), DMatrixViewMut::from(&mut part_output))?;
            output += &part_output;
        }
        Ok(())
    }
}

impl<T, S> BilinearIntegrator<T, S> for SumIntegrator<T, S>
where
    T: nalgebra::RealField + Copy,
    S: FiniteElementSpace + ?Sized,
{
    fn supports(&self, kind: IntegratorKind) -> bool {
        self.parts.iter().all(|part| part.supports(kind))
    }

    fn assemble_element_matrix(&self, element: &S::Element, output: DMatrixViewMut<T>) -> eyre::Result<()> {
        self.sum_parts(output, |part, part_output| part.assemble_element_matrix(element, part_output))
    }

    fn assemble_face_matrix(&self, face: &FaceElements<'_, S>, output: DMatrixViewMut<T>) -> eyre::Result<()> {
        self.sum_parts(output, |part, part_output| part.assemble_face_matrix(face, part_output))
    }
}
