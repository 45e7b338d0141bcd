//! Linear forms (right-hand sides) over a finite element space.
use crate::assembly::global::scatter_local_vector_to_global;
use crate::error::FormError;
use crate::integrator::{IntegratorKind, LinearIntegrator, SharedLinearIntegrator};
use crate::space::FiniteElementSpace;
use crate::Real;
use eyre::WrapErr;
use log::debug;
use nalgebra::{DVector, DVectorViewMut};
use std::fmt;
use std::sync::Arc;

/// A linear form `f(v)`, assembled into a global vector.
pub struct LinearForm<T: Real, S: FiniteElementSpace + ?Sized> {
    space: Arc<S>,
    domain_integrators: Vec<SharedLinearIntegrator<T, S>>,
    boundary_integrators: Vec<SharedLinearIntegrator<T, S>>,
    vector: Option<DVector<T>>,
}

impl<T: Real, S: FiniteElementSpace + ?Sized> fmt::Debug for LinearForm<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinearForm")
            .field("num_dofs", &self.space.num_dofs())
            .field("num_domain_integrators", &self.domain_integrators.len())
            .field("num_boundary_integrators", &self.boundary_integrators.len())
            .field("vector", &self.vector)
            .finish()
    }
}

impl<T: Real, S: FiniteElementSpace + ?Sized> LinearForm<T, S> {
    pub fn new(space: Arc<S>) -> Self {
        Self {
            space,
            domain_integrators: Vec::new(),
            boundary_integrators: Vec::new(),
            vector: None,
        }
    }

    pub fn space(&self) -> &Arc<S> {
        &self.space
    }

    pub fn add_shared_integrator(
        &mut self,
        kind: IntegratorKind,
        integrator: SharedLinearIntegrator<T, S>,
    ) -> Result<(), FormError> {
        if kind.is_face() || !integrator.supports(kind) {
            return Err(FormError::UnsupportedIntegrator { kind });
        }
        match kind {
            IntegratorKind::Domain => self.domain_integrators.push(integrator),
            _ => self.boundary_integrators.push(integrator),
        }
        Ok(())
    }

    pub fn add_domain_integrator(&mut self, integrator: impl LinearIntegrator<T, S> + 'static) -> Result<(), FormError> {
        self.add_shared_integrator(IntegratorKind::Domain, Arc::new(integrator))
    }

    pub fn add_boundary_integrator(
        &mut self,
        integrator: impl LinearIntegrator<T, S> + 'static,
    ) -> Result<(), FormError> {
        self.add_shared_integrator(IntegratorKind::Boundary, Arc::new(integrator))
    }

    /// Assembles the global vector from scratch.
    pub fn assemble(&mut self) -> eyre::Result<()> {
        let space = self.space.as_ref();
        let mut vector = DVector::zeros(space.num_dofs());
        let mut dofs = Vec::new();
        let mut local = DVector::zeros(0);
        let mut integrator_output = DVector::zeros(0);

        let mut assemble_local = |dofs: &[_], element: &S::Element, integrators: &[SharedLinearIntegrator<T, S>]| {
            local.resize_vertically_mut(dofs.len(), T::zero());
            local.fill(T::zero());
            integrator_output.resize_vertically_mut(dofs.len(), T::zero());
            for integrator in integrators {
                integrator_output.fill(T::zero());
                integrator.assemble_element_vector(element, DVectorViewMut::from(&mut integrator_output))?;
                local += &integrator_output;
            }
            scatter_local_vector_to_global(&mut vector, dofs, &local);
            Ok::<_, eyre::Report>(())
        };

        if !self.domain_integrators.is_empty() {
            for i in 0..space.num_elements() {
                dofs.clear();
                space.populate_element_dofs(&mut dofs, i);
                assemble_local(&dofs, &space.element(i), &self.domain_integrators)
                    .wrap_err_with(|| format!("failed to assemble element vector of element {i}"))?;
            }
            debug!("Assembled {} domain elements into vector", space.num_elements());
        }

        if !self.boundary_integrators.is_empty() {
            for i in 0..space.num_boundary_elements() {
                dofs.clear();
                space.populate_boundary_element_dofs(&mut dofs, i);
                assemble_local(&dofs, &space.boundary_element(i), &self.boundary_integrators)
                    .wrap_err_with(|| format!("failed to assemble element vector of boundary element {i}"))?;
            }
            debug!("Assembled {} boundary elements into vector", space.num_boundary_elements());
        }

        self.vector = Some(vector);
        Ok(())
    }

    /// The assembled vector, if available.
    pub fn vector(&self) -> Option<&DVector<T>> {
        self.vector.as_ref()
    }

    pub fn into_vector(self) -> Option<DVector<T>> {
        self.vector
    }

    /// Discards the assembled vector, optionally rebinding to a new space.
    pub fn update(&mut self, space: Option<Arc<S>>) {
        if let Some(space) = space {
            self.space = space;
        }
        self.vector = None;
    }
}
