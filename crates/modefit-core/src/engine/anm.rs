use super::config::{ModeConfig, NetworkConfig};
use super::error::EngineError;
use crate::core::models::coords::CoordinateSet;
use crate::core::modes::mode::ModeSet;
use crate::core::modes::solver;
use crate::core::network::hessian::{self, ElasticNetwork};
use crate::core::network::storage::NetworkMatrix;
use nalgebra::DMatrix;
use tracing::info;

/// Stateful anisotropic network model of one structure.
///
/// Holds the most recently built (or injected) Hessian and the modes computed
/// from it. Rebuilding or replacing the Hessian discards stale modes.
#[derive(Debug, Default)]
pub struct Anm {
    hessian: Option<NetworkMatrix>,
    kirchhoff: Option<NetworkMatrix>,
    cutoff: Option<f64>,
    num_contacts: Option<usize>,
    modes: Option<ModeSet>,
}

impl Anm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the Hessian and Kirchhoff matrices for `coords`.
    pub fn build_hessian(
        &mut self,
        coords: &CoordinateSet,
        config: &NetworkConfig,
    ) -> Result<&NetworkMatrix, EngineError> {
        let network: ElasticNetwork =
            hessian::build(coords, config.cutoff, &config.gamma, config.build_options())?;
        self.cutoff = Some(network.cutoff());
        self.num_contacts = Some(network.num_contacts());
        self.modes = None;
        let (hessian, kirchhoff) = network.into_parts();
        self.kirchhoff = Some(kirchhoff);
        Ok(&*self.hessian.insert(hessian))
    }

    /// Replaces the Hessian with an externally computed matrix.
    ///
    /// The matrix must be square, symmetric, and have a dimension that is a
    /// positive multiple of 3. Any Kirchhoff matrix from an earlier build is
    /// dropped since it no longer describes the same network.
    pub fn set_hessian(&mut self, matrix: DMatrix<f64>) -> Result<(), EngineError> {
        solver::validate_hessian(&matrix)
            .map_err(|source| EngineError::MalformedHessian { source })?;
        info!(dof = matrix.nrows(), "Hessian was set.");
        self.hessian = Some(NetworkMatrix::from_dense(matrix));
        self.kirchhoff = None;
        self.cutoff = None;
        self.num_contacts = None;
        self.modes = None;
        Ok(())
    }

    /// Diagonalizes the current Hessian.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Precondition`] if no Hessian has been built or set.
    pub fn calc_modes(&mut self, config: &ModeConfig) -> Result<&ModeSet, EngineError> {
        let hessian = self.hessian.as_ref().ok_or(EngineError::Precondition(
            "Hessian matrix is not built or set",
        ))?;
        let modes = solver::solve(&hessian.to_dense(), &config.solver_options())?;
        Ok(&*self.modes.insert(modes))
    }

    pub fn hessian(&self) -> Option<&NetworkMatrix> {
        self.hessian.as_ref()
    }

    pub fn kirchhoff(&self) -> Option<&NetworkMatrix> {
        self.kirchhoff.as_ref()
    }

    pub fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    pub fn num_contacts(&self) -> Option<usize> {
        self.num_contacts
    }

    pub fn num_atoms(&self) -> Option<usize> {
        self.hessian.as_ref().map(|h| h.nrows() / 3)
    }

    pub fn modes(&self) -> Option<&ModeSet> {
        self.modes.as_ref()
    }

    pub fn take_modes(&mut self) -> Option<ModeSet> {
        self.modes.take()
    }
}
