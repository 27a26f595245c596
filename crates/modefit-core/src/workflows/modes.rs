use crate::core::models::coords::CoordinateSet;
use crate::core::modes::mode::ModeSet;
use crate::engine::anm::Anm;
use crate::engine::config::{ModeConfig, NetworkConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct ModeAnalysis {
    pub num_atoms: usize,
    pub num_contacts: usize,
    pub modes: ModeSet,
}

impl ModeAnalysis {
    pub fn square_fluctuations(&self) -> Vec<f64> {
        self.modes.square_fluctuations()
    }
}

/// Computes the normal modes of `coords` without any scattering search.
#[instrument(skip_all, name = "modes_workflow")]
pub fn run(
    coords: &CoordinateSet,
    network: &NetworkConfig,
    modes: &ModeConfig,
    reporter: &ProgressReporter,
) -> Result<ModeAnalysis, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Building Hessian",
    });
    let mut anm = Anm::new();
    anm.build_hessian(coords, network)?;
    let num_contacts = anm.num_contacts().unwrap_or(0);
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Calculating Modes",
    });
    anm.calc_modes(modes)?;
    let modes = anm
        .take_modes()
        .ok_or_else(|| EngineError::Internal("Modes missing after calculation".into()))?;
    reporter.report(Progress::PhaseFinish);

    info!(
        modes = modes.len(),
        zeros = modes.zeros_detected(),
        trace = modes.trace(),
        "Mode analysis complete."
    );
    Ok(ModeAnalysis {
        num_atoms: coords.len(),
        num_contacts,
        modes,
    })
}
