use crate::core::models::coords::CoordinateSet;
use crate::core::models::profile::ScatteringProfile;
use crate::core::modes::mode::ModeSet;
use crate::core::scattering::scorer::ScatteringScorer;
use crate::engine::anm::Anm;
use crate::engine::cancel::CancellationToken;
use crate::engine::config::FitConfig;
use crate::engine::context::SearchContext;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::SearchResult;
use crate::engine::tasks;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct FitResult {
    pub num_contacts: usize,
    pub modes: ModeSet,
    pub search: SearchResult,
    /// RMSD of the best conformation from the input coordinates.
    pub rmsd_from_initial: f64,
}

/// Builds the elastic network of `coords`, computes its lowest modes and
/// searches along them for the conformation best matching `experiment`.
///
/// A scoring failure or cancellation part-way through the search is returned as
/// an error that still carries the best conformation found so far
/// (see [`EngineError::best_so_far`]).
#[instrument(skip_all, name = "fit_workflow")]
pub fn run(
    coords: &CoordinateSet,
    experiment: &ScatteringProfile,
    scorer: &dyn ScatteringScorer,
    config: &FitConfig,
    reporter: &ProgressReporter,
    cancel: Option<&CancellationToken>,
) -> Result<FitResult, EngineError> {
    // === Phase 1: Elastic network ===
    reporter.report(Progress::PhaseStart {
        name: "Building Hessian",
    });
    info!(
        atoms = coords.len(),
        cutoff = config.network.cutoff,
        "Building elastic network."
    );
    let mut anm = Anm::new();
    anm.build_hessian(coords, &config.network)?;
    let num_contacts = anm.num_contacts().unwrap_or(0);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Normal modes ===
    reporter.report(Progress::PhaseStart {
        name: "Calculating Modes",
    });
    anm.calc_modes(&config.modes)?;
    let modes = anm
        .take_modes()
        .ok_or_else(|| EngineError::Internal("Modes missing after calculation".into()))?;
    if modes.shortfall() > 0 {
        let message = format!(
            "Only {} non-zero modes could be calculated ({} requested).",
            modes.num_nonzero(),
            modes.num_nonzero() + modes.shortfall()
        );
        reporter.report(Progress::Message(message));
    }
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Conformational search ===
    let mut context = SearchContext::new(
        coords,
        &modes,
        experiment,
        scorer,
        &config.search,
        reporter,
    );
    if let Some(token) = cancel {
        context = context.with_cancellation(token);
    }
    let search = tasks::search::run(&context)?;
    let rmsd_from_initial = search.best_coordinates.rmsd(coords)?;

    info!(
        best_chi = search.best_chi,
        baseline_chi = search.baseline_chi,
        rmsd = rmsd_from_initial,
        "Fit workflow complete."
    );
    Ok(FitResult {
        num_contacts,
        modes,
        search,
        rmsd_from_initial,
    })
}
