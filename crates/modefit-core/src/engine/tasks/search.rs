use super::interpolation;
use crate::core::models::coords::{CoordinateError, CoordinateSet};
use crate::core::modes::mode::Mode;
use crate::core::scattering::scorer::ScoringError;
use crate::engine::context::SearchContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::state::{BestFit, Candidate, FrameScore, SearchResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug)]
struct ScoredFrame {
    coefficient: f64,
    chi: f64,
    coordinates: CoordinateSet,
    intensity: Vec<f64>,
}

#[derive(Debug)]
enum FrameFailure {
    Cancelled,
    /// Not scored because an earlier frame of the same mode already failed.
    Skipped,
    Coordinates(CoordinateError),
    Scoring(ScoringError),
}

type FrameOutcome = Result<ScoredFrame, FrameFailure>;

/// Position of the earliest failed frame within the current mode.
///
/// Frames after it are skipped without being scored; frames before it are
/// always scored, so the in-order reduction sees the same prefix whatever
/// the scheduling.
struct FirstFailure(AtomicUsize);

impl FirstFailure {
    fn new() -> Self {
        Self(AtomicUsize::new(usize::MAX))
    }

    fn mark(&self, position: usize) {
        self.0.fetch_min(position, Ordering::AcqRel);
    }

    fn skips(&self, position: usize) -> bool {
        position > self.0.load(Ordering::Acquire)
    }
}

/// Interpolates along the lowest internal modes and keeps the best-scoring conformation.
///
/// The grid is exhaustive: every frame of every selected mode is scored, in
/// mode-ascending then frame-ascending order, and a conformation replaces the
/// current best only with a strictly lower chi. Frames of one mode are
/// independent and may be scored concurrently; they are always reduced in
/// order, so the result does not depend on scheduling. The first failing frame
/// ends the run: later frames are no longer sent to the scorer.
#[instrument(skip_all, name = "conformational_search_task")]
pub fn run(context: &SearchContext) -> Result<SearchResult, EngineError> {
    let reporter = context.reporter;
    let config = context.config;
    let experiment = context.experiment;

    if context.modes.dof() != context.baseline.dof() {
        return Err(EngineError::Precondition(
            "Mode set and coordinates have different numbers of degrees of freedom",
        ));
    }

    reporter.report(Progress::PhaseStart {
        name: "Scoring Initial Structure",
    });
    let (baseline_chi, baseline_intensity) = context.scorer.score(context.baseline, experiment)?;
    info!(chi = baseline_chi, "Initial chi calculated.");
    reporter.report(Progress::NewBest {
        chi: baseline_chi,
        mode_index: None,
        frame: None,
    });
    reporter.report(Progress::PhaseFinish);

    let mut best = BestFit::new(baseline_chi, context.baseline.clone(), baseline_intensity);

    if config.scaling_coefficient <= 1.0 {
        let message = format!(
            "Scaling coefficient {} is at most 1; values greater than 1 are recommended.",
            config.scaling_coefficient
        );
        warn!("{}", message);
        reporter.report(Progress::Message(message));
    }

    let modes: Vec<&Mode> = context.modes.nonzero_modes().collect();
    let num_modes = if config.num_modes > modes.len() {
        let message = format!(
            "Requested {} modes but only {} non-zero modes are available; searching the available modes.",
            config.num_modes,
            modes.len()
        );
        warn!("{}", message);
        reporter.report(Progress::Message(message));
        modes.len()
    } else {
        config.num_modes
    };

    let steps: Vec<i64> = interpolation::frame_steps(config.num_frames).collect();
    if num_modes == 0 || steps.is_empty() {
        info!("Search grid is empty. Returning the initial structure.");
        return Ok(best.into_result(experiment));
    }

    reporter.report(Progress::PhaseStart {
        name: "Conformational Search",
    });
    for (mode_index, mode) in modes.iter().take(num_modes).enumerate() {
        reporter.report(Progress::ModeStart {
            index: mode_index,
            total: num_modes,
            eigenvalue: mode.eigenvalue(),
        });
        info!(
            mode = mode_index,
            eigenvalue = mode.eigenvalue(),
            "Interpolating along mode."
        );
        reporter.report(Progress::TaskStart {
            total_steps: steps.len() as u64,
        });

        let first_failure = FirstFailure::new();

        #[cfg(not(feature = "parallel"))]
        let iterator = steps.iter().enumerate();

        #[cfg(feature = "parallel")]
        let iterator = steps.par_iter().enumerate();

        let outcomes: Vec<FrameOutcome> = iterator
            .map(|(position, &frame)| {
                if first_failure.skips(position) {
                    return Err(FrameFailure::Skipped);
                }
                let outcome = evaluate_frame(context, mode, frame);
                if matches!(
                    outcome,
                    Err(FrameFailure::Coordinates(_) | FrameFailure::Scoring(_))
                ) {
                    first_failure.mark(position);
                }
                outcome
            })
            .collect();

        reporter.report(Progress::TaskFinish);

        for (&frame, outcome) in steps.iter().zip(outcomes) {
            let scored = match outcome {
                Ok(scored) => scored,
                Err(FrameFailure::Cancelled) => {
                    warn!(mode = mode_index, frame, "Search cancelled.");
                    reporter.report(Progress::PhaseFinish);
                    return Err(EngineError::Cancelled {
                        best_so_far: Box::new(best.into_result(experiment)),
                    });
                }
                Err(FrameFailure::Skipped) => {
                    reporter.report(Progress::PhaseFinish);
                    return Err(EngineError::Internal(format!(
                        "frame {} of mode {} was skipped without an earlier failure",
                        frame, mode_index
                    )));
                }
                Err(FrameFailure::Coordinates(e)) => {
                    reporter.report(Progress::PhaseFinish);
                    return Err(EngineError::Coordinates(e));
                }
                Err(FrameFailure::Scoring(source)) => {
                    warn!(mode = mode_index, frame, error = %source, "Scoring failed; aborting search.");
                    reporter.report(Progress::PhaseFinish);
                    return Err(EngineError::SearchAborted {
                        mode_index,
                        frame,
                        source,
                        best_so_far: Box::new(best.into_result(experiment)),
                    });
                }
            };

            debug!(mode = mode_index, frame, chi = scored.chi, "Frame scored.");
            best.record(FrameScore {
                mode_index,
                frame,
                coefficient: scored.coefficient,
                chi: scored.chi,
            });
            let chi = scored.chi;
            let improved = best.offer(Candidate {
                chi,
                mode_index,
                frame,
                coordinates: scored.coordinates,
                intensity: scored.intensity,
            });
            if improved {
                reporter.report(Progress::NewBest {
                    chi,
                    mode_index: Some(mode_index),
                    frame: Some(frame),
                });
            }
        }
    }
    reporter.report(Progress::PhaseFinish);

    let result = best.into_result(experiment);
    info!(
        best_chi = result.best_chi,
        baseline_chi = result.baseline_chi,
        mode = ?result.best_mode,
        frame = ?result.best_frame,
        "Conformational search finished."
    );
    Ok(result)
}

fn evaluate_frame(context: &SearchContext, mode: &Mode, frame: i64) -> FrameOutcome {
    if context.is_cancelled() {
        return Err(FrameFailure::Cancelled);
    }
    let config = context.config;
    let coefficient = interpolation::coefficient(
        frame,
        config.scaling_coefficient,
        mode.eigenvalue(),
        config.num_frames,
    );
    let coordinates = context
        .baseline
        .displaced(mode.eigenvector(), coefficient)
        .map_err(FrameFailure::Coordinates)?;
    let (chi, intensity) = context
        .scorer
        .score(&coordinates, context.experiment)
        .map_err(FrameFailure::Scoring)?;
    context.reporter.report(Progress::TaskIncrement);
    Ok(ScoredFrame {
        coefficient,
        chi,
        coordinates,
        intensity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::profile::ScatteringProfile;
    use crate::core::modes::mode::ModeSet;
    use crate::core::modes::solver::{self, ModeCount, SolverOptions};
    use crate::core::network::gamma::GammaModel;
    use crate::core::network::hessian::{self, BuildOptions};
    use crate::core::scattering::debye::DebyeScorer;
    use crate::core::scattering::scorer::ScatteringScorer;
    use crate::engine::cancel::CancellationToken;
    use crate::engine::config::SearchConfig;
    use crate::engine::progress::ProgressReporter;
    use nalgebra::DVector;
    use std::sync::Mutex;

    struct Fixture {
        baseline: CoordinateSet,
        modes: ModeSet,
    }

    fn fixture() -> Fixture {
        let rows: Vec<[f64; 3]> = (0..12)
            .map(|k| {
                let t = k as f64 * 100f64.to_radians();
                [2.3 * t.cos(), 2.3 * t.sin(), 1.5 * k as f64]
            })
            .collect();
        let baseline = CoordinateSet::try_from(rows).unwrap();
        let network = hessian::build(
            &baseline,
            15.0,
            &GammaModel::Constant(1.0),
            BuildOptions::default(),
        )
        .unwrap();
        let modes = solver::solve(
            &network.hessian().to_dense(),
            &SolverOptions {
                num_modes: ModeCount::Count(3),
                ..SolverOptions::default()
            },
        )
        .unwrap();
        Fixture { baseline, modes }
    }

    fn q_grid() -> Vec<f64> {
        (1..=30).map(|k| k as f64 * 0.01).collect()
    }

    fn search_config(num_modes: usize, num_frames: usize) -> SearchConfig {
        SearchConfig {
            num_modes,
            num_frames,
            scaling_coefficient: 3.0,
        }
    }

    /// Experimental curve of the baseline displaced to `frame` along `mode_index`.
    fn target_profile(fixture: &Fixture, mode_index: usize, frame: i64) -> ScatteringProfile {
        let mode = fixture.modes.get(mode_index).unwrap();
        let coefficient = interpolation::coefficient(frame, 3.0, mode.eigenvalue(), 20);
        let target = fixture
            .baseline
            .displaced(mode.eigenvector(), coefficient)
            .unwrap();
        let q = q_grid();
        let intensity = DebyeScorer::default().predict_profile(&target, &q).unwrap();
        ScatteringProfile::new(q, intensity, None).unwrap()
    }

    fn run_search(
        fixture: &Fixture,
        experiment: &ScatteringProfile,
        scorer: &dyn ScatteringScorer,
        config: &SearchConfig,
    ) -> Result<SearchResult, EngineError> {
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(
            &fixture.baseline,
            &fixture.modes,
            experiment,
            scorer,
            config,
            &reporter,
        );
        run(&context)
    }

    #[test]
    fn search_recovers_displaced_conformation() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 4);
        let result = run_search(
            &fixture,
            &experiment,
            &DebyeScorer::default(),
            &search_config(3, 20),
        )
        .unwrap();

        assert_eq!(result.best_mode, Some(0));
        assert_eq!(result.best_frame, Some(4));
        assert_eq!(result.best_chi, 0.0);
        assert!(result.baseline_chi > 0.0);
        assert_eq!(result.trace.len(), 3 * 21);
        assert_eq!(result.best_profile.q(), experiment.q());
        assert_eq!(result.best_profile.intensity(), experiment.intensity());
    }

    #[test]
    fn trace_is_ordered_by_mode_then_frame() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 1, -3);
        let result = run_search(
            &fixture,
            &experiment,
            &DebyeScorer::default(),
            &search_config(2, 4),
        )
        .unwrap();
        let order: Vec<(usize, i64)> = result
            .trace
            .iter()
            .map(|s| (s.mode_index, s.frame))
            .collect();
        let expected: Vec<(usize, i64)> = (0..2)
            .flat_map(|m| (-2..=2).map(move |f| (m, f)))
            .collect();
        assert_eq!(order, expected);
        let zero_frame = result.trace.iter().find(|s| s.frame == 0).unwrap();
        assert_eq!(zero_frame.coefficient, 0.0);
        assert_eq!(zero_frame.chi, result.baseline_chi);
    }

    #[test]
    fn zero_frame_never_replaces_baseline() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 0);
        let result = run_search(
            &fixture,
            &experiment,
            &DebyeScorer::default(),
            &search_config(3, 20),
        )
        .unwrap();
        assert_eq!(result.baseline_chi, 0.0);
        assert!(!result.improved());
        assert_eq!(result.best_coordinates, fixture.baseline);
    }

    #[test]
    fn empty_budget_returns_baseline() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 6);
        for config in [search_config(0, 20), search_config(3, 0)] {
            let result =
                run_search(&fixture, &experiment, &DebyeScorer::default(), &config).unwrap();
            assert!(!result.improved());
            assert!(result.trace.is_empty());
            assert_eq!(result.best_chi, result.baseline_chi);
            assert_eq!(result.best_coordinates, fixture.baseline);
        }
    }

    #[test]
    fn mode_count_is_clamped_to_available_modes() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 2, 2);
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }));
        let scorer = DebyeScorer::default();
        let config = search_config(10, 2);
        let context = SearchContext::new(
            &fixture.baseline,
            &fixture.modes,
            &experiment,
            &scorer,
            &config,
            &reporter,
        );
        let result = run(&context).unwrap();
        drop(reporter);
        assert_eq!(result.trace.len(), 3 * 3);
        assert_eq!(messages.into_inner().unwrap().len(), 1);
    }

    #[test]
    fn small_scaling_coefficient_is_accepted_with_warning() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 2);
        let messages = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }));
        let scorer = DebyeScorer::default();
        let config = SearchConfig {
            scaling_coefficient: 0.5,
            ..search_config(1, 4)
        };
        let context = SearchContext::new(
            &fixture.baseline,
            &fixture.modes,
            &experiment,
            &scorer,
            &config,
            &reporter,
        );
        let result = run(&context).unwrap();
        drop(reporter);
        assert_eq!(result.trace.len(), 5);
        let messages = messages.into_inner().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("recommended"));
    }

    #[test]
    fn larger_budget_never_worsens_best_chi() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 2, 5);
        let scorer = DebyeScorer::default();
        let mut previous = f64::INFINITY;
        for num_modes in 0..=3 {
            let result =
                run_search(&fixture, &experiment, &scorer, &search_config(num_modes, 20)).unwrap();
            assert!(result.best_chi <= previous);
            assert!(result.best_chi <= result.baseline_chi);
            previous = result.best_chi;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 1, 7);
        let scorer = DebyeScorer::default();
        let first = run_search(&fixture, &experiment, &scorer, &search_config(3, 20)).unwrap();
        let second = run_search(&fixture, &experiment, &scorer, &search_config(3, 20)).unwrap();
        assert_eq!(first, second);
    }

    /// Fails for any conformation displaced along `direction`.
    struct DirectionalFailure {
        inner: DebyeScorer,
        baseline: DVector<f64>,
        direction: DVector<f64>,
    }

    impl ScatteringScorer for DirectionalFailure {
        fn predict_profile(
            &self,
            coords: &CoordinateSet,
            q: &[f64],
        ) -> Result<Vec<f64>, ScoringError> {
            let projection = (coords.to_flat() - &self.baseline).dot(&self.direction);
            if projection.abs() > 1e-6 {
                return Err(ScoringError::Backend("external scorer crashed".into()));
            }
            self.inner.predict_profile(coords, q)
        }
    }

    #[test]
    fn scoring_failure_aborts_with_last_known_best() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 3);
        let scorer = DirectionalFailure {
            inner: DebyeScorer::default(),
            baseline: fixture.baseline.to_flat(),
            direction: fixture.modes.get(1).unwrap().eigenvector().clone(),
        };
        let error =
            run_search(&fixture, &experiment, &scorer, &search_config(3, 20)).unwrap_err();
        match &error {
            EngineError::SearchAborted {
                mode_index,
                frame,
                source,
                best_so_far,
            } => {
                assert_eq!(*mode_index, 1);
                assert_eq!(*frame, -10);
                assert!(matches!(source, ScoringError::Backend(_)));
                assert_eq!(best_so_far.trace.len(), 21);
                assert_eq!(best_so_far.best_mode, Some(0));
                assert_eq!(best_so_far.best_frame, Some(3));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(error.best_so_far().is_some());
    }

    /// Scores the first conformation it sees and fails on every later call.
    struct FailsAfterFirst {
        inner: DebyeScorer,
        calls: AtomicUsize,
    }

    impl ScatteringScorer for FailsAfterFirst {
        fn predict_profile(
            &self,
            coords: &CoordinateSet,
            q: &[f64],
        ) -> Result<Vec<f64>, ScoringError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
                return Err(ScoringError::Backend("external scorer crashed".into()));
            }
            self.inner.predict_profile(coords, q)
        }
    }

    #[test]
    fn scoring_failure_stops_calling_the_scorer() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 3);
        let scorer = FailsAfterFirst {
            inner: DebyeScorer::default(),
            calls: AtomicUsize::new(0),
        };
        let config = search_config(3, 20);

        #[cfg(not(feature = "parallel"))]
        let result = run_search(&fixture, &experiment, &scorer, &config);

        // One worker visits frames in order, making the call count exact.
        #[cfg(feature = "parallel")]
        let result = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .build()
            .unwrap()
            .install(|| run_search(&fixture, &experiment, &scorer, &config));

        match result {
            Err(EngineError::SearchAborted {
                mode_index,
                frame,
                best_so_far,
                ..
            }) => {
                assert_eq!(mode_index, 0);
                assert_eq!(frame, -10);
                assert!(best_so_far.trace.is_empty());
                assert!(!best_so_far.improved());
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // Baseline plus the single failing frame.
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    }

    struct AlwaysFails;

    impl ScatteringScorer for AlwaysFails {
        fn predict_profile(
            &self,
            _coords: &CoordinateSet,
            _q: &[f64],
        ) -> Result<Vec<f64>, ScoringError> {
            Err(ScoringError::Backend("unavailable".into()))
        }
    }

    #[test]
    fn baseline_scoring_failure_is_reported_as_scoring_error() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 3);
        let result = run_search(&fixture, &experiment, &AlwaysFails, &search_config(3, 20));
        assert!(matches!(result, Err(EngineError::Scoring { .. })));
    }

    #[test]
    fn cancelled_search_returns_baseline_as_best_so_far() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 3);
        let scorer = DebyeScorer::default();
        let config = search_config(3, 20);
        let reporter = ProgressReporter::new();
        let token = CancellationToken::new();
        token.cancel();
        let context = SearchContext::new(
            &fixture.baseline,
            &fixture.modes,
            &experiment,
            &scorer,
            &config,
            &reporter,
        )
        .with_cancellation(&token);
        match run(&context) {
            Err(EngineError::Cancelled { best_so_far }) => {
                assert!(!best_so_far.improved());
                assert!(best_so_far.trace.is_empty());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn mismatched_mode_set_is_a_precondition_error() {
        let fixture = fixture();
        let experiment = target_profile(&fixture, 0, 3);
        let other = Fixture {
            baseline: CoordinateSet::try_from(vec![[0.0, 0.0, 0.0]]).unwrap(),
            modes: fixture.modes.clone(),
        };
        let result = run_search(
            &other,
            &experiment,
            &DebyeScorer::default(),
            &search_config(3, 20),
        );
        assert!(matches!(result, Err(EngineError::Precondition(_))));
    }
}
