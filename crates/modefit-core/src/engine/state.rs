use crate::core::io::tables::ChiTraceRow;
use crate::core::models::coords::CoordinateSet;
use crate::core::models::profile::ScatteringProfile;

/// One scored conformation of the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameScore {
    pub mode_index: usize,
    pub frame: i64,
    pub coefficient: f64,
    pub chi: f64,
}

impl From<&FrameScore> for ChiTraceRow {
    fn from(score: &FrameScore) -> Self {
        ChiTraceRow {
            mode: score.mode_index,
            frame: score.frame,
            coefficient: score.coefficient,
            chi: score.chi,
        }
    }
}

/// The outcome of a conformational search.
///
/// `best_mode` and `best_frame` are `None` when no displaced conformation
/// improved on the starting structure.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub best_chi: f64,
    pub best_mode: Option<usize>,
    pub best_frame: Option<i64>,
    pub best_coordinates: CoordinateSet,
    pub best_profile: ScatteringProfile,
    pub baseline_chi: f64,
    pub trace: Vec<FrameScore>,
}

impl SearchResult {
    pub fn improved(&self) -> bool {
        self.best_mode.is_some()
    }

    pub fn trace_rows(&self) -> impl Iterator<Item = ChiTraceRow> + '_ {
        self.trace.iter().map(ChiTraceRow::from)
    }
}

/// A candidate conformation offered to the accumulator.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub chi: f64,
    pub mode_index: usize,
    pub frame: i64,
    pub coordinates: CoordinateSet,
    pub intensity: Vec<f64>,
}

/// Running best of a search, seeded with the baseline conformation.
#[derive(Debug, Clone)]
pub struct BestFit {
    chi: f64,
    mode_index: Option<usize>,
    frame: Option<i64>,
    coordinates: CoordinateSet,
    intensity: Vec<f64>,
    baseline_chi: f64,
    trace: Vec<FrameScore>,
}

impl BestFit {
    pub fn new(baseline_chi: f64, coordinates: CoordinateSet, intensity: Vec<f64>) -> Self {
        Self {
            chi: baseline_chi,
            mode_index: None,
            frame: None,
            coordinates,
            intensity,
            baseline_chi,
            trace: Vec::new(),
        }
    }

    pub fn record(&mut self, score: FrameScore) {
        self.trace.push(score);
    }

    /// Replaces the best when `candidate.chi` is strictly lower. Ties keep the earlier record.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        if !(candidate.chi < self.chi) {
            return false;
        }
        self.chi = candidate.chi;
        self.mode_index = Some(candidate.mode_index);
        self.frame = Some(candidate.frame);
        self.coordinates = candidate.coordinates;
        self.intensity = candidate.intensity;
        true
    }

    /// Freezes the accumulator into a result whose profile lies on `experiment`'s grid.
    pub fn into_result(self, experiment: &ScatteringProfile) -> SearchResult {
        let best_profile = experiment
            .with_intensity(self.intensity)
            .unwrap_or_else(|_| experiment.clone());
        SearchResult {
            best_chi: self.chi,
            best_mode: self.mode_index,
            best_frame: self.frame,
            best_coordinates: self.coordinates,
            best_profile,
            baseline_chi: self.baseline_chi,
            trace: self.trace,
        }
    }
}
