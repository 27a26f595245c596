use super::cancel::CancellationToken;
use super::config::SearchConfig;
use super::progress::ProgressReporter;
use crate::core::models::coords::CoordinateSet;
use crate::core::models::profile::ScatteringProfile;
use crate::core::modes::mode::ModeSet;
use crate::core::scattering::scorer::ScatteringScorer;

/// Read-only inputs shared by every frame evaluation of a conformational search.
#[derive(Clone, Copy)]
pub struct SearchContext<'a> {
    pub baseline: &'a CoordinateSet,
    pub modes: &'a ModeSet,
    pub experiment: &'a ScatteringProfile,
    pub scorer: &'a dyn ScatteringScorer,
    pub config: &'a SearchConfig,
    pub reporter: &'a ProgressReporter<'a>,
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> SearchContext<'a> {
    pub fn new(
        baseline: &'a CoordinateSet,
        modes: &'a ModeSet,
        experiment: &'a ScatteringProfile,
        scorer: &'a dyn ScatteringScorer,
        config: &'a SearchConfig,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            baseline,
            modes,
            experiment,
            scorer,
            config,
            reporter,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationToken::is_cancelled)
    }
}
