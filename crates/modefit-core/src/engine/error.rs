use thiserror::Error;

use super::config::ConfigError;
use super::state::SearchResult;
use crate::core::models::coords::CoordinateError;
use crate::core::modes::solver::ModeError;
use crate::core::network::hessian::NetworkError;
use crate::core::scattering::scorer::ScoringError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Network construction failed: {0}")]
    Network(#[from] NetworkError),

    #[error("Mode calculation failed: {0}")]
    Modes(#[from] ModeError),

    #[error("Coordinate error: {0}")]
    Coordinates(#[from] CoordinateError),

    #[error("{0}")]
    Precondition(&'static str),

    #[error("Hessian rejected: {source}")]
    MalformedHessian { source: ModeError },

    #[error("Scoring of the initial conformation failed: {source}")]
    Scoring {
        #[from]
        source: ScoringError,
    },

    #[error("Scoring failed at mode {mode_index}, frame {frame}: {source}")]
    SearchAborted {
        mode_index: usize,
        frame: i64,
        source: ScoringError,
        best_so_far: Box<SearchResult>,
    },

    #[error("Search was cancelled")]
    Cancelled { best_so_far: Box<SearchResult> },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

impl EngineError {
    /// The best conformation found before the search stopped, if it stopped early.
    pub fn best_so_far(&self) -> Option<&SearchResult> {
        match self {
            EngineError::SearchAborted { best_so_far, .. }
            | EngineError::Cancelled { best_so_far } => Some(best_so_far),
            _ => None,
        }
    }
}
