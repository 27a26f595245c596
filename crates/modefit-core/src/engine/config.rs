use crate::core::modes::solver::{ModeCount, SolverOptions};
use crate::core::network::gamma::GammaModel;
use crate::core::network::hessian::{BuildOptions, MIN_CUTOFF};
use crate::core::network::neighbors::NeighborSearch;
use crate::core::network::storage::MatrixStorageKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

fn invalid(parameter: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter,
        reason: reason.into(),
    }
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub cutoff: f64,
    pub gamma: GammaModel,
    pub storage: MatrixStorageKind,
    pub neighbor_search: NeighborSearch,
}

impl NetworkConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            storage: self.storage,
            neighbor_search: self.neighbor_search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeConfig {
    pub num_modes: ModeCount,
    pub include_zeros: bool,
    pub high_precision: bool,
}

impl ModeConfig {
    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            num_modes: self.num_modes,
            include_zeros: self.include_zeros,
            high_precision: self.high_precision,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchConfig {
    /// Number of lowest internal modes interpolated along.
    pub num_modes: usize,
    /// Frames per mode; `num_frames + 1` conformations are scored per mode.
    pub num_frames: usize,
    /// Scaling coefficient of the interpolation amplitude.
    pub scaling_coefficient: f64,
}

#[derive(Debug, Clone)]
pub struct FitConfig {
    pub network: NetworkConfig,
    pub modes: ModeConfig,
    pub search: SearchConfig,
}

fn validate_network(
    cutoff: f64,
    gamma: &GammaModel,
    storage: MatrixStorageKind,
) -> Result<(), ConfigError> {
    if !(cutoff.is_finite() && cutoff >= MIN_CUTOFF) {
        return Err(invalid(
            "cutoff",
            format!("must be a finite distance of at least {MIN_CUTOFF} (found {cutoff})"),
        ));
    }
    gamma.validate().map_err(|reason| invalid("gamma", reason))?;
    if !storage.is_available() {
        return Err(invalid(
            "storage",
            "sparse storage requires building with the `sparse` feature",
        ));
    }
    Ok(())
}

fn validate_mode_count(num_modes: ModeCount) -> Result<(), ConfigError> {
    if num_modes == ModeCount::Count(0) {
        return Err(invalid("num_modes", "must be a positive integer or 'all'"));
    }
    Ok(())
}

fn validate_scaling(coefficient: f64) -> Result<(), ConfigError> {
    if !(coefficient.is_finite() && coefficient > 0.0) {
        return Err(invalid(
            "scaling_coefficient",
            format!("must be a positive finite number (found {coefficient})"),
        ));
    }
    Ok(())
}

#[derive(Default)]
pub struct NetworkConfigBuilder {
    cutoff: Option<f64>,
    gamma: Option<GammaModel>,
    storage: Option<MatrixStorageKind>,
    neighbor_search: Option<NeighborSearch>,
}

impl NetworkConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn gamma(mut self, gamma: GammaModel) -> Self {
        self.gamma = Some(gamma);
        self
    }
    pub fn storage(mut self, storage: MatrixStorageKind) -> Self {
        self.storage = Some(storage);
        self
    }
    pub fn neighbor_search(mut self, strategy: NeighborSearch) -> Self {
        self.neighbor_search = Some(strategy);
        self
    }

    pub fn build(self) -> Result<NetworkConfig, ConfigError> {
        let cutoff = self.cutoff.ok_or(ConfigError::MissingParameter("cutoff"))?;
        let gamma = self.gamma.ok_or(ConfigError::MissingParameter("gamma"))?;
        let storage = self.storage.unwrap_or_default();
        validate_network(cutoff, &gamma, storage)?;
        Ok(NetworkConfig {
            cutoff,
            gamma,
            storage,
            neighbor_search: self.neighbor_search.unwrap_or_default(),
        })
    }
}

#[derive(Default)]
pub struct ModeConfigBuilder {
    num_modes: Option<ModeCount>,
    include_zeros: bool,
    high_precision: bool,
}

impl ModeConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_modes(mut self, num_modes: ModeCount) -> Self {
        self.num_modes = Some(num_modes);
        self
    }
    pub fn include_zeros(mut self, include: bool) -> Self {
        self.include_zeros = include;
        self
    }
    pub fn high_precision(mut self, enabled: bool) -> Self {
        self.high_precision = enabled;
        self
    }

    pub fn build(self) -> Result<ModeConfig, ConfigError> {
        let num_modes = self
            .num_modes
            .ok_or(ConfigError::MissingParameter("num_modes"))?;
        validate_mode_count(num_modes)?;
        Ok(ModeConfig {
            num_modes,
            include_zeros: self.include_zeros,
            high_precision: self.high_precision,
        })
    }
}

/// Builds the configuration of a complete fit: network, mode solver and search.
///
/// The solver is asked for exactly as many internal modes as the search
/// interpolates along.
#[derive(Default)]
pub struct FitConfigBuilder {
    cutoff: Option<f64>,
    gamma: Option<GammaModel>,
    storage: Option<MatrixStorageKind>,
    neighbor_search: Option<NeighborSearch>,
    include_zeros: bool,
    high_precision: bool,
    num_modes: Option<usize>,
    num_frames: Option<usize>,
    scaling_coefficient: Option<f64>,
}

impl FitConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
    pub fn gamma(mut self, gamma: GammaModel) -> Self {
        self.gamma = Some(gamma);
        self
    }
    pub fn storage(mut self, storage: MatrixStorageKind) -> Self {
        self.storage = Some(storage);
        self
    }
    pub fn neighbor_search(mut self, strategy: NeighborSearch) -> Self {
        self.neighbor_search = Some(strategy);
        self
    }
    pub fn include_zeros(mut self, include: bool) -> Self {
        self.include_zeros = include;
        self
    }
    pub fn high_precision(mut self, enabled: bool) -> Self {
        self.high_precision = enabled;
        self
    }
    pub fn num_modes(mut self, n: usize) -> Self {
        self.num_modes = Some(n);
        self
    }
    pub fn num_frames(mut self, n: usize) -> Self {
        self.num_frames = Some(n);
        self
    }
    pub fn scaling_coefficient(mut self, coefficient: f64) -> Self {
        self.scaling_coefficient = Some(coefficient);
        self
    }

    pub fn build(self) -> Result<FitConfig, ConfigError> {
        let cutoff = self.cutoff.ok_or(ConfigError::MissingParameter("cutoff"))?;
        let gamma = self.gamma.ok_or(ConfigError::MissingParameter("gamma"))?;
        let storage = self.storage.unwrap_or_default();
        validate_network(cutoff, &gamma, storage)?;

        let search = SearchConfig {
            num_modes: self
                .num_modes
                .ok_or(ConfigError::MissingParameter("num_modes"))?,
            num_frames: self
                .num_frames
                .ok_or(ConfigError::MissingParameter("num_frames"))?,
            scaling_coefficient: self
                .scaling_coefficient
                .ok_or(ConfigError::MissingParameter("scaling_coefficient"))?,
        };
        validate_scaling(search.scaling_coefficient)?;

        Ok(FitConfig {
            network: NetworkConfig {
                cutoff,
                gamma,
                storage,
                neighbor_search: self.neighbor_search.unwrap_or_default(),
            },
            modes: ModeConfig {
                num_modes: ModeCount::Count(search.num_modes.max(1)),
                include_zeros: self.include_zeros,
                high_precision: self.high_precision,
            },
            search,
        })
    }
}
