use crate::cli::{FitArgs, ModesArgs, NetworkArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use defaults::DefaultsConfig;
use modefit::core::io::profile::ProfileReadOptions;
use modefit::core::modes::solver::ModeCount;
use modefit::core::network::gamma::GammaModel;
use modefit::core::network::neighbors::NeighborSearch;
use modefit::core::network::storage::MatrixStorageKind;
use modefit::core::scattering::debye::DebyeScorer;
use modefit::engine::config as core_config;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

pub mod defaults;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case", tag = "type")]
enum PartialGamma {
    Constant { value: f64 },
    DistanceDependent { reference: f64, exponent: f64 },
}

impl From<PartialGamma> for GammaModel {
    fn from(p: PartialGamma) -> Self {
        match p {
            PartialGamma::Constant { value } => GammaModel::Constant(value),
            PartialGamma::DistanceDependent {
                reference,
                exponent,
            } => GammaModel::DistanceDependent {
                reference,
                exponent,
            },
        }
    }
}

/// `num-modes = 10` or `num-modes = "all"`.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
enum PartialModeCount {
    Count(usize),
    Keyword(String),
}

impl PartialModeCount {
    fn resolve(self) -> Result<ModeCount> {
        match self {
            PartialModeCount::Count(n) => parser::parse_mode_count(&n.to_string()),
            PartialModeCount::Keyword(s) => parser::parse_mode_count(&s),
        }
        .map_err(|e| CliError::Config(format!("`modes.num-modes`: {}", e)))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialNetworkConfig {
    cutoff: Option<f64>,
    gamma: Option<PartialGamma>,
    storage: Option<MatrixStorageKind>,
    #[serde(rename = "neighbor-search")]
    neighbor_search: Option<NeighborSearch>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialModesConfig {
    #[serde(rename = "num-modes")]
    num_modes: Option<PartialModeCount>,
    #[serde(rename = "include-zeros")]
    include_zeros: Option<bool>,
    #[serde(rename = "high-precision")]
    high_precision: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSearchConfig {
    #[serde(rename = "num-modes")]
    num_modes: Option<usize>,
    #[serde(rename = "num-frames")]
    num_frames: Option<usize>,
    #[serde(rename = "scaling-coefficient")]
    scaling_coefficient: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialScoringConfig {
    #[serde(rename = "form-factor")]
    form_factor: Option<f64>,
    #[serde(rename = "fit-scale")]
    fit_scale: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialInputConfig {
    #[serde(rename = "log-scale")]
    log_scale: Option<bool>,
    #[serde(rename = "calpha-only")]
    calpha_only: Option<bool>,
}

/// Everything a TOML configuration file may set. Every section and key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    network: Option<PartialNetworkConfig>,
    modes: Option<PartialModesConfig>,
    search: Option<PartialSearchConfig>,
    scoring: Option<PartialScoringConfig>,
    input: Option<PartialInputConfig>,
}

/// The resolved settings of a `fit` run.
#[derive(Debug, Clone)]
pub struct FitSettings {
    pub fit: core_config::FitConfig,
    pub scorer: DebyeScorer,
    pub profile_options: ProfileReadOptions,
    pub calpha_only: bool,
}

/// The resolved settings of a `modes` run.
#[derive(Debug, Clone)]
pub struct ModesSettings {
    pub network: core_config::NetworkConfig,
    pub modes: core_config::ModeConfig,
    pub calpha_only: bool,
}

struct ResolvedNetwork {
    cutoff: f64,
    gamma: GammaModel,
    storage: MatrixStorageKind,
    neighbor_search: NeighborSearch,
    include_zeros: bool,
    high_precision: bool,
    calpha_only: bool,
}

impl PartialConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Reads the file when one is given, otherwise starts from an empty configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_fit_args(mut self, args: &FitArgs) -> Result<FitSettings> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let network = self.resolve_network(&args.network, &defaults);
        let search = self.search.unwrap_or_default();
        let scoring = self.scoring.unwrap_or_default();
        let input = self.input.unwrap_or_default();

        let fit = core_config::FitConfigBuilder::new()
            .cutoff(network.cutoff)
            .gamma(network.gamma)
            .storage(network.storage)
            .neighbor_search(network.neighbor_search)
            .include_zeros(network.include_zeros)
            .high_precision(network.high_precision)
            .num_modes(
                args.num_modes
                    .or(search.num_modes)
                    .unwrap_or(defaults.num_modes),
            )
            .num_frames(
                args.num_frames
                    .or(search.num_frames)
                    .unwrap_or(defaults.num_frames),
            )
            .scaling_coefficient(
                args.scaling_coefficient
                    .or(search.scaling_coefficient)
                    .unwrap_or(defaults.scaling_coefficient),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let form_factor = args
            .form_factor
            .or(scoring.form_factor)
            .unwrap_or(defaults.form_factor);
        if !(form_factor.is_finite() && form_factor > 0.0) {
            return Err(CliError::Config(format!(
                "`scoring.form-factor` must be a positive number (found {})",
                form_factor
            )));
        }
        let fit_scale = if args.no_fit_scale {
            false
        } else {
            scoring.fit_scale.unwrap_or(defaults.fit_scale)
        };
        let log_scale = args.log_scale || input.log_scale.unwrap_or(defaults.log_scale);

        Ok(FitSettings {
            fit,
            scorer: DebyeScorer::new(form_factor, fit_scale),
            profile_options: ProfileReadOptions { log_scale },
            calpha_only: network.calpha_only,
        })
    }

    pub fn merge_with_modes_args(mut self, args: &ModesArgs) -> Result<ModesSettings> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let network = self.resolve_network(&args.network, &defaults);
        let file_mode_count = self
            .modes
            .as_ref()
            .and_then(|m| m.num_modes.clone())
            .map(PartialModeCount::resolve)
            .transpose()?;
        let num_modes = args
            .num_modes
            .or(file_mode_count)
            .unwrap_or(ModeCount::Count(defaults.analysis_modes));

        let network_config = core_config::NetworkConfigBuilder::new()
            .cutoff(network.cutoff)
            .gamma(network.gamma)
            .storage(network.storage)
            .neighbor_search(network.neighbor_search)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;
        let mode_config = core_config::ModeConfigBuilder::new()
            .num_modes(num_modes)
            .include_zeros(network.include_zeros)
            .high_precision(network.high_precision)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(ModesSettings {
            network: network_config,
            modes: mode_config,
            calpha_only: network.calpha_only,
        })
    }

    fn resolve_network(&self, args: &NetworkArgs, defaults: &DefaultsConfig) -> ResolvedNetwork {
        let network = self.network.as_ref();
        let modes = self.modes.as_ref();
        let input = self.input.as_ref();

        let gamma = match (args.gamma, network.and_then(|n| n.gamma.clone())) {
            (Some(value), _) => GammaModel::Constant(value),
            (None, Some(partial)) => partial.into(),
            (None, None) => GammaModel::Constant(defaults.gamma),
        };
        let storage = if args.sparse {
            MatrixStorageKind::Sparse
        } else {
            network.and_then(|n| n.storage).unwrap_or_default()
        };
        let neighbor_search = if args.kd_tree {
            NeighborSearch::KdTree
        } else {
            network.and_then(|n| n.neighbor_search).unwrap_or_default()
        };
        let calpha_only = if args.all_atoms {
            false
        } else {
            input
                .and_then(|i| i.calpha_only)
                .unwrap_or(defaults.calpha_only)
        };

        ResolvedNetwork {
            cutoff: args
                .cutoff
                .or(network.and_then(|n| n.cutoff))
                .unwrap_or(defaults.cutoff),
            gamma,
            storage,
            neighbor_search,
            include_zeros: args.include_zeros
                || modes.and_then(|m| m.include_zeros).unwrap_or(false),
            high_precision: args.high_precision
                || modes.and_then(|m| m.high_precision).unwrap_or(false),
            calpha_only,
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) =
                parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            match key {
                "network.cutoff" => {
                    self.network.get_or_insert_with(Default::default).cutoff =
                        Some(parse_value(key, value_str)?);
                }
                "network.gamma" => {
                    self.network.get_or_insert_with(Default::default).gamma =
                        Some(PartialGamma::Constant {
                            value: parse_value(key, value_str)?,
                        });
                }
                "network.storage" => {
                    let storage = match value_str {
                        "dense" => MatrixStorageKind::Dense,
                        "sparse" => MatrixStorageKind::Sparse,
                        _ => return Err(invalid_value(key, value_str, "'dense' or 'sparse'")),
                    };
                    self.network.get_or_insert_with(Default::default).storage = Some(storage);
                }
                "network.neighbor-search" => {
                    let strategy = match value_str {
                        "brute-force" => NeighborSearch::BruteForce,
                        "kd-tree" => NeighborSearch::KdTree,
                        _ => {
                            return Err(invalid_value(key, value_str, "'brute-force' or 'kd-tree'"));
                        }
                    };
                    self.network
                        .get_or_insert_with(Default::default)
                        .neighbor_search = Some(strategy);
                }
                "modes.num-modes" => {
                    self.modes.get_or_insert_with(Default::default).num_modes =
                        Some(PartialModeCount::Keyword(value_str.to_string()));
                }
                "modes.include-zeros" => {
                    self.modes.get_or_insert_with(Default::default).include_zeros =
                        Some(parse_value(key, value_str)?);
                }
                "modes.high-precision" => {
                    self.modes.get_or_insert_with(Default::default).high_precision =
                        Some(parse_value(key, value_str)?);
                }
                "search.num-modes" => {
                    self.search.get_or_insert_with(Default::default).num_modes =
                        Some(parse_value(key, value_str)?);
                }
                "search.num-frames" => {
                    self.search.get_or_insert_with(Default::default).num_frames =
                        Some(parse_value(key, value_str)?);
                }
                "search.scaling-coefficient" => {
                    self.search
                        .get_or_insert_with(Default::default)
                        .scaling_coefficient = Some(parse_value(key, value_str)?);
                }
                "scoring.form-factor" => {
                    self.scoring.get_or_insert_with(Default::default).form_factor =
                        Some(parse_value(key, value_str)?);
                }
                "scoring.fit-scale" => {
                    self.scoring.get_or_insert_with(Default::default).fit_scale =
                        Some(parse_value(key, value_str)?);
                }
                "input.log-scale" => {
                    self.input.get_or_insert_with(Default::default).log_scale =
                        Some(parse_value(key, value_str)?);
                }
                "input.calpha-only" => {
                    self.input.get_or_insert_with(Default::default).calpha_only =
                        Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str
        .parse()
        .map_err(|_| invalid_value(key, value_str, std::any::type_name::<T>()))
}

fn invalid_value(key: &str, value_str: &str, expected: &str) -> CliError {
    CliError::Config(format!(
        "Invalid value for {}: '{}' (expected {})",
        key, value_str, expected
    ))
}
