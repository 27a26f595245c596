use crate::utils::parser::parse_mode_count;
use clap::{Args, Parser, Subcommand};
use modefit::core::modes::solver::ModeCount;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "modefit - Fit protein conformations to SAXS profiles by interpolating along anisotropic network model normal modes.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search along the lowest normal modes for the conformation that best fits a SAXS profile.
    Fit(FitArgs),
    /// Compute the normal modes of a structure and write their eigenvalues and variances.
    Modes(ModesArgs),
}

/// Elastic network options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct NetworkArgs {
    /// Override the contact cutoff distance in Angstroms (minimum 4.0).
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Override the spring constant with a constant value.
    #[arg(short, long, value_name = "FLOAT")]
    pub gamma: Option<f64>,

    /// Enumerate contacts with a k-d tree instead of scanning all pairs.
    #[arg(long)]
    pub kd_tree: bool,

    /// Store the Hessian and Kirchhoff matrices in sparse form.
    #[arg(long)]
    pub sparse: bool,

    /// Use every ATOM/HETATM record instead of only C-alpha atoms.
    #[arg(long)]
    pub all_atoms: bool,

    /// Use the tighter eigensolver convergence threshold.
    #[arg(long)]
    pub high_precision: bool,

    /// Keep the rigid-body (zero) modes in the computed mode set.
    #[arg(long)]
    pub include_zeros: bool,
}

/// Arguments for the `fit` subcommand.
#[derive(Args, Debug)]
pub struct FitArgs {
    // --- Core Arguments ---
    /// Path to the input structure file (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the experimental scattering profile (columns: Q I [sigma]).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub experiment: PathBuf,

    /// Prefix for the output files (<PREFIX>_best.pdb, <PREFIX>_best.dat, <PREFIX>_chi.csv).
    #[arg(short, long, required = true, value_name = "PREFIX")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub network: NetworkArgs,

    // --- Search Overrides ---
    /// Override the number of lowest non-zero modes to search along.
    #[arg(short = 'n', long, value_name = "INT")]
    pub num_modes: Option<usize>,

    /// Override the number of frames per mode.
    #[arg(short = 'f', long, value_name = "INT")]
    pub num_frames: Option<usize>,

    /// Override the interpolation scaling coefficient (values above 1 are recommended).
    #[arg(short = 's', long = "scaling", value_name = "FLOAT")]
    pub scaling_coefficient: Option<f64>,

    // --- Scoring Overrides ---
    /// Treat the intensity column of the experimental profile as log10 values.
    ///
    /// Profiles are read as linear intensities unless this flag (or
    /// `input.log-scale = true` in the config file) is given. Tools that always
    /// read log10 intensities expect the opposite default, so pass this flag for
    /// their input files.
    #[arg(long)]
    pub log_scale: bool,

    /// Override the uniform atomic form factor of the Debye scorer.
    #[arg(long, value_name = "FLOAT")]
    pub form_factor: Option<f64>,

    /// Compare intensities directly instead of fitting a scale factor first.
    #[arg(long)]
    pub no_fit_scale: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S search.num-frames=40
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `modes` subcommand.
#[derive(Args, Debug)]
pub struct ModesArgs {
    /// Path to the input structure file (PDB).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output CSV table (index,eigenvalue,variance).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub network: NetworkArgs,

    /// Override the number of non-zero modes to compute ('all' or a positive integer).
    #[arg(short = 'n', long, value_name = "INT|all", value_parser = parse_mode_count)]
    pub num_modes: Option<ModeCount>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S network.cutoff=12
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn log_scale_help_states_the_linear_default() {
        let mut command = Cli::command();
        let fit = command
            .find_subcommand_mut("fit")
            .expect("fit subcommand is defined");
        let arg = fit
            .get_arguments()
            .find(|a| a.get_id() == "log_scale")
            .expect("--log-scale is defined");
        let help = arg.get_long_help().unwrap().to_string();
        assert!(help.contains("read as linear intensities"));
        assert!(help.contains("always"));
    }
}
