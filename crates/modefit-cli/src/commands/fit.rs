use super::load_structure;
use crate::cli::FitArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use modefit::{
    core::io::{
        pdb::{PdbFile, PdbStructure},
        profile::ProfileFile,
        tables,
        traits::DataFile,
    },
    engine::{progress::ProgressReporter, state::SearchResult},
    workflows,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: FitArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_fit_args(&args)?;

    let (structure, coords) = load_structure(&args.input, settings.calpha_only)?;

    info!("Loading experimental profile from {:?}", &args.experiment);
    let experiment = ProfileFile::read_from_path_with(&args.experiment, &settings.profile_options)
        .map_err(|e| CliError::FileParsing {
            path: args.experiment.clone(),
            source: e.into(),
        })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting conformational search over {} modes x {} frames on {} nodes...",
        settings.fit.search.num_modes,
        settings.fit.search.num_frames,
        coords.len()
    );
    info!("Invoking the core fit workflow...");

    let outcome = workflows::fit::run(
        &coords,
        &experiment,
        &settings.scorer,
        &settings.fit,
        &reporter,
        None,
    );

    match outcome {
        Ok(result) => {
            info!(
                contacts = result.num_contacts,
                modes = result.modes.len(),
                "Workflow finished."
            );
            let outputs = write_outputs(&args.output, &structure, &result.search)?;
            report_summary(&result.search, &outputs);
            println!(
                "  RMSD of best model from input: {:.4} Å",
                result.rmsd_from_initial
            );
            Ok(())
        }
        Err(e) => {
            if let Some(best) = e.best_so_far() {
                warn!("Search stopped early: {}", e);
                println!("Search stopped early. Writing the best conformation found so far...");
                let outputs = write_outputs(&args.output, &structure, best)?;
                report_summary(best, &outputs);
            }
            Err(e.into())
        }
    }
}

struct OutputPaths {
    structure: PathBuf,
    profile: PathBuf,
    trace: PathBuf,
}

impl OutputPaths {
    fn from_prefix(prefix: &Path) -> Self {
        Self {
            structure: with_suffix(prefix, "_best.pdb"),
            profile: with_suffix(prefix, "_best.dat"),
            trace: with_suffix(prefix, "_chi.csv"),
        }
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    prefix.with_file_name(name)
}

fn write_outputs(
    prefix: &Path,
    structure: &PdbStructure,
    result: &SearchResult,
) -> Result<OutputPaths> {
    let paths = OutputPaths::from_prefix(prefix);
    if let Some(parent) = paths.structure.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let writing_error = |path: &Path, source: anyhow::Error| CliError::FileWriting {
        path: path.to_path_buf(),
        source,
    };

    info!("Writing best model to {:?}", &paths.structure);
    let best_structure = structure
        .with_coordinates(&result.best_coordinates)
        .map_err(|e| writing_error(&paths.structure, e.into()))?;
    PdbFile::write_to_path(&best_structure, &paths.structure)
        .map_err(|e| writing_error(&paths.structure, e.into()))?;

    info!("Writing best profile to {:?}", &paths.profile);
    ProfileFile::write_to_path(&result.best_profile, &paths.profile)
        .map_err(|e| writing_error(&paths.profile, e.into()))?;

    info!(
        rows = result.trace.len(),
        "Writing chi trace to {:?}", &paths.trace
    );
    tables::write_chi_trace_to_path(&paths.trace, result.trace_rows())
        .map_err(|e| writing_error(&paths.trace, e.into()))?;

    Ok(paths)
}

fn report_summary(result: &SearchResult, outputs: &OutputPaths) {
    match (result.best_mode, result.best_frame) {
        (Some(mode), Some(frame)) => println!(
            "✓ Best chi {:.6} (initial {:.6}) at mode {}, frame {}",
            result.best_chi, result.baseline_chi, mode, frame
        ),
        _ => println!(
            "✓ No displaced conformation improved on the initial chi {:.6}",
            result.baseline_chi
        ),
    }
    println!("  Best model written to: {}", outputs.structure.display());
    println!("  Best profile written to: {}", outputs.profile.display());
    println!("  Chi trace written to: {}", outputs.trace.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use modefit::core::io::pdb::{PdbAtom, RecordKind};
    use modefit::core::models::coords::CoordinateSet;
    use modefit::core::models::profile::ScatteringProfile;
    use modefit::core::scattering::debye::DebyeScorer;
    use modefit::core::scattering::scorer::ScatteringScorer;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn helix_structure(n: usize) -> PdbStructure {
        let atoms = (0..n)
            .map(|k| {
                let t = k as f64 * 100f64.to_radians();
                PdbAtom {
                    record: RecordKind::Atom,
                    serial: k + 1,
                    name: "CA".to_string(),
                    alt_loc: ' ',
                    res_name: "ALA".to_string(),
                    chain_id: 'A',
                    res_seq: k as isize + 1,
                    i_code: ' ',
                    position: Point3::new(2.3 * t.cos(), 2.3 * t.sin(), 1.5 * k as f64),
                    occupancy: 1.0,
                    temp_factor: 0.0,
                    element: "C".to_string(),
                }
            })
            .collect();
        PdbStructure::new(atoms)
    }

    fn parse_fit_args(args: Vec<String>) -> FitArgs {
        match Cli::parse_from(args).command {
            Commands::Fit(fit_args) => fit_args,
            _ => panic!("Expected 'fit' subcommand"),
        }
    }

    #[test]
    fn output_paths_extend_the_prefix_file_name() {
        let paths = OutputPaths::from_prefix(Path::new("results/run1"));
        assert_eq!(paths.structure, PathBuf::from("results/run1_best.pdb"));
        assert_eq!(paths.profile, PathBuf::from("results/run1_best.dat"));
        assert_eq!(paths.trace, PathBuf::from("results/run1_chi.csv"));
    }

    #[test]
    fn fit_command_writes_all_outputs() {
        let dir = tempdir().unwrap();
        let structure = helix_structure(10);
        let pdb_path = dir.path().join("input.pdb");
        PdbFile::write_to_path(&structure, &pdb_path).unwrap();

        let coords: CoordinateSet = structure.coordinates().unwrap();
        let q: Vec<f64> = (1..=20).map(|k| k as f64 * 0.015).collect();
        let intensity = DebyeScorer::default().predict_profile(&coords, &q).unwrap();
        let experiment = ScatteringProfile::new(q, intensity, None).unwrap();
        let profile_path = dir.path().join("experiment.dat");
        ProfileFile::write_to_path(&experiment, &profile_path).unwrap();

        let prefix = dir.path().join("out").join("fit");
        let args = parse_fit_args(vec![
            "modefit".to_string(),
            "fit".to_string(),
            "-i".to_string(),
            pdb_path.to_str().unwrap().to_string(),
            "-e".to_string(),
            profile_path.to_str().unwrap().to_string(),
            "-o".to_string(),
            prefix.to_str().unwrap().to_string(),
            "-n".to_string(),
            "2".to_string(),
            "-f".to_string(),
            "4".to_string(),
        ]);

        run(args).unwrap();

        let paths = OutputPaths::from_prefix(&prefix);
        let best = PdbFile::read_from_path(&paths.structure).unwrap();
        assert_eq!(best.len(), 10);
        let profile = ProfileFile::read_from_path(&paths.profile).unwrap();
        assert_eq!(profile.len(), 20);
        let trace = std::fs::read_to_string(&paths.trace).unwrap();
        let mut lines = trace.lines();
        assert_eq!(lines.next(), Some("mode,frame,coefficient,chi"));
        assert_eq!(lines.count(), 2 * 5);
    }

    #[test]
    fn missing_experiment_file_is_reported_with_its_path() {
        let dir = tempdir().unwrap();
        let pdb_path = dir.path().join("input.pdb");
        PdbFile::write_to_path(&helix_structure(6), &pdb_path).unwrap();
        let missing = dir.path().join("missing.dat");

        let args = parse_fit_args(vec![
            "modefit".to_string(),
            "fit".to_string(),
            "-i".to_string(),
            pdb_path.to_str().unwrap().to_string(),
            "-e".to_string(),
            missing.to_str().unwrap().to_string(),
            "-o".to_string(),
            dir.path().join("fit").to_str().unwrap().to_string(),
        ]);

        let result = run(args);
        assert!(matches!(result, Err(CliError::FileParsing { path, .. }) if path == missing));
    }
}
