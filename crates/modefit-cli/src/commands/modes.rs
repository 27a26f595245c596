use super::load_structure;
use crate::cli::ModesArgs;
use crate::config::PartialConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use modefit::{core::io::tables, engine::progress::ProgressReporter, workflows};
use tracing::info;

pub fn run(args: ModesArgs) -> Result<()> {
    let partial_config = PartialConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_modes_args(&args)?;

    let (_, coords) = load_structure(&args.input, settings.calpha_only)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Computing normal modes of {} nodes...", coords.len());
    let analysis =
        workflows::modes::run(&coords, &settings.network, &settings.modes, &reporter)?;

    if analysis.modes.shortfall() > 0 {
        println!(
            "Note: {} fewer non-zero modes than requested were available.",
            analysis.modes.shortfall()
        );
    }

    info!("Writing mode table to {:?}", &args.output);
    tables::write_mode_table_to_path(&args.output, &analysis.modes).map_err(|e| {
        CliError::FileWriting {
            path: args.output.clone(),
            source: e.into(),
        }
    })?;

    println!(
        "✓ {} modes written to: {} ({} zero modes detected, {} contacts, variance trace {:.6})",
        analysis.modes.len(),
        args.output.display(),
        analysis.modes.zeros_detected(),
        analysis.num_contacts,
        analysis.modes.trace()
    );
    Ok(())
}
