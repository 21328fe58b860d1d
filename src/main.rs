use anyhow::{Context, Result};
use tracing::*;

use rtc_dump_report::{cli, dump, logger, report, settings, stats};

fn main() -> Result<()> {
    // CLI should be started before logger to allow control over verbosity
    cli::manager::init();
    // Logger should start before everything else to register any log information
    logger::manager::init();
    // Settings should start before the pipeline since it holds the labeling rules
    settings::manager::init(cli::manager::settings_path());

    let labeler = stats::label::Labeler::new(&settings::manager::labels())
        .context("Invalid labeling rule in settings")?;

    let path = cli::manager::dump_path();
    let document = dump::loader::load(path, cli::manager::dump_format())
        .with_context(|| format!("Failed to load dump {path:?}"))?;
    info!(
        "Loaded {} dump with {} connection(s)",
        document.format(),
        document.len()
    );

    let result = stats::compute_with(&document, &labeler);

    let stdout = std::io::stdout();
    report::render(&result, cli::manager::output_format(), &mut stdout.lock())?;

    Ok(())
}
