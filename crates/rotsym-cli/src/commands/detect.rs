use crate::cli::DetectArgs;
use crate::config::{ModelOverrides, build_config};
use crate::error::Result;
use crate::report::{PredictionRow, write_csv};
use crate::utils::progress::CliProgressHandler;
use rotsym::core::io::cases::load_cases;
use rotsym::engine::progress::ProgressReporter;
use rotsym::workflows;
use tracing::{info, warn};

pub fn run(args: DetectArgs, progress: &CliProgressHandler) -> Result<()> {
    let app = build_config(&args.cases, &args.options, &ModelOverrides::default())?;
    let config = &app.core_config;

    info!("Loading cases from {:?}", &app.cases_path);
    let cases = load_cases(&app.cases_path)?;
    info!(
        "Loaded {} case(s); running {} detector(s).",
        cases.len(),
        config.detectors.len()
    );

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let report =
        workflows::detect::run(&cases, &config.detectors, &config.detector, None, &reporter)?;

    write_csv(
        args.output.as_deref(),
        report.predictions.iter().map(PredictionRow::from),
    )?;

    if !report.failures.is_empty() {
        warn!(
            "{} detector invocation(s) failed and were skipped.",
            report.failures.len()
        );
        for failure in &report.failures {
            eprintln!(
                "  skipped {} [{}]: {}",
                failure.case_id, failure.detector, failure.reason
            );
        }
    }
    Ok(())
}
