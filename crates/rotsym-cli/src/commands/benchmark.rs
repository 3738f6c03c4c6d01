use crate::cli::BenchmarkArgs;
use crate::config::{ModelOverrides, build_config};
use crate::error::Result;
use crate::report::{ConsensusRow, PredictionRow, SummaryRow, histogram_rows, write_csv};
use crate::utils::progress::CliProgressHandler;
use rotsym::core::io::cases::load_cases;
use rotsym::core::io::matrix::write_matrix;
use rotsym::engine::context::DecisionContext;
use rotsym::engine::progress::ProgressReporter;
use rotsym::workflows;
use tracing::{info, warn};

pub fn run(args: BenchmarkArgs, progress: &CliProgressHandler) -> Result<()> {
    let overrides = ModelOverrides {
        kernel: args.kernel.clone(),
        correction: args.correction.clone(),
        taxonomy: args.taxonomy.clone(),
        consensus_detector: args.consensus_detector.clone(),
    };
    let app = build_config(&args.cases, &args.options, &overrides)?;
    let config = &app.core_config;

    info!("Loading decision models...");
    let context = DecisionContext::load(config)?;

    info!("Loading cases from {:?}", &app.cases_path);
    let cases = load_cases(&app.cases_path)?;
    let with_expected = cases.iter().filter(|c| c.expected_order.is_some()).count();
    if with_expected == 0 {
        warn!("No case carries an expected order; accuracy cannot be scored.");
    }

    let reporter = ProgressReporter::with_callback(progress.get_callback());
    let report = workflows::benchmark::run(&cases, config, &context, None, &reporter)?;

    if let Some(path) = &args.output {
        write_csv(
            Some(path),
            report.predictions.iter().map(PredictionRow::from),
        )?;
    }
    if let Some(path) = &args.groups {
        write_csv(Some(path), report.consensus.iter().map(ConsensusRow::from))?;
    }
    if let Some(path) = &args.histogram_out {
        write_csv(Some(path), histogram_rows(&report.histograms))?;
    }
    if let Some(path) = &args.confusion_out {
        match report.score(config.consensus_detector) {
            Some(score) => {
                write_matrix(path, &score.confusion_matrix(config.detector.max_order))?;
                info!(
                    "Wrote confusion kernel of '{}' to {:?}",
                    config.consensus_detector, path
                );
            }
            None => warn!("No score for the consensus detector; confusion kernel not written."),
        }
    }

    write_csv(
        args.summary.as_deref(),
        report.scores.iter().map(SummaryRow::from),
    )?;

    if !report.failures.is_empty() {
        println!(
            "{} detector invocation(s) failed and were skipped (see log for details).",
            report.failures.len()
        );
    }
    Ok(())
}
