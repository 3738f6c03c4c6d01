use crate::cli::ConsensusArgs;
use crate::error::{CliError, Result};
use crate::report::{ConsensusRow, write_csv};
use rotsym::engine::config::{DEFAULT_MAX_ORDER, MAX_SUPPORTED_ORDER};
use rotsym::engine::consensus::{ConfusionModel, CorrectionMatrix};
use rotsym::engine::context::DecisionContext;
use rotsym::workflows::consensus::GroupHistograms;
use tracing::info;

pub fn run(args: ConsensusArgs) -> Result<()> {
    let max_order = args.max_order.unwrap_or(DEFAULT_MAX_ORDER);
    if !(2..=MAX_SUPPORTED_ORDER).contains(&max_order) {
        return Err(CliError::Argument(format!(
            "--max-order must be between 2 and {}, got {}",
            MAX_SUPPORTED_ORDER, max_order
        )));
    }

    let mut context = DecisionContext::new();
    if let Some(path) = &args.kernel {
        info!("Loading confusion kernel from {:?}", path);
        context = context.with_kernel(ConfusionModel::load(path)?);
    }
    if let Some(path) = &args.correction {
        info!("Loading correction matrix from {:?}", path);
        context = context.with_correction(CorrectionMatrix::load(path)?);
    }

    info!("Loading group histograms from {:?}", &args.histogram);
    let histograms = GroupHistograms::load_csv(&args.histogram, max_order)?;
    info!("Deciding consensus for {} group(s).", histograms.len());

    let decided = histograms.decide(&context);
    write_csv(args.output.as_deref(), decided.iter().map(ConsensusRow::from))?;
    Ok(())
}
