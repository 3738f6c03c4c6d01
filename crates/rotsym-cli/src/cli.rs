use clap::{Args, Parser, Subcommand};
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
    about = "rotsym - Rotational symmetry order detection and group consensus for self-aligned macromolecular structures.",
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
    /// Estimate the rotational symmetry order of every structure in a case file.
    Detect(DetectArgs),
    /// Score detectors against expected orders and decide a consensus order per group.
    Benchmark(BenchmarkArgs),
    /// Decide consensus orders from precomputed per-group order histograms.
    Consensus(ConsensusArgs),
}

/// Detector selection and tuning shared by `detect` and `benchmark`.
#[derive(Args, Debug, Clone, Default)]
pub struct DetectionOptions {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Detector to run (e.g. 'cycle', 'harmonic-floating', or 'all').
    /// Can be used multiple times; overrides the detectors listed in the config file.
    #[arg(short = 'd', long = "detector", value_name = "NAME")]
    pub detectors: Vec<String>,

    /// Override the largest order any detector may report.
    #[arg(long, value_name = "INT")]
    pub max_order: Option<u32>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S detection.loess-bandwidth=0.2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `detect` subcommand.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Path to the case file (TOML) holding the self-alignments.
    #[arg(long, required = true, value_name = "PATH")]
    pub cases: PathBuf,

    /// Write predictions as CSV to this path instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub options: DetectionOptions,
}

/// Arguments for the `benchmark` subcommand.
#[derive(Args, Debug)]
pub struct BenchmarkArgs {
    /// Path to the case file (TOML) holding the self-alignments and expected orders.
    #[arg(long, required = true, value_name = "PATH")]
    pub cases: PathBuf,

    /// Write per-case predictions as CSV.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write per-detector accuracy as CSV instead of printing it.
    #[arg(long, value_name = "PATH")]
    pub summary: Option<PathBuf>,

    /// Write the consensus detector's empirical confusion kernel (tab separated).
    #[arg(long, value_name = "PATH")]
    pub confusion_out: Option<PathBuf>,

    /// Write the per-group consensus orders as CSV.
    #[arg(long, value_name = "PATH")]
    pub groups: Option<PathBuf>,

    /// Write the per-group order histograms as CSV, readable by `rotsym consensus`.
    #[arg(long, value_name = "PATH")]
    pub histogram_out: Option<PathBuf>,

    /// Override the confusion kernel used by the error-kernel decider.
    #[arg(long, value_name = "PATH")]
    pub kernel: Option<PathBuf>,

    /// Override the correction matrix used by the error-matrix decider.
    #[arg(long, value_name = "PATH")]
    pub correction: Option<PathBuf>,

    /// Override the taxonomy index mapping structure ids to groups.
    #[arg(long, value_name = "PATH")]
    pub taxonomy: Option<PathBuf>,

    /// Override the detector whose estimates feed the group histograms.
    #[arg(long, value_name = "NAME")]
    pub consensus_detector: Option<String>,

    #[command(flatten)]
    pub options: DetectionOptions,
}

/// Arguments for the `consensus` subcommand.
#[derive(Args, Debug)]
pub struct ConsensusArgs {
    /// Path to a CSV file with `group,order,count` rows.
    #[arg(long, required = true, value_name = "PATH")]
    pub histogram: PathBuf,

    /// Confusion kernel for the error-kernel decider.
    #[arg(long, value_name = "PATH")]
    pub kernel: Option<PathBuf>,

    /// Correction matrix for the error-matrix decider.
    #[arg(long, value_name = "PATH")]
    pub correction: Option<PathBuf>,

    /// Largest order kept in the histograms.
    #[arg(long, value_name = "INT")]
    pub max_order: Option<u32>,

    /// Write consensus orders as CSV to this path instead of standard output.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
