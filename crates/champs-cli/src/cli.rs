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
    author = "CHAMPS contributors",
    version,
    about = "CHAMPS CLI - Bond inference, feature engineering and cross-validated regression for predicting scalar coupling constants.",
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

    /// Set the number of threads for bond inference.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Infer bonds and write the annotated structure table.
    Preprocess(PreprocessArgs),
    /// Train with k-fold cross-validation and write test predictions.
    Predict(PredictArgs),
    /// Search for the best model hyperparameters and record them in a study file.
    Tune(TuneArgs),
}

/// Options shared by every subcommand that reads a configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S validation.n-splits=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `preprocess` subcommand.
#[derive(Args, Debug)]
pub struct PreprocessArgs {
    /// Path to the structures CSV (molecule_name, atom_index, atom, x, y, z).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub structures: PathBuf,

    /// Path for the annotated structures CSV.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Directory of the intermediate table cache.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Always recompute bonds, ignoring and not updating the cache.
    #[arg(long)]
    pub no_cache: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Inputs shared by `predict` and `tune`.
#[derive(Args, Debug)]
pub struct TrainingInputArgs {
    /// Path to the training pairs CSV (with scalar_coupling_constant).
    #[arg(long, required = true, value_name = "PATH")]
    pub train: PathBuf,

    /// Path to the structures CSV.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub structures: PathBuf,

    /// Path to the scalar coupling contributions CSV (needed for the fc/sd/pso/dso targets).
    #[arg(long, value_name = "PATH")]
    pub contributions: Option<PathBuf>,

    /// Comma-separated feature names, overriding the config file.
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub features: Option<Vec<String>>,

    /// Model family: gradient-boosting (default) or ridge.
    #[arg(long, value_name = "KIND")]
    pub model: Option<String>,

    /// Regression target: scalar_coupling_constant, fc, sd, pso or dso.
    #[arg(long, value_name = "COLUMN")]
    pub target: Option<String>,

    /// Number of k-fold splits.
    #[arg(long, value_name = "INT")]
    pub n_splits: Option<usize>,

    /// Seed for fold shuffling and parameter sampling.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Read at most this many rows of each pair table.
    #[arg(long, value_name = "INT")]
    pub nrows: Option<usize>,

    /// Directory of the intermediate table cache.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Arguments for the `predict` subcommand.
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[command(flatten)]
    pub input: TrainingInputArgs,

    /// Path to the test pairs CSV.
    #[arg(long, required = true, value_name = "PATH")]
    pub test: PathBuf,

    /// Path for the submission CSV (id, scalar_coupling_constant).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Ridge penalty, overriding the config file and any tuned value (ridge model only).
    #[arg(long, value_name = "FLOAT")]
    pub alpha: Option<f64>,

    /// Study file holding tuned parameters.
    #[arg(long, value_name = "PATH")]
    pub study: Option<PathBuf>,
}

/// Arguments for the `tune` subcommand.
#[derive(Args, Debug)]
pub struct TuneArgs {
    #[command(flatten)]
    pub input: TrainingInputArgs,

    /// Number of random-search trials.
    #[arg(long, value_name = "INT")]
    pub n_trials: Option<usize>,

    /// Study file in which the best parameters are recorded.
    #[arg(long, value_name = "PATH")]
    pub study: Option<PathBuf>,
}
