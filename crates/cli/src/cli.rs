//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// MCAP to HDF5 conversion tool
#[derive(Parser, Debug)]
#[command(
    name = "mcap2hdf5",
    author,
    version,
    about = "Convert MCAP robotics recordings into random-access fused HDF5 datasets",
    long_about = "Reads an MCAP recording, pairs lidar scans with their nearest camera \
                  frames, interpolates coordinate-frame transforms, and writes the fused \
                  samples into a chunked HDF5 dataset."
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        env = "MCAP2HDF5_VERBOSE"
    )]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = LogFormat::Compact,
        env = "MCAP2HDF5_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a conversion
    Run(RunArgs),

    /// List the topics in a recording and guess the sensor roles
    Inspect(InspectArgs),

    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the configuration file (.toml / .json)
    #[arg(short, long, default_value = "config.toml", env = "MCAP2HDF5_CONFIG")]
    pub config: PathBuf,

    /// Override the input recording from the configuration
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Override the output dataset path from the configuration
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Ingestion channel capacity (messages)
    #[arg(long, default_value_t = 100)]
    pub buffer_size: usize,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value_t = 0, env = "MCAP2HDF5_METRICS_PORT")]
    pub metrics_port: u16,

    /// Load and validate the configuration, then exit without converting
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `inspect` command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// MCAP recording to inspect
    pub input: PathBuf,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file (.toml / .json)
    #[arg(short, long, default_value = "config.toml", env = "MCAP2HDF5_CONFIG")]
    pub config: PathBuf,

    /// Output validation results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable multi-line format
    Pretty,
    /// Single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
