//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// RGB-D Fuser - detection fusion pipeline for RGB-D camera streams
#[derive(Parser, Debug)]
#[command(
    name = "rgbd-fuser",
    author,
    version,
    about = "RGB-D detection fusion pipeline",
    long_about = "Fuses 2D instance detections with registered depth into labeled \n\
                  3D point clouds.\n\n\
                  Consumes color, depth and calibration streams, runs a detector \n\
                  per admitted frame, back-projects segmentation masks through the \n\
                  pinhole model, and dispatches records and clouds to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RGBD_FUSER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RGBD_FUSER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the fusion pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "pipeline.toml",
        env = "RGBD_FUSER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override bus host from configuration
    #[arg(long, env = "RGBD_FUSER_BUS_HOST")]
    pub host: Option<String>,

    /// Override bus port from configuration
    #[arg(long, env = "RGBD_FUSER_BUS_PORT")]
    pub port: Option<u16>,

    /// Run against the built-in mock camera rig instead of a recording
    #[arg(long)]
    pub mock: bool,

    /// Save a PNG snapshot of every published frame
    #[arg(long)]
    pub capture: bool,

    /// Maximum number of frames to publish (0 = unlimited)
    #[arg(long, default_value = "0", env = "RGBD_FUSER_MAX_FRAMES")]
    pub max_frames: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "RGBD_FUSER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for internal queues
    #[arg(long, default_value = "100", env = "RGBD_FUSER_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "RGBD_FUSER_METRICS_PORT")]
    pub metrics_port: u16,

    /// Replay a recorded packet stream (JSONL) instead of the mock rig
    #[arg(long, env = "RGBD_FUSER_REPLAY", conflicts_with = "mock")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded speed)
    #[arg(long, default_value = "1.0", env = "RGBD_FUSER_REPLAY_SPEED")]
    pub replay_speed: f64,

    /// Loop replay when finished
    #[arg(long)]
    pub replay_loop: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "pipeline.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Include sink details
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LogFormat {
    /// Structured JSON lines
    Json,
    /// Human-readable multi-line format
    Pretty,
    /// Compact single-line format
    Compact,
}
