// src/cli.rs
//! CLI definitions for wheel2conda

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "wheel2conda")]
#[command(version)]
#[command(about = "Convert a pure-Python wheel into conda packages", long_about = None)]
pub struct Cli {
    /// Path to the .whl file
    pub wheel: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for the {platform}-{bitness} output directories
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory holding cli-64.exe and cli-32.exe Windows launchers
    /// (default: $WHEEL2CONDA_LAUNCHER_DIR, then the install share directory)
    #[arg(long, value_name = "DIR")]
    pub launcher_dir: Option<PathBuf>,

    /// Number of packages to build in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep building remaining targets after a failure
    #[arg(short, long)]
    pub keep_going: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
