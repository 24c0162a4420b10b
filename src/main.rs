// src/main.rs

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::Cli;
use tracing::info;
use wheel2conda::ConversionConfig;
use wheel2conda::driver;

fn load_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut config = match &cli.config {
        Some(path) => ConversionConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ConversionConfig::default(),
    };

    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &cli.launcher_dir {
        config.launcher_dir = Some(dir.clone());
    }
    if let Some(jobs) = cli.jobs {
        config.jobs = jobs;
    }
    if cli.keep_going {
        config.keep_going = true;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    info!("Converting {}", cli.wheel.display());

    let summary = driver::convert(&cli.wheel, &config)
        .with_context(|| format!("Failed to convert {}", cli.wheel.display()))?;

    for report in &summary.built {
        println!(
            "{} ({} files, {} bytes)",
            report.output.display(),
            report.file_count,
            report.size
        );
    }
    if !summary.skipped_pythons.is_empty() {
        println!("Skipped Python: {}", summary.skipped_pythons.join(", "));
    }
    for failure in &summary.failed {
        eprintln!("FAILED {}: {}", failure.target, failure.error);
    }
    for target in &summary.cancelled {
        eprintln!("CANCELLED {}", target);
    }

    if !summary.is_success() {
        bail!(
            "{} of {} targets failed",
            summary.failed.len() + summary.cancelled.len(),
            summary.built.len() + summary.failed.len() + summary.cancelled.len()
        );
    }

    Ok(())
}
