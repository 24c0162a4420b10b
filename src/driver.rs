// src/driver.rs

//! Conversion driver
//!
//! Opens a wheel once, works out the build matrix for it and builds every
//! target on a worker pool. Targets share the extracted wheel read-only and
//! write disjoint output files.
//!
//! Failure policy: a wheel that fails to open or validate stops the run
//! before any target is built. A failing target stops the run too, unless
//! `keep_going` is set and the error is specific to that target (see
//! [`Error::is_fatal_for_run`]). Packages that were already complete are
//! kept, and targets that had not started are reported as cancelled.

use crate::conda::builder::{BuildReport, build_package};
use crate::conda::launcher::LauncherProvider;
use crate::conda::target::BuildTarget;
use crate::config::ConversionConfig;
use crate::error::{Error, Result};
use crate::wheel::Wheel;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};

/// A target that failed to build
#[derive(Debug)]
pub struct TargetFailure {
    pub target: BuildTarget,
    pub error: Error,
}

/// Outcome of a conversion run, in matrix order
#[derive(Debug, Default)]
pub struct ConversionSummary {
    pub built: Vec<BuildReport>,
    pub failed: Vec<TargetFailure>,
    /// Targets never started because an earlier target failed
    pub cancelled: Vec<BuildTarget>,
    /// Configured Python versions the wheel does not support
    pub skipped_pythons: Vec<String>,
}

impl ConversionSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }

    /// Built packages, or the first failure in matrix order
    pub fn into_result(self) -> Result<Vec<BuildReport>> {
        match self.failed.into_iter().next() {
            Some(failure) => Err(failure.error),
            None => Ok(self.built),
        }
    }
}

enum Outcome {
    Built(BuildReport),
    Failed(Error),
    Cancelled,
}

/// Every (platform, bitness, python) combination, matrix-major
pub fn enumerate_targets(config: &ConversionConfig, pythons: &[String]) -> Vec<BuildTarget> {
    config
        .matrix
        .iter()
        .flat_map(|cell| {
            pythons
                .iter()
                .map(move |py| BuildTarget::new(cell.platform, cell.bitness, py.clone()))
        })
        .collect()
}

/// Open a wheel and convert it
pub fn convert(wheel_path: &Path, config: &ConversionConfig) -> Result<ConversionSummary> {
    config.validate()?;
    let wheel = Wheel::open(wheel_path)?;
    let stubs = config.launcher_provider();
    convert_wheel(&wheel, config, stubs.as_ref())
}

/// Build every compatible target for an opened wheel
pub fn convert_wheel(
    wheel: &Wheel,
    config: &ConversionConfig,
    stubs: &dyn LauncherProvider,
) -> Result<ConversionSummary> {
    let pythons = wheel.compatible_python_versions(&config.python_versions);
    let skipped_pythons: Vec<String> = config
        .python_versions
        .iter()
        .filter(|v| !pythons.contains(v))
        .cloned()
        .collect();

    for version in &skipped_pythons {
        info!("Skipping Python {}: not supported by {}", version, wheel.name());
    }
    if pythons.is_empty() {
        return Err(Error::UnsupportedFormat(format!(
            "{} supports none of the configured Python versions ({})",
            wheel.name(),
            config.python_versions.join(", ")
        )));
    }

    let targets = enumerate_targets(config, &pythons);
    info!(
        "Converting {} {} for {} targets",
        wheel.name(),
        wheel.version(),
        targets.len()
    );

    let options = config.build_options();
    let abort = AtomicBool::new(false);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;

    let outcomes: Vec<Outcome> = pool.install(|| {
        targets
            .par_iter()
            .map(|target| {
                if abort.load(Ordering::SeqCst) {
                    return Outcome::Cancelled;
                }
                match build_package(wheel, target, &options, stubs, &config.output_dir) {
                    Ok(report) => Outcome::Built(report),
                    Err(e) => {
                        error!("{}: {}", target, e);
                        // wheel-level defects fail every target alike
                        if !config.keep_going || e.is_fatal_for_run() {
                            abort.store(true, Ordering::SeqCst);
                        }
                        Outcome::Failed(e)
                    }
                }
            })
            .collect()
    });

    let mut summary = ConversionSummary {
        skipped_pythons,
        ..ConversionSummary::default()
    };
    for (target, outcome) in targets.into_iter().zip(outcomes) {
        match outcome {
            Outcome::Built(report) => summary.built.push(report),
            Outcome::Failed(error) => summary.failed.push(TargetFailure { target, error }),
            Outcome::Cancelled => {
                warn!("{}: cancelled after an earlier failure", target);
                summary.cancelled.push(target);
            }
        }
    }

    Ok(summary)
}
