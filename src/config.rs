// src/config.rs

//! Conversion configuration
//!
//! Every value has a default, so an empty or absent config file converts
//! for the standard matrix. A TOML file may override any field:
//!
//! ```toml
//! python_versions = ["3.5"]
//! launcher_dir = "/usr/share/wheel2conda/launchers"
//! keep_going = true
//!
//! [[matrix]]
//! platform = "linux"
//! bitness = 64
//! ```

use crate::conda::builder::{BuildOptions, DEFAULT_PLACEHOLDER, source_date_epoch};
use crate::conda::launcher::{DirectoryLauncherProvider, LauncherProvider, SearchLauncherProvider};
use crate::conda::platform::{Bitness, Platform};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One platform/bitness cell of the build matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    pub platform: Platform,
    pub bitness: Bitness,
}

impl MatrixEntry {
    pub fn new(platform: Platform, bitness: Bitness) -> Self {
        Self { platform, bitness }
    }
}

/// Default matrix: linux-64, linux-32, osx-64, win-64, win-32
pub fn default_matrix() -> Vec<MatrixEntry> {
    vec![
        MatrixEntry::new(Platform::Linux, Bitness::Bits64),
        MatrixEntry::new(Platform::Linux, Bitness::Bits32),
        MatrixEntry::new(Platform::Osx, Bitness::Bits64),
        MatrixEntry::new(Platform::Windows, Bitness::Bits64),
        MatrixEntry::new(Platform::Windows, Bitness::Bits32),
    ]
}

/// Default Python candidates, newest first
pub fn default_python_versions() -> Vec<String> {
    vec!["3.5".to_string(), "3.4".to_string(), "2.7".to_string()]
}

/// Configuration for a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Platform/bitness combinations to build
    pub matrix: Vec<MatrixEntry>,

    /// Python versions to build for, filtered per wheel
    pub python_versions: Vec<String>,

    /// Install prefix placeholder embedded in launchers
    pub prefix_placeholder: String,

    /// Build number for every package
    pub build_number: u32,

    /// Directory holding `cli-64.exe` and `cli-32.exe`; searched for when unset
    pub launcher_dir: Option<PathBuf>,

    /// Where `{platform}-{bitness}/` directories are created
    pub output_dir: PathBuf,

    /// Parallel builds
    pub jobs: usize,

    /// Keep building remaining targets after a failure
    pub keep_going: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            matrix: default_matrix(),
            python_versions: default_python_versions(),
            prefix_placeholder: DEFAULT_PLACEHOLDER.to_string(),
            build_number: 0,
            launcher_dir: None,
            output_dir: PathBuf::from("."),
            jobs: num_cpus(),
            keep_going: false,
        }
    }
}

impl ConversionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(e.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values a conversion cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.matrix.is_empty() {
            return Err(Error::Config("matrix must not be empty".to_string()));
        }
        if self.python_versions.is_empty() {
            return Err(Error::Config("python_versions must not be empty".to_string()));
        }
        for version in &self.python_versions {
            let valid = version
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
            if !valid {
                return Err(Error::Config(format!("invalid python version: {:?}", version)));
            }
        }
        if self.prefix_placeholder.is_empty() || self.prefix_placeholder.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "invalid prefix placeholder: {:?}",
                self.prefix_placeholder
            )));
        }
        if self.jobs == 0 {
            return Err(Error::Config("jobs must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Set the output directory
    pub fn with_output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = path.into();
        self
    }

    /// Set the launcher stub directory
    pub fn with_launcher_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.launcher_dir = Some(path.into());
        self
    }

    /// Set number of parallel builds
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Continue after a failed target
    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Replace the platform matrix
    pub fn with_matrix(mut self, matrix: Vec<MatrixEntry>) -> Self {
        self.matrix = matrix;
        self
    }

    /// Replace the Python candidates
    pub fn with_python_versions<I, S>(mut self, versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.python_versions = versions.into_iter().map(Into::into).collect();
        self
    }

    /// Per-build options derived from this config
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            placeholder: self.prefix_placeholder.clone(),
            build_number: self.build_number,
            mtime: source_date_epoch(),
        }
    }

    /// Launcher stub source for Windows targets
    ///
    /// A configured `launcher_dir` is used as is; otherwise the default
    /// install locations are searched.
    pub fn launcher_provider(&self) -> Box<dyn LauncherProvider> {
        match &self.launcher_dir {
            Some(dir) => Box::new(DirectoryLauncherProvider::new(dir)),
            None => Box::new(SearchLauncherProvider::from_env()),
        }
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}
