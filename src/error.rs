// src/error.rs

//! Error types for wheel conversion

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading a wheel or building conda packages
#[derive(Error, Debug)]
pub enum Error {
    /// The wheel could not be opened or extracted
    #[error("Corrupt wheel archive {path}: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    /// The wheel layout violates a structural invariant
    #[error("Invalid wheel structure: {0}")]
    Structural(String),

    /// Wheel format version or layout we do not convert
    #[error("Unsupported wheel: {0}")]
    UnsupportedFormat(String),

    /// A console_scripts entry point is not `module:function`
    #[error("Bad entry point for script '{name}': {value:?}")]
    MalformedEntryPoint { name: String, value: String },

    /// A `.data` subdirectory other than `data/`
    #[error("Unsupported data directory layout: {0} under .data directory")]
    UnsupportedDataLayout(String),

    /// No launcher executable available for a Windows build
    #[error("Windows launcher stub unavailable for {arch}: {reason}")]
    LauncherUnavailable { arch: String, reason: String },

    /// Path from the archive tries to escape its root
    #[error("Path traversal rejected: {0}")]
    PathTraversal(String),

    /// Path that cannot be represented in the output archive
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Build steps were invoked out of order
    #[error("Build step {step} called in state {state}")]
    BuildOrder {
        step: &'static str,
        state: &'static str,
    },

    /// Invalid configuration file or value
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for errors that invalidate the wheel itself rather than one build target
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::CorruptArchive { .. } | Self::Structural(_) | Self::UnsupportedFormat(_)
        )
    }
}
