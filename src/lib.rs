// src/lib.rs

//! wheel2conda
//!
//! Converts a pure-Python wheel into conda packages for a matrix of
//! platforms, pointer widths and Python versions.
//!
//! # Architecture
//!
//! - `wheel`: extraction, validation and metadata of the source wheel
//! - `conda`: install layout per platform, launchers, manifests and the
//!   package builder
//! - `driver`: build matrix, worker pool and failure policy

pub mod compression;
pub mod conda;
pub mod config;
pub mod driver;
mod error;
pub mod filesystem;
pub mod hash;
pub mod wheel;

pub use conda::{BuildOptions, BuildReport, BuildTarget, Bitness, LauncherProvider, Platform};
pub use config::{ConversionConfig, MatrixEntry};
pub use driver::{ConversionSummary, convert, convert_wheel};
pub use error::{Error, Result};
pub use hash::{HashAlgorithm, Hasher, RecordHash};
pub use wheel::Wheel;
