// src/conda/mod.rs

//! Conda package generation
//!
//! Turns an extracted [`Wheel`](crate::wheel::Wheel) into `.tar.bz2` conda
//! packages, one per [`BuildTarget`].

pub mod builder;
pub mod launcher;
pub mod manifest;
pub mod paths;
pub mod plan;
pub mod platform;
pub mod target;

pub use builder::{BuildOptions, BuildReport, BuildState, PackageBuilder, build_package};
pub use launcher::{
    DirectoryLauncherProvider, LauncherProvider, NoLauncherProvider, SearchLauncherProvider,
};
pub use manifest::{IndexJson, ManifestWriter};
pub use platform::{Bitness, Platform, PlatformLayout};
pub use target::BuildTarget;
