// src/conda/platform.rs

//! Target platforms and their install layouts
//!
//! Every platform-dependent decision goes through [`PlatformLayout`]: where
//! site-packages lives, where scripts go, how deep site-packages sits below
//! the install root, and which launcher artifacts an entry point needs.

use crate::conda::launcher::{self, LauncherArtifact, LauncherProvider};
use crate::error::{Error, Result};
use crate::wheel::EntryPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating system family of a conda subdir
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Osx,
    #[serde(rename = "win", alias = "windows")]
    Windows,
}

impl Platform {
    /// Short name used in subdirs and index.json
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Osx => "osx",
            Self::Windows => "win",
        }
    }

    /// Layout capabilities for this platform
    pub fn layout(&self) -> &'static dyn PlatformLayout {
        match self {
            Self::Linux | Self::Osx => &UnixLayout,
            Self::Windows => &WindowsLayout,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linux" => Ok(Self::Linux),
            "osx" => Ok(Self::Osx),
            "win" | "windows" => Ok(Self::Windows),
            other => Err(Error::Config(format!("unknown platform: {}", other))),
        }
    }
}

/// Pointer width of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Bitness {
    Bits32,
    Bits64,
}

impl Bitness {
    pub fn bits(&self) -> u32 {
        match self {
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// Architecture string for index.json
    pub fn arch(&self) -> &'static str {
        match self {
            Self::Bits32 => "x86",
            Self::Bits64 => "x86_64",
        }
    }
}

impl TryFrom<u32> for Bitness {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            other => Err(Error::Config(format!("unsupported bitness: {}", other))),
        }
    }
}

impl From<Bitness> for u32 {
    fn from(b: Bitness) -> u32 {
        b.bits()
    }
}

impl fmt::Display for Bitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

/// Platform-specific install layout
pub trait PlatformLayout: Send + Sync {
    /// site-packages relative to the install root, with trailing slash
    fn site_packages(&self, python_version: &str) -> String;

    /// Scripts directory relative to the install root, with trailing slash
    fn scripts_dir(&self) -> &'static str;

    /// Prefix that climbs from site-packages back to the install root
    fn record_prefix(&self) -> &'static str;

    /// Launcher artifacts for one console script
    fn launchers(
        &self,
        entry_point: &EntryPoint,
        bitness: Bitness,
        placeholder: &str,
        stubs: &dyn LauncherProvider,
    ) -> Result<Vec<LauncherArtifact>>;
}

/// Linux and macOS: `lib/pythonX.Y/site-packages`, `bin/`
#[derive(Debug, Clone, Copy)]
pub struct UnixLayout;

impl PlatformLayout for UnixLayout {
    fn site_packages(&self, python_version: &str) -> String {
        format!("lib/python{}/site-packages/", python_version)
    }

    fn scripts_dir(&self) -> &'static str {
        "bin/"
    }

    fn record_prefix(&self) -> &'static str {
        "../../../"
    }

    fn launchers(
        &self,
        entry_point: &EntryPoint,
        _bitness: Bitness,
        placeholder: &str,
        _stubs: &dyn LauncherProvider,
    ) -> Result<Vec<LauncherArtifact>> {
        Ok(vec![launcher::synthesize_unix(entry_point, placeholder)?])
    }
}

/// Windows: `Lib/site-packages`, `Scripts/`, plus an .exe per script
#[derive(Debug, Clone, Copy)]
pub struct WindowsLayout;

impl PlatformLayout for WindowsLayout {
    fn site_packages(&self, _python_version: &str) -> String {
        "Lib/site-packages/".to_string()
    }

    fn scripts_dir(&self) -> &'static str {
        "Scripts/"
    }

    fn record_prefix(&self) -> &'static str {
        "../../"
    }

    fn launchers(
        &self,
        entry_point: &EntryPoint,
        bitness: Bitness,
        placeholder: &str,
        stubs: &dyn LauncherProvider,
    ) -> Result<Vec<LauncherArtifact>> {
        launcher::synthesize_windows(entry_point, bitness, placeholder, stubs)
    }
}
