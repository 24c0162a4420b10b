// src/conda/target.rs

use crate::conda::platform::{Bitness, Platform, PlatformLayout};
use std::fmt;

/// One (platform, bitness, python) combination producing one package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildTarget {
    pub platform: Platform,
    pub bitness: Bitness,
    pub python_version: String,
}

impl BuildTarget {
    pub fn new(platform: Platform, bitness: Bitness, python_version: impl Into<String>) -> Self {
        Self {
            platform,
            bitness,
            python_version: python_version.into(),
        }
    }

    /// Conda subdir, e.g. `linux-64`
    pub fn subdir(&self) -> String {
        format!("{}-{}", self.platform, self.bitness)
    }

    /// Build string, e.g. `py35_0`
    pub fn build_string(&self, build_number: u32) -> String {
        format!("py{}_{}", self.python_version.replace('.', ""), build_number)
    }

    pub fn layout(&self) -> &'static dyn PlatformLayout {
        self.platform.layout()
    }

    /// site-packages for this target's Python
    pub fn site_packages(&self) -> String {
        self.layout().site_packages(&self.python_version)
    }

    /// Package file name for a name/version pair
    pub fn package_filename(&self, name: &str, version: &str, build_number: u32) -> String {
        format!("{}-{}-{}.tar.bz2", name, version, self.build_string(build_number))
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} py{}", self.subdir(), self.python_version)
    }
}
