// src/conda/launcher.rs

//! Console script launchers
//!
//! Unix gets a single Python script whose shebang points at the install
//! prefix placeholder; conda rewrites it at install time. Windows gets the
//! same script as `{name}-script.py` next to a native `{name}.exe` stub that
//! runs it. The stub is supplied by a [`LauncherProvider`]: a configured
//! directory, or else a search of the usual install locations.

use crate::conda::platform::Bitness;
use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_filename;
use crate::wheel::EntryPoint;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A generated file destined for the scripts directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherArtifact {
    /// File name within the scripts directory
    pub file_name: String,
    pub content: Vec<u8>,
    /// Content embeds the install prefix placeholder
    pub has_prefix: bool,
    /// Installed with the executable bit
    pub executable: bool,
}

/// Source of pre-built Windows launcher executables
pub trait LauncherProvider: Send + Sync {
    /// Launcher executable bytes for a pointer width
    fn stub(&self, bitness: Bitness) -> Result<Vec<u8>>;
}

impl<F> LauncherProvider for F
where
    F: Fn(Bitness) -> Result<Vec<u8>> + Send + Sync,
{
    fn stub(&self, bitness: Bitness) -> Result<Vec<u8>> {
        self(bitness)
    }
}

/// File name of the stub for a pointer width
pub fn stub_file_name(bitness: Bitness) -> &'static str {
    match bitness {
        Bitness::Bits32 => "cli-32.exe",
        Bitness::Bits64 => "cli-64.exe",
    }
}

/// Reads `cli-64.exe` / `cli-32.exe` from a directory
#[derive(Debug, Clone)]
pub struct DirectoryLauncherProvider {
    dir: PathBuf,
}

impl DirectoryLauncherProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LauncherProvider for DirectoryLauncherProvider {
    fn stub(&self, bitness: Bitness) -> Result<Vec<u8>> {
        let path = self.dir.join(stub_file_name(bitness));
        std::fs::read(&path).map_err(|e| Error::LauncherUnavailable {
            arch: bitness.arch().to_string(),
            reason: format!("{}: {}", path.display(), e),
        })
    }
}

/// Environment variable naming a launcher directory
pub const LAUNCHER_DIR_ENV: &str = "WHEEL2CONDA_LAUNCHER_DIR";

/// Directories searched for launchers when none is configured
///
/// In order: `$WHEEL2CONDA_LAUNCHER_DIR`, `share/wheel2conda/launchers`
/// and `launchers/` next to the running executable, then the system-wide
/// `/usr/share/wheel2conda/launchers`.
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Some(dir) = std::env::var_os(LAUNCHER_DIR_ENV).filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(dir));
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()));
    if let Some(exe) = exe_dir {
        dirs.push(exe.join("../share/wheel2conda/launchers"));
        dirs.push(exe.join("launchers"));
    }

    dirs.push(PathBuf::from("/usr/share/wheel2conda/launchers"));
    dirs
}

/// Looks for the stub in each directory of a search list
///
/// The first directory holding the requested stub wins, so the two widths
/// may come from different places.
#[derive(Debug, Clone)]
pub struct SearchLauncherProvider {
    dirs: Vec<PathBuf>,
}

impl SearchLauncherProvider {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// Provider over [`default_search_dirs`]
    pub fn from_env() -> Self {
        Self::new(default_search_dirs())
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl LauncherProvider for SearchLauncherProvider {
    fn stub(&self, bitness: Bitness) -> Result<Vec<u8>> {
        let name = stub_file_name(bitness);
        for dir in &self.dirs {
            let path = dir.join(name);
            if path.is_file() {
                debug!("Using launcher {}", path.display());
                return std::fs::read(&path).map_err(|e| Error::LauncherUnavailable {
                    arch: bitness.arch().to_string(),
                    reason: format!("{}: {}", path.display(), e),
                });
            }
        }

        let searched: Vec<String> = self.dirs.iter().map(|d| d.display().to_string()).collect();
        Err(Error::LauncherUnavailable {
            arch: bitness.arch().to_string(),
            reason: format!(
                "{} not found; set {} or pass --launcher-dir (searched: {})",
                name,
                LAUNCHER_DIR_ENV,
                searched.join(", ")
            ),
        })
    }
}

/// Provider that never has a stub
///
/// Unix targets never ask for a stub; Windows targets with console scripts
/// fail with [`Error::LauncherUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLauncherProvider;

impl LauncherProvider for NoLauncherProvider {
    fn stub(&self, bitness: Bitness) -> Result<Vec<u8>> {
        Err(Error::LauncherUnavailable {
            arch: bitness.arch().to_string(),
            reason: "no launcher source available".to_string(),
        })
    }
}

/// Text of a launcher script
pub fn script_content(entry_point: &EntryPoint, placeholder: &str) -> String {
    format!(
        "#!{prefix}/bin/python\nfrom {module} import {func}\nif __name__ == '__main__':\n    {func}()\n",
        prefix = placeholder,
        module = entry_point.module,
        func = entry_point.function,
    )
}

/// Unix launcher: one executable script named after the entry point
pub fn synthesize_unix(entry_point: &EntryPoint, placeholder: &str) -> Result<LauncherArtifact> {
    let file_name = sanitize_filename(&entry_point.name)?;
    debug!("Synthesizing unix launcher {}", file_name);

    Ok(LauncherArtifact {
        file_name,
        content: script_content(entry_point, placeholder).into_bytes(),
        has_prefix: true,
        executable: true,
    })
}

/// Windows launchers: `{name}-script.py` plus `{name}.exe`
pub fn synthesize_windows(
    entry_point: &EntryPoint,
    bitness: Bitness,
    placeholder: &str,
    stubs: &dyn LauncherProvider,
) -> Result<Vec<LauncherArtifact>> {
    let name = sanitize_filename(&entry_point.name)?;
    debug!("Synthesizing windows launcher {} ({})", name, bitness.arch());

    let exe = stubs.stub(bitness)?;

    Ok(vec![
        LauncherArtifact {
            file_name: format!("{}-script.py", name),
            content: script_content(entry_point, placeholder).into_bytes(),
            has_prefix: true,
            executable: false,
        },
        LauncherArtifact {
            file_name: format!("{}.exe", name),
            content: exe,
            has_prefix: false,
            executable: false,
        },
    ])
}
