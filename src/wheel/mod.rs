// src/wheel/mod.rs

//! Wheel source archives
//!
//! A wheel is a zip file laid out as it will be installed into
//! site-packages:
//!
//! ```text
//! pkgmod/__init__.py
//! Foo-1.0.data/data/share/foo.txt     (optional, install-root relative)
//! Foo-1.0.dist-info/METADATA
//! Foo-1.0.dist-info/WHEEL
//! Foo-1.0.dist-info/RECORD
//! Foo-1.0.dist-info/entry_points.txt  (optional)
//! ```
//!
//! [`Wheel::open`] extracts the archive to a scratch directory that lives as
//! long as the `Wheel`, then checks the layout and format before any conda
//! package is built from it.

pub mod compat;
pub mod entry_points;
pub mod metadata;
pub mod record;

pub use compat::PythonLine;
pub use entry_points::EntryPoint;
pub use metadata::Metadata;
pub use record::RecordRow;

use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_filename;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Suffix of the metadata directory
pub const DIST_INFO_SUFFIX: &str = ".dist-info";
/// Suffix of the optional data directory
pub const DATA_SUFFIX: &str = ".data";
/// The only wheel format version we convert
pub const SUPPORTED_WHEEL_VERSION: &str = "1.0";

/// An extracted, validated wheel
///
/// Shared read-only by every build target derived from it.
#[derive(Debug)]
pub struct Wheel {
    source: PathBuf,
    extracted: TempDir,
    entries: Vec<String>,
    dist_info: String,
    data_dir: Option<String>,
    metadata: Metadata,
    wheel_info: Metadata,
}

impl Wheel {
    /// Extract and validate a wheel file
    pub fn open(path: &Path) -> Result<Self> {
        let extracted = TempDir::new()?;
        extract(path, extracted.path())?;
        debug!("Extracted {} to {}", path.display(), extracted.path().display());

        let entries = top_level_entries(extracted.path())?;
        let (dist_info, data_dir) = locate_special_dirs(extracted.path(), &entries)?;

        let dist_info_path = extracted.path().join(&dist_info);
        let metadata = read_required_record(&dist_info_path, "METADATA")?;
        let wheel_info = read_required_record(&dist_info_path, "WHEEL")?;

        let wheel = Self {
            source: path.to_path_buf(),
            extracted,
            entries,
            dist_info,
            data_dir,
            metadata,
            wheel_info,
        };
        wheel.validate()?;

        info!(
            "Opened wheel {} {} ({})",
            wheel.name(),
            wheel.version(),
            path.display()
        );
        Ok(wheel)
    }

    /// Check the WHEEL format record and required METADATA fields
    pub fn validate(&self) -> Result<()> {
        let version = self.wheel_info.get("Wheel-Version").ok_or_else(|| {
            Error::UnsupportedFormat(format!("{}/WHEEL has no Wheel-Version", self.dist_info))
        })?;
        if version != SUPPORTED_WHEEL_VERSION {
            return Err(Error::UnsupportedFormat(format!(
                "Wheel-Version {} (only {} is supported)",
                version, SUPPORTED_WHEEL_VERSION
            )));
        }

        let purelib = self.wheel_info.get("Root-Is-Purelib").unwrap_or("false");
        if !purelib.eq_ignore_ascii_case("true") {
            return Err(Error::UnsupportedFormat(format!(
                "Root-Is-Purelib is {:?}; platform-specific wheels are not supported",
                purelib
            )));
        }

        // Both end up in the package file name
        for field in ["Name", "Version"] {
            let value = self.metadata.require(field)?;
            sanitize_filename(value).map_err(|e| {
                Error::Structural(format!("METADATA {} {:?} is not usable: {}", field, value, e))
            })?;
        }

        if !self.record_path().is_file() {
            return Err(Error::Structural(format!(
                "{}/RECORD is missing",
                self.dist_info
            )));
        }

        Ok(())
    }

    /// Path of the original wheel file
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Root of the extracted tree
    pub fn root(&self) -> &Path {
        self.extracted.path()
    }

    /// Top-level entry names, sorted
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Name of the `.dist-info` directory
    pub fn dist_info(&self) -> &str {
        &self.dist_info
    }

    /// Name of the `.data` directory, if any
    pub fn data_dir(&self) -> Option<&str> {
        self.data_dir.as_deref()
    }

    /// Parsed METADATA
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Parsed WHEEL
    pub fn wheel_info(&self) -> &Metadata {
        &self.wheel_info
    }

    /// Package name from METADATA
    pub fn name(&self) -> &str {
        self.metadata.get("Name").unwrap_or_default()
    }

    /// Package version from METADATA
    pub fn version(&self) -> &str {
        self.metadata.get("Version").unwrap_or_default()
    }

    /// Absolute path of the RECORD file
    pub fn record_path(&self) -> PathBuf {
        self.root().join(&self.dist_info).join("RECORD")
    }

    /// Rows of the wheel's own RECORD
    pub fn record(&self) -> Result<Vec<RecordRow>> {
        record::read_record(&self.record_path())
    }

    /// Ordered console_scripts declarations, empty without entry_points.txt
    pub fn console_scripts(&self) -> Result<Vec<(String, String)>> {
        let path = self.root().join(&self.dist_info).join("entry_points.txt");
        match fs::read_to_string(&path) {
            Ok(content) => entry_points::parse_console_scripts(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Subset of `candidates` this wheel declares support for, in candidate order
    pub fn compatible_python_versions(&self, candidates: &[String]) -> Vec<String> {
        let line = compat::python_line(&self.metadata, &self.wheel_info);
        compat::filter_compatible(line, candidates)
    }
}

/// Extract a zip archive, refusing entries that escape `dest`
///
/// Any entry that cannot be written out is reported as a corrupt archive
/// naming that entry.
fn extract(path: &Path, dest: &Path) -> Result<()> {
    let corrupt = |reason: String| Error::CorruptArchive {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| corrupt(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| corrupt(format!("entry {}: {}", i, e)))?;
        let name = entry.name().to_string();

        let relative = entry
            .enclosed_name()
            .ok_or_else(|| corrupt(format!("{}: path escapes the archive root", name)))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(|e| corrupt(format!("{}: {}", name, e)))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(|e| corrupt(format!("{}: {}", name, e)))?;
        }
        let mut out = File::create(&out_path).map_err(|e| corrupt(format!("{}: {}", name, e)))?;
        io::copy(&mut entry, &mut out).map_err(|e| corrupt(format!("{}: {}", name, e)))?;
    }

    Ok(())
}

fn top_level_entries(root: &Path) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(root)? {
        let name = entry?.file_name();
        let name = name.to_str().ok_or_else(|| {
            Error::InvalidPath(format!("non UTF-8 entry name {:?}", name))
        })?;
        entries.push(name.to_string());
    }
    entries.sort();
    Ok(entries)
}

/// Find the single `.dist-info` directory and the optional `.data` directory
fn locate_special_dirs(root: &Path, entries: &[String]) -> Result<(String, Option<String>)> {
    let dist_infos: Vec<&String> = entries
        .iter()
        .filter(|e| e.ends_with(DIST_INFO_SUFFIX))
        .collect();
    let data_dirs: Vec<&String> = entries.iter().filter(|e| e.ends_with(DATA_SUFFIX)).collect();

    let dist_info = match dist_infos.as_slice() {
        [] => return Err(Error::Structural("No .dist-info directory found".to_string())),
        [one] => (*one).clone(),
        many => {
            return Err(Error::Structural(format!(
                "Multiple .dist-info directories found: {}",
                join_names(many)
            )));
        }
    };
    if !root.join(&dist_info).is_dir() {
        return Err(Error::Structural(format!("{} is not a directory", dist_info)));
    }

    let data_dir = match data_dirs.as_slice() {
        [] => None,
        [one] => Some((*one).clone()),
        many => {
            return Err(Error::Structural(format!(
                "Multiple .data directories found: {}",
                join_names(many)
            )));
        }
    };
    if let Some(data) = &data_dir
        && !root.join(data).is_dir()
    {
        return Err(Error::Structural(format!("{} is not a directory", data)));
    }

    Ok((dist_info, data_dir))
}

fn join_names(names: &[&String]) -> String {
    names
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_required_record(dist_info: &Path, file: &str) -> Result<Metadata> {
    let path = dist_info.join(file);
    if !path.is_file() {
        return Err(Error::Structural(format!(
            "{} is missing from {}",
            file,
            dist_info
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        )));
    }
    Metadata::from_file(&path)
}
