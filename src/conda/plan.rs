// src/conda/plan.rs

//! File placement for one build target
//!
//! Computes where every file of a wheel lands in a conda package without
//! touching an archive, so the mapping can be inspected on its own. The
//! builder then streams the plan into the tarball and the manifest.

use crate::conda::launcher::LauncherProvider;
use crate::conda::manifest::tree_entries;
use crate::conda::paths;
use crate::conda::target::BuildTarget;
use crate::error::{Error, Result};
use crate::filesystem::path::join_archive;
use crate::wheel::{DATA_SUFFIX, DIST_INFO_SUFFIX, EntryPoint, RecordRow, Wheel};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a planned file's bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSource {
    /// A file in the extracted wheel
    Path(PathBuf),
    /// Generated content
    Bytes(Vec<u8>),
}

/// One file to place in the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    /// Install-root relative archive path
    pub archive_path: String,
    pub source: FileSource,
    pub has_prefix: bool,
    pub executable: bool,
}

impl PlannedFile {
    fn copied(archive_path: String, source: PathBuf) -> Self {
        Self {
            archive_path,
            source: FileSource::Path(source),
            has_prefix: false,
            executable: false,
        }
    }
}

/// Launchers for a target plus their RECORD rows
#[derive(Debug, Clone, Default)]
pub struct ScriptPlan {
    pub files: Vec<PlannedFile>,
    /// Rows with install-root paths, re-rooted when RECORD is rewritten
    pub record_rows: Vec<RecordRow>,
}

/// Place the wheel's own files
///
/// Module entries go under site-packages, `.data/data/` contents go under
/// the install root, and the `.dist-info` directory goes under site-packages
/// without its RECORD, which is rewritten later.
pub fn plan_modules(wheel: &Wheel, target: &BuildTarget) -> Result<Vec<PlannedFile>> {
    let site_packages = paths::site_packages_root(target);
    let record = wheel.record_path();
    let mut files = Vec::new();

    for entry in wheel.entries() {
        let source = wheel.root().join(entry);

        if entry.ends_with(DATA_SUFFIX) {
            files.extend(plan_data_dir(&source)?);
            continue;
        }

        let root = join_archive(&site_packages, entry)?;
        let skip_record = entry.ends_with(DIST_INFO_SUFFIX);
        for (archive_path, file) in tree_entries(&root, &source)? {
            if skip_record && file == record {
                continue;
            }
            files.push(PlannedFile::copied(archive_path, file));
        }
    }

    debug!("{}: {} module files", target, files.len());
    Ok(files)
}

/// `.data` directory contents, only the `data` kind is supported
fn plan_data_dir(data_dir: &Path) -> Result<Vec<PlannedFile>> {
    let mut kinds: Vec<PathBuf> = fs::read_dir(data_dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    kinds.sort();

    let mut files = Vec::new();
    for kind_dir in kinds {
        let kind = kind_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if kind != paths::DATA_KIND || !kind_dir.is_dir() {
            return Err(Error::UnsupportedDataLayout(kind));
        }

        for (within, file) in tree_entries(paths::DATA_KIND, &kind_dir)? {
            let archive_path = paths::data_install_path(&within)?;
            files.push(PlannedFile::copied(archive_path, file));
        }
    }

    Ok(files)
}

/// Synthesize launchers for every console script
pub fn plan_scripts(
    wheel: &Wheel,
    target: &BuildTarget,
    placeholder: &str,
    stubs: &dyn LauncherProvider,
) -> Result<ScriptPlan> {
    let mut plan = ScriptPlan::default();

    for (name, value) in wheel.console_scripts()? {
        let entry_point = EntryPoint::parse(&name, &value)?;
        let layout = target.layout();
        let artifacts = layout.launchers(&entry_point, target.bitness, placeholder, stubs)?;

        for artifact in artifacts {
            let archive_path = paths::script_path(target, &artifact.file_name)?;
            let row = RecordRow::for_content(archive_path.clone(), &artifact.content);
            plan.record_rows.push(row);
            plan.files.push(PlannedFile {
                archive_path,
                source: FileSource::Bytes(artifact.content),
                has_prefix: artifact.has_prefix,
                executable: artifact.executable,
            });
        }
    }

    debug!("{}: {} launcher files", target, plan.files.len());
    Ok(plan)
}
