// src/conda/builder.rs

//! Conda package builder
//!
//! Builds one `.tar.bz2` package for one [`BuildTarget`]. The steps run in a
//! fixed order:
//!
//! ```text
//! Init -> ModulesCopied -> ScriptsCreated -> RecordWritten
//!      -> IndexWritten -> PrefixListWritten -> FileListWritten -> Done
//! ```
//!
//! Calling a step out of order is an [`Error::BuildOrder`]. A step that
//! returns an error moves the builder to [`BuildState::Failed`], after which
//! every step is rejected. [`build_package`] writes to a temporary file that
//! is only moved into place once the package is complete.

use crate::compression::{CompressionFormat, Encoder, create_encoder};
use crate::conda::launcher::LauncherProvider;
use crate::conda::manifest::{self, FILES_PATH, HAS_PREFIX_PATH, INDEX_PATH, ManifestWriter};
use crate::conda::plan::{self, FileSource, PlannedFile};
use crate::conda::target::BuildTarget;
use crate::error::{Error, Result};
use crate::filesystem::path::join_archive;
use crate::wheel::{RecordRow, Wheel, record};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Default install prefix placeholder, replaced by conda at install time
pub const DEFAULT_PLACEHOLDER: &str = "/opt/anaconda1anaconda2anaconda3";

/// Build step reached by a [`PackageBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildState {
    Init,
    ModulesCopied,
    ScriptsCreated,
    RecordWritten,
    IndexWritten,
    PrefixListWritten,
    FileListWritten,
    Done,
    /// A step returned an error; no further step is accepted
    Failed,
}

impl BuildState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::ModulesCopied => "ModulesCopied",
            Self::ScriptsCreated => "ScriptsCreated",
            Self::RecordWritten => "RecordWritten",
            Self::IndexWritten => "IndexWritten",
            Self::PrefixListWritten => "PrefixListWritten",
            Self::FileListWritten => "FileListWritten",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values shared by every build of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Install prefix placeholder embedded in launchers
    pub placeholder: String,
    /// Build number in the build string and index.json
    pub build_number: u32,
    /// Modification time stamped on every archive entry
    pub mtime: u64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            build_number: 0,
            mtime: source_date_epoch(),
        }
    }
}

/// Entry mtime from `SOURCE_DATE_EPOCH`, or 0
pub fn source_date_epoch() -> u64 {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0)
}

/// Counts gathered while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManifestSummary {
    /// Paths listed in `info/files`
    pub file_count: usize,
    /// Paths listed in `info/has_prefix`
    pub prefix_count: usize,
}

/// Streams one package into a bzip2-compressed tar
pub struct PackageBuilder<'a, W: Write> {
    wheel: &'a Wheel,
    target: &'a BuildTarget,
    options: &'a BuildOptions,
    stubs: &'a dyn LauncherProvider,
    archive: tar::Builder<Encoder<W>>,
    manifest: ManifestWriter,
    synthetic_rows: Vec<RecordRow>,
    state: BuildState,
}

impl<'a, W: Write> PackageBuilder<'a, W> {
    pub fn new(
        wheel: &'a Wheel,
        target: &'a BuildTarget,
        options: &'a BuildOptions,
        stubs: &'a dyn LauncherProvider,
        writer: W,
    ) -> Self {
        let encoder = create_encoder(writer, CompressionFormat::Bzip2);
        Self {
            wheel,
            target,
            options,
            stubs,
            archive: tar::Builder::new(encoder),
            manifest: ManifestWriter::new(options.placeholder.clone()),
            synthetic_rows: Vec::new(),
            state: BuildState::Init,
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn manifest(&self) -> &ManifestWriter {
        &self.manifest
    }

    fn advance(&mut self, to: BuildState) {
        debug!("{}: {} -> {}", self.target, self.state, to);
        self.state = to;
    }

    /// Run one step from `expected` to `to`, marking the builder failed on error
    fn step<F>(&mut self, expected: BuildState, to: BuildState, name: &'static str, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.check(expected, name)?;
        if let Err(e) = body(self) {
            debug!("{}: {} failed in state {}", self.target, name, self.state);
            self.state = BuildState::Failed;
            return Err(e);
        }
        self.advance(to);
        Ok(())
    }

    /// Copy module files, the `.data` tree and `.dist-info` (minus RECORD)
    pub fn copy_modules(&mut self) -> Result<()> {
        self.step(BuildState::Init, BuildState::ModulesCopied, "copy_modules", |b| {
            for file in plan::plan_modules(b.wheel, b.target)? {
                b.place(&file)?;
            }
            Ok(())
        })
    }

    /// Write launchers for every console script
    pub fn create_scripts(&mut self) -> Result<()> {
        self.step(BuildState::ModulesCopied, BuildState::ScriptsCreated, "create_scripts", |b| {
            let scripts = plan::plan_scripts(b.wheel, b.target, &b.options.placeholder, b.stubs)?;
            for file in &scripts.files {
                b.place(file)?;
            }
            b.synthetic_rows = scripts.record_rows;
            Ok(())
        })
    }

    /// Write the rewritten RECORD into the `.dist-info` directory
    pub fn write_record(&mut self) -> Result<()> {
        self.step(BuildState::ScriptsCreated, BuildState::RecordWritten, "write_record", |b| {
            let rows = manifest::rewrite_record(
                &b.wheel.record()?,
                &b.synthetic_rows,
                b.target,
                b.wheel.data_dir(),
            )?;
            let content = record::write_record(&rows);

            let dist_info = join_archive(&b.target.site_packages(), b.wheel.dist_info())?;
            let path = join_archive(&dist_info, "RECORD")?;
            b.append(&path, content.as_bytes(), false)?;
            b.manifest.record_file(path, false);
            Ok(())
        })
    }

    /// Write `info/index.json`
    pub fn write_index(&mut self) -> Result<()> {
        self.step(BuildState::RecordWritten, BuildState::IndexWritten, "write_index", |b| {
            let index = manifest::emit_index(b.wheel.metadata(), b.target, b.options.build_number)?;
            b.append(INDEX_PATH, index.as_bytes(), false)
        })
    }

    /// Write `info/has_prefix`
    pub fn write_prefix_list(&mut self) -> Result<()> {
        self.step(BuildState::IndexWritten, BuildState::PrefixListWritten, "write_prefix_list", |b| {
            let content = b.manifest.emit_prefix_list();
            b.append(HAS_PREFIX_PATH, content.as_bytes(), false)
        })
    }

    /// Write `info/files`
    pub fn write_file_list(&mut self) -> Result<()> {
        self.step(BuildState::PrefixListWritten, BuildState::FileListWritten, "write_file_list", |b| {
            let content = b.manifest.emit_file_list();
            b.append(FILES_PATH, content.as_bytes(), false)
        })
    }

    /// Close the tar and compression streams, returning the inner writer
    pub fn finish(mut self) -> Result<(W, ManifestSummary)> {
        self.check(BuildState::FileListWritten, "finish")?;
        self.advance(BuildState::Done);

        let summary = ManifestSummary {
            file_count: self.manifest.len(),
            prefix_count: self.manifest.prefix_count(),
        };
        let encoder = self.archive.into_inner()?;
        let writer = encoder.finish()?;
        Ok((writer, summary))
    }

    /// Run every step in order
    pub fn build(mut self) -> Result<(W, ManifestSummary)> {
        self.copy_modules()?;
        self.create_scripts()?;
        self.write_record()?;
        self.write_index()?;
        self.write_prefix_list()?;
        self.write_file_list()?;
        self.finish()
    }

    fn check(&self, expected: BuildState, step: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::BuildOrder {
                step,
                state: self.state.as_str(),
            })
        }
    }

    fn place(&mut self, file: &PlannedFile) -> Result<()> {
        match &file.source {
            FileSource::Path(path) => {
                let content = fs::read(path)?;
                self.append(&file.archive_path, &content, file.executable)?;
            }
            FileSource::Bytes(content) => {
                self.append(&file.archive_path, content, file.executable)?;
            }
        }
        self.manifest
            .record_file(file.archive_path.clone(), file.has_prefix);
        Ok(())
    }

    fn append(&mut self, path: &str, content: &[u8], executable: bool) -> Result<()> {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(if executable { 0o755 } else { 0o644 });
        header.set_uid(0);
        header.set_gid(0);
        header.set_size(content.len() as u64);
        header.set_mtime(self.options.mtime);
        header.set_cksum();

        self.archive.append_data(&mut header, path, content)?;
        Ok(())
    }
}

/// Result of one successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub target: BuildTarget,
    /// Final package path
    pub output: PathBuf,
    /// Size of the package in bytes
    pub size: u64,
    pub file_count: usize,
    pub prefix_count: usize,
}

/// Build one package into `{output_dir}/{subdir}/`
///
/// The package is assembled in a temporary file in the destination directory
/// and renamed into place only after every step succeeded.
pub fn build_package(
    wheel: &Wheel,
    target: &BuildTarget,
    options: &BuildOptions,
    stubs: &dyn LauncherProvider,
    output_dir: &Path,
) -> Result<BuildReport> {
    let dest_dir = output_dir.join(target.subdir());
    fs::create_dir_all(&dest_dir)?;

    let filename = target.package_filename(wheel.name(), wheel.version(), options.build_number);
    let output = dest_dir.join(&filename);
    info!("Building {} for {}", filename, target);

    let temp = NamedTempFile::new_in(&dest_dir)?;
    let builder = PackageBuilder::new(wheel, target, options, stubs, temp);
    let (temp, summary) = builder.build()?;

    temp.as_file().sync_all()?;
    let size = temp.as_file().metadata()?.len();
    temp.persist(&output).map_err(|e| Error::Io(e.error))?;

    info!(
        "Wrote {} ({} files, {} bytes)",
        output.display(),
        summary.file_count,
        size
    );

    Ok(BuildReport {
        target: target.clone(),
        output,
        size,
        file_count: summary.file_count,
        prefix_count: summary.prefix_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conda::launcher::NoLauncherProvider;
    use crate::conda::platform::{Bitness, Platform};
    use std::io::Write as _;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn minimal_wheel(dir: &Path) -> Wheel {
        let path = dir.join("Foo-1.0-py3-none-any.whl");
        let mut zip = zip::ZipWriter::new(fs::File::create(&path).unwrap());
        for (name, content) in [
            ("pkgmod/__init__.py", "def main(): pass\n"),
            ("Foo-1.0.dist-info/METADATA", "Name: Foo\nVersion: 1.0\n"),
            ("Foo-1.0.dist-info/WHEEL", "Wheel-Version: 1.0\nRoot-Is-Purelib: true\n"),
            ("Foo-1.0.dist-info/RECORD", "pkgmod/__init__.py,,\nFoo-1.0.dist-info/RECORD,,\n"),
            ("Foo-1.0.dist-info/entry_points.txt", "[console_scripts]\nfoo = pkgmod:main\n"),
        ] {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
        Wheel::open(&path).unwrap()
    }

    fn options() -> BuildOptions {
        BuildOptions {
            mtime: 0,
            ..BuildOptions::default()
        }
    }

    #[test]
    fn test_steps_in_order() {
        let tmp = TempDir::new().unwrap();
        let wheel = minimal_wheel(tmp.path());
        let target = BuildTarget::new(Platform::Linux, Bitness::Bits64, "3.5");
        let options = options();

        let mut builder = PackageBuilder::new(&wheel, &target, &options, &NoLauncherProvider, Vec::new());
        assert_eq!(builder.state(), BuildState::Init);
        builder.copy_modules().unwrap();
        assert_eq!(builder.state(), BuildState::ModulesCopied);
        builder.create_scripts().unwrap();
        builder.write_record().unwrap();
        builder.write_index().unwrap();
        builder.write_prefix_list().unwrap();
        builder.write_file_list().unwrap();
        assert_eq!(builder.state(), BuildState::FileListWritten);

        let (bytes, summary) = builder.finish().unwrap();
        assert_eq!(CompressionFormat::from_magic_bytes(&bytes), CompressionFormat::Bzip2);
        assert_eq!(summary.prefix_count, 1);
        // __init__.py, METADATA, WHEEL, entry_points.txt, bin/foo, RECORD
        assert_eq!(summary.file_count, 6);
    }

    #[test]
    fn test_out_of_order_step_rejected() {
        let tmp = TempDir::new().unwrap();
        let wheel = minimal_wheel(tmp.path());
        let target = BuildTarget::new(Platform::Linux, Bitness::Bits64, "3.5");
        let options = options();

        let mut builder = PackageBuilder::new(&wheel, &target, &options, &NoLauncherProvider, Vec::new());
        let err = builder.write_record().unwrap_err();
        assert!(matches!(
            err,
            Error::BuildOrder { step: "write_record", state: "Init" }
        ));

        builder.copy_modules().unwrap();
        assert!(builder.copy_modules().is_err());
    }

    #[test]
    fn test_failed_step_poisons_builder() {
        let tmp = TempDir::new().unwrap();
        let wheel = minimal_wheel(tmp.path());
        let target = BuildTarget::new(Platform::Windows, Bitness::Bits64, "3.5");
        let options = options();

        let mut builder = PackageBuilder::new(&wheel, &target, &options, &NoLauncherProvider, Vec::new());
        builder.copy_modules().unwrap();
        let files_before = builder.manifest().len();

        let err = builder.create_scripts().unwrap_err();
        assert!(matches!(err, Error::LauncherUnavailable { .. }));
        assert_eq!(builder.state(), BuildState::Failed);

        for err in [
            builder.create_scripts().unwrap_err(),
            builder.copy_modules().unwrap_err(),
            builder.write_record().unwrap_err(),
        ] {
            assert!(matches!(err, Error::BuildOrder { state: "Failed", .. }));
        }
        assert_eq!(builder.manifest().len(), files_before);
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_build_package_output_name() {
        let tmp = TempDir::new().unwrap();
        let wheel = minimal_wheel(tmp.path());
        let target = BuildTarget::new(Platform::Osx, Bitness::Bits64, "3.4");
        let out = tmp.path().join("out");

        let report =
            build_package(&wheel, &target, &options(), &NoLauncherProvider, &out).unwrap();
        assert_eq!(report.output, out.join("osx-64/Foo-1.0-py34_0.tar.bz2"));
        assert!(report.output.is_file());
        assert_eq!(report.size, fs::metadata(&report.output).unwrap().len());
    }

    #[test]
    fn test_failed_build_leaves_no_output() {
        let tmp = TempDir::new().unwrap();
        let wheel = minimal_wheel(tmp.path());
        let target = BuildTarget::new(Platform::Windows, Bitness::Bits64, "3.5");
        let out = tmp.path().join("out");

        let err = build_package(&wheel, &target, &options(), &NoLauncherProvider, &out).unwrap_err();
        assert!(matches!(err, Error::LauncherUnavailable { .. }));

        let leftovers: Vec<_> = fs::read_dir(out.join("win-64")).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
