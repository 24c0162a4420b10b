// src/conda/manifest.rs

//! Package manifests
//!
//! [`ManifestWriter`] tracks every file placed in a package, in placement
//! order, and renders the conda metadata files from that list:
//!
//! - `info/files`: every installed path, in the order it was recorded
//! - `info/has_prefix`: paths that embed the install prefix placeholder
//! - `info/index.json`: package identity, rendered by [`IndexJson`]
//!
//! It also rewrites the wheel's RECORD so rows point at where files actually
//! land in the conda layout.

use crate::conda::paths;
use crate::conda::target::BuildTarget;
use crate::error::Result;
use crate::filesystem::{path::join_archive, path::to_archive_name, scan_files};
use crate::wheel::{Metadata, RecordRow};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Archive path of the package index descriptor
pub const INDEX_PATH: &str = "info/index.json";
/// Archive path of the prefix replacement list
pub const HAS_PREFIX_PATH: &str = "info/has_prefix";
/// Archive path of the installed file list
pub const FILES_PATH: &str = "info/files";

/// One file placed in the package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub path: String,
    pub has_prefix: bool,
}

/// Ordered record of the files in a package
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    placeholder: String,
    entries: Vec<ManifestEntry>,
}

impl ManifestWriter {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            entries: Vec::new(),
        }
    }

    /// Append one path
    ///
    /// Recording a path twice lists it twice.
    pub fn record_file(&mut self, path: impl Into<String>, has_prefix: bool) {
        self.entries.push(ManifestEntry {
            path: path.into(),
            has_prefix,
        });
    }

    /// Record every regular file under `source` as `root/relative/path`
    ///
    /// A regular file as `source` records `root` itself. Returns the recorded
    /// archive paths.
    pub fn record_tree(&mut self, root: &str, source: &Path) -> Result<Vec<String>> {
        let mut recorded = Vec::new();
        for (path, _) in tree_entries(root, source)? {
            self.record_file(path.clone(), false);
            recorded.push(path);
        }
        Ok(recorded)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries carrying the placeholder
    pub fn prefix_count(&self) -> usize {
        self.entries.iter().filter(|e| e.has_prefix).count()
    }

    /// Content of `info/has_prefix`
    pub fn emit_prefix_list(&self) -> String {
        self.entries
            .iter()
            .filter(|e| e.has_prefix)
            .map(|e| format!("{} text {}", self.placeholder, e.path))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Content of `info/files`, in recorded order
    pub fn emit_file_list(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.path.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Rewrite a wheel RECORD for the conda layout
///
/// Rows under the `.data/data/` directory are re-rooted to the install root;
/// other source rows pass through untouched. `synthetic` rows carry
/// install-root paths (launchers) and are appended after the climb prefix.
pub fn rewrite_record(
    source: &[RecordRow],
    synthetic: &[RecordRow],
    target: &BuildTarget,
    data_dir: Option<&str>,
) -> Result<Vec<RecordRow>> {
    let mut rows = Vec::with_capacity(source.len() + synthetic.len());

    for row in source {
        let path = paths::reroot_data_path(target, data_dir, &row.path)?;
        if path == row.path {
            rows.push(row.clone());
        } else {
            rows.push(row.with_path(path));
        }
    }

    for row in synthetic {
        rows.push(row.with_path(paths::record_install_path(target, &row.path)));
    }

    Ok(rows)
}

/// Archive path and source file for every regular file under `source`
///
/// Files map to `root/relative/path` in walk order; a regular file as
/// `source` maps to `root` itself.
pub fn tree_entries(root: &str, source: &Path) -> Result<Vec<(String, PathBuf)>> {
    if source.is_file() {
        return Ok(vec![(join_archive(root, "")?, source.to_path_buf())]);
    }

    let mut entries = Vec::new();
    for file in scan_files(source)? {
        let relative = file.strip_prefix(source).unwrap_or(&file);
        let path = join_archive(root, &to_archive_name(relative)?)?;
        entries.push((path, file));
    }
    Ok(entries)
}

/// `info/index.json`
///
/// Fields are declared in alphabetical order so the serialized keys are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexJson {
    pub arch: String,
    pub build: String,
    pub build_number: u32,
    pub depends: Vec<String>,
    pub license: String,
    pub name: String,
    pub platform: String,
    pub subdir: String,
    pub version: String,
}

impl IndexJson {
    pub fn new(metadata: &Metadata, target: &BuildTarget, build_number: u32) -> Result<Self> {
        Ok(Self {
            arch: target.bitness.arch().to_string(),
            build: target.build_string(build_number),
            build_number,
            depends: vec![format!("python {}*", target.python_version)],
            license: "UNKNOWN".to_string(),
            name: metadata.require("Name")?.to_string(),
            platform: target.platform.to_string(),
            subdir: target.subdir(),
            version: metadata.require("Version")?.to_string(),
        })
    }

    /// Pretty-printed JSON with two-space indent
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Render `info/index.json` for a target
pub fn emit_index(metadata: &Metadata, target: &BuildTarget, build_number: u32) -> Result<String> {
    IndexJson::new(metadata, target, build_number)?.to_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conda::platform::{Bitness, Platform};
    use crate::wheel::record::parse_record;
    use std::fs;
    use tempfile::TempDir;

    const PREFIX: &str = "/opt/anaconda1anaconda2anaconda3";

    fn linux() -> BuildTarget {
        BuildTarget::new(Platform::Linux, Bitness::Bits64, "3.5")
    }

    #[test]
    fn test_file_list_keeps_record_order() {
        let mut manifest = ManifestWriter::new(PREFIX);
        manifest.record_file("zeta.txt", false);
        manifest.record_file("bin/foo", true);
        manifest.record_file("alpha.txt", false);
        manifest.record_file("alpha.txt", false);

        assert_eq!(manifest.emit_file_list(), "zeta.txt\nbin/foo\nalpha.txt\nalpha.txt");
        assert_eq!(manifest.len(), 4);
    }

    #[test]
    fn test_prefix_list() {
        let mut manifest = ManifestWriter::new(PREFIX);
        manifest.record_file("lib/python3.5/site-packages/pkgmod/__init__.py", false);
        manifest.record_file("bin/foo", true);
        manifest.record_file("bin/bar", true);

        assert_eq!(
            manifest.emit_prefix_list(),
            "/opt/anaconda1anaconda2anaconda3 text bin/foo\n\
             /opt/anaconda1anaconda2anaconda3 text bin/bar"
        );
        assert_eq!(manifest.prefix_count(), 2);
    }

    #[test]
    fn test_empty_lists() {
        let manifest = ManifestWriter::new(PREFIX);
        assert_eq!(manifest.emit_prefix_list(), "");
        assert_eq!(manifest.emit_file_list(), "");
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_record_tree() {
        let tmp = TempDir::new().unwrap();
        let pkg = tmp.path().join("pkgmod");
        fs::create_dir_all(pkg.join("sub")).unwrap();
        fs::write(pkg.join("__init__.py"), "").unwrap();
        fs::write(pkg.join("sub/a.py"), "").unwrap();

        let mut manifest = ManifestWriter::new(PREFIX);
        let recorded = manifest
            .record_tree("lib/python3.5/site-packages/pkgmod", &pkg)
            .unwrap();

        assert_eq!(
            recorded,
            vec![
                "lib/python3.5/site-packages/pkgmod/__init__.py",
                "lib/python3.5/site-packages/pkgmod/sub/a.py",
            ]
        );

        let single = tmp.path().join("six.py");
        fs::write(&single, "").unwrap();
        let recorded = manifest.record_tree("./lib/six.py", &single).unwrap();
        assert_eq!(recorded, vec!["lib/six.py"]);

        let entries = tree_entries("pkgmod", &pkg).unwrap();
        assert_eq!(entries[1], ("pkgmod/sub/a.py".to_string(), pkg.join("sub/a.py")));
    }

    #[test]
    fn test_rewrite_record() {
        let source = parse_record(
            "pkgmod/__init__.py,sha256=abc,0\n\
             Foo-1.0.data/data/share/foo.txt,sha256=def,3\n\
             Foo-1.0.dist-info/RECORD,,\n",
        )
        .unwrap();
        let synthetic = vec![RecordRow::for_content("bin/foo", b"#!python\n")];

        let rows = rewrite_record(&source, &synthetic, &linux(), Some("Foo-1.0.data")).unwrap();
        let paths: Vec<&str> = rows.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "pkgmod/__init__.py",
                "../../../share/foo.txt",
                "Foo-1.0.dist-info/RECORD",
                "../../../bin/foo",
            ]
        );
        assert_eq!(rows[1].columns, source[1].columns);
        assert_eq!(rows[2].columns, vec!["", ""]);
        assert_eq!(rows[3].size(), Some(9));
    }

    #[test]
    fn test_rewrite_record_windows_depth() {
        let target = BuildTarget::new(Platform::Windows, Bitness::Bits32, "2.7");
        let synthetic = vec![RecordRow::for_content("Scripts/foo.exe", b"MZ")];
        let rows = rewrite_record(&[], &synthetic, &target, None).unwrap();
        assert_eq!(rows[0].path, "../../Scripts/foo.exe");
    }

    #[test]
    fn test_index_json() {
        let metadata = Metadata::parse("Name: Foo\nVersion: 1.0\n").unwrap();
        let json = emit_index(&metadata, &linux(), 0).unwrap();

        assert_eq!(
            json,
            r#"{
  "arch": "x86_64",
  "build": "py35_0",
  "build_number": 0,
  "depends": [
    "python 3.5*"
  ],
  "license": "UNKNOWN",
  "name": "Foo",
  "platform": "linux",
  "subdir": "linux-64",
  "version": "1.0"
}"#
        );
    }

    #[test]
    fn test_index_json_32bit_windows() {
        let metadata = Metadata::parse("Name: Foo\nVersion: 2.1\n").unwrap();
        let target = BuildTarget::new(Platform::Windows, Bitness::Bits32, "2.7");
        let index = IndexJson::new(&metadata, &target, 3).unwrap();

        assert_eq!(index.arch, "x86");
        assert_eq!(index.build, "py27_3");
        assert_eq!(index.subdir, "win-32");
        assert_eq!(index.depends, vec!["python 2.7*"]);
    }
}
