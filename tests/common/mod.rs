// tests/common/mod.rs

//! Shared test utilities for integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use wheel2conda::compression::{CompressionFormat, create_decoder};
use zip::write::SimpleFileOptions;

/// Bytes used as the 64-bit Windows launcher in tests
pub const STUB_64: &[u8] = b"MZ\x90\x00 test launcher x86_64";
/// Bytes used as the 32-bit Windows launcher in tests
pub const STUB_32: &[u8] = b"MZ\x90\x00 test launcher x86";

/// Builder for synthetic wheel files
pub struct WheelBuilder {
    name: String,
    version: String,
    wheel_version: String,
    purelib: bool,
    requires_python: Option<String>,
    tags: Vec<String>,
    entry_points: Option<String>,
    files: Vec<(String, Vec<u8>)>,
}

impl WheelBuilder {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            wheel_version: "1.0".to_string(),
            purelib: true,
            requires_python: None,
            tags: vec!["py2.py3-none-any".to_string()],
            entry_points: None,
            files: Vec::new(),
        }
    }

    /// The minimal wheel: one module, `foo = pkgmod:main`, Foo 1.0
    pub fn minimal() -> Self {
        Self::new("Foo", "1.0")
            .file("pkgmod/__init__.py", "def main():\n    print('foo')\n")
            .console_script("foo", "pkgmod:main")
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_string(), content.as_bytes().to_vec()));
        self
    }

    pub fn console_script(mut self, name: &str, value: &str) -> Self {
        let section = self
            .entry_points
            .get_or_insert_with(|| "[console_scripts]\n".to_string());
        section.push_str(&format!("{} = {}\n", name, value));
        self
    }

    pub fn wheel_version(mut self, version: &str) -> Self {
        self.wheel_version = version.to_string();
        self
    }

    pub fn purelib(mut self, purelib: bool) -> Self {
        self.purelib = purelib;
        self
    }

    pub fn requires_python(mut self, spec: &str) -> Self {
        self.requires_python = Some(spec.to_string());
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    fn dist_info(&self) -> String {
        format!("{}-{}.dist-info", self.name, self.version)
    }

    /// `{name}-{version}.data/{rest}`
    pub fn data_file(self, rest: &str, content: &str) -> Self {
        let path = format!("{}-{}.data/{}", self.name, self.version, rest);
        self.file(&path, content)
    }

    /// Write the wheel into `dir`, returning its path
    pub fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join(format!("{}-{}-py3-none-any.whl", self.name, self.version));
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        let options = SimpleFileOptions::default();

        let mut entries = self.files.clone();
        let dist_info = self.dist_info();

        let mut metadata = format!(
            "Metadata-Version: 2.0\nName: {}\nVersion: {}\n",
            self.name, self.version
        );
        if let Some(spec) = &self.requires_python {
            metadata.push_str(&format!("Requires-Python: {}\n", spec));
        }
        metadata.push_str("\nLong description.\n");
        entries.push((format!("{}/METADATA", dist_info), metadata.into_bytes()));

        let mut wheel = format!(
            "Wheel-Version: {}\nGenerator: test\nRoot-Is-Purelib: {}\n",
            self.wheel_version, self.purelib
        );
        for tag in &self.tags {
            wheel.push_str(&format!("Tag: {}\n", tag));
        }
        entries.push((format!("{}/WHEEL", dist_info), wheel.into_bytes()));

        if let Some(ep) = &self.entry_points {
            entries.push((format!("{}/entry_points.txt", dist_info), ep.clone().into_bytes()));
        }

        let mut record = String::new();
        for (name, content) in &entries {
            record.push_str(&format!(
                "{},{},{}\n",
                name,
                wheel2conda::hash::record_sha256(content),
                content.len()
            ));
        }
        record.push_str(&format!("{}/RECORD,,\n", dist_info));
        entries.push((format!("{}/RECORD", dist_info), record.into_bytes()));

        for (name, content) in entries {
            zip.start_file(name, options).unwrap();
            zip.write_all(&content).unwrap();
        }
        zip.finish().unwrap();
        path
    }
}

/// One entry read back from a package
#[derive(Debug, Clone)]
pub struct PackageEntry {
    pub path: String,
    pub content: Vec<u8>,
    pub mode: u32,
    pub mtime: u64,
}

/// Read every entry of a `.tar.bz2` package, in archive order
pub fn read_package(path: &Path) -> Vec<PackageEntry> {
    let bytes = fs::read(path).unwrap();
    let format = CompressionFormat::from_magic_bytes(&bytes);
    assert_eq!(format, CompressionFormat::Bzip2, "{} is not bzip2", path.display());
    let mut archive = tar::Archive::new(create_decoder(bytes.as_slice(), format));
    let mut entries = Vec::new();

    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        let path = entry.path().unwrap().to_string_lossy().replace('\\', "/");
        let mode = entry.header().mode().unwrap();
        let mtime = entry.header().mtime().unwrap();
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        entries.push(PackageEntry {
            path,
            content,
            mode,
            mtime,
        });
    }

    entries
}

/// Content of one package entry as UTF-8
pub fn entry_text(entries: &[PackageEntry], path: &str) -> String {
    let entry = entries
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("{} not in package", path));
    String::from_utf8(entry.content.clone()).unwrap()
}

/// Launcher stubs for Windows targets
pub fn test_stubs(bitness: wheel2conda::Bitness) -> wheel2conda::Result<Vec<u8>> {
    Ok(match bitness {
        wheel2conda::Bitness::Bits64 => STUB_64.to_vec(),
        wheel2conda::Bitness::Bits32 => STUB_32.to_vec(),
    })
}
