// src/filesystem/walk.rs

//! Deterministic directory traversal

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Collect every regular file under `root`, in a stable order
///
/// Entries are visited depth-first with siblings sorted by file name, so two
/// runs over the same tree always produce the same sequence. Directories are
/// represented only by their children. A `root` that is itself a file yields
/// just that file.
pub fn scan_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            Error::Io(std::io::Error::other(format!(
                "Failed to walk {}: {}",
                path.display(),
                e
            )))
        })?;

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_files_sorted_and_recursive() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("b/sub")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/sub/z.py"), b"").unwrap();
        fs::write(root.join("b/y.py"), b"").unwrap();
        fs::write(root.join("a/x.py"), b"").unwrap();

        let files = scan_files(root).unwrap();
        let rel: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            rel,
            vec![
                PathBuf::from("a/x.py"),
                PathBuf::from("b/sub/z.py"),
                PathBuf::from("b/y.py"),
            ]
        );
    }

    #[test]
    fn test_scan_single_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("mod.py");
        fs::write(&file, b"x = 1").unwrap();

        assert_eq!(scan_files(&file).unwrap(), vec![file]);
    }

    #[test]
    fn test_scan_empty_dir() {
        let temp = TempDir::new().unwrap();
        assert!(scan_files(temp.path()).unwrap().is_empty());
    }
}
