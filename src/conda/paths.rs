// src/conda/paths.rs

//! Destination paths inside a conda package
//!
//! Archive paths are relative to the install root. RECORD paths stay
//! relative to site-packages, so anything installed outside it is
//! addressed with a `../` climb out of site-packages.

use crate::conda::target::BuildTarget;
use crate::error::{Error, Result};
use crate::filesystem::path::join_archive;

/// The only `.data` subdirectory kind we can place
pub const DATA_KIND: &str = "data";

/// Package metadata directory, owned by the builder
pub const INFO_DIR: &str = "info";

/// site-packages root for a target, e.g. `lib/python3.5/site-packages/`
pub fn site_packages_root(target: &BuildTarget) -> String {
    target.site_packages()
}

/// Scripts root for a target, e.g. `bin/`
pub fn scripts_root(target: &BuildTarget) -> &'static str {
    target.layout().scripts_dir()
}

/// Archive path for a file under site-packages
pub fn module_path(target: &BuildTarget, relative: &str) -> Result<String> {
    join_archive(&site_packages_root(target), relative)
}

/// Archive path for a launcher
pub fn script_path(target: &BuildTarget, file_name: &str) -> Result<String> {
    join_archive(scripts_root(target), file_name)
}

/// Install-root path for a path inside the `.data` directory
///
/// `data/share/foo.txt` becomes `share/foo.txt`. Any other subdirectory
/// kind (`scripts`, `headers`, `purelib`...) is rejected, as is anything
/// that would land in the package's `info/` directory.
pub fn data_install_path(within_data_dir: &str) -> Result<String> {
    let (kind, rest) = within_data_dir
        .split_once('/')
        .unwrap_or((within_data_dir, ""));

    if kind != DATA_KIND {
        return Err(Error::UnsupportedDataLayout(kind.to_string()));
    }

    let installed = join_archive("", rest)?;
    if installed == INFO_DIR || installed.starts_with(&format!("{}/", INFO_DIR)) {
        return Err(Error::UnsupportedDataLayout(format!("{}/{}", DATA_KIND, installed)));
    }
    Ok(installed)
}

/// RECORD path for a file addressed relative to the install root
pub fn record_install_path(target: &BuildTarget, install_relative: &str) -> String {
    format!("{}{}", target.layout().record_prefix(), install_relative)
}

/// Re-root a RECORD path into the install layout
///
/// Paths under `{name}.data/data/` become install-root relative behind the
/// platform's climb prefix. Every other path is returned unchanged.
pub fn reroot_data_path(
    target: &BuildTarget,
    data_dir: Option<&str>,
    record_path: &str,
) -> Result<String> {
    let Some(data_dir) = data_dir else {
        return Ok(record_path.to_string());
    };

    match record_path
        .strip_prefix(data_dir)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(within) => Ok(record_install_path(target, &data_install_path(within)?)),
        None => Ok(record_path.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conda::platform::{Bitness, Platform};

    fn linux() -> BuildTarget {
        BuildTarget::new(Platform::Linux, Bitness::Bits64, "3.5")
    }

    fn windows() -> BuildTarget {
        BuildTarget::new(Platform::Windows, Bitness::Bits64, "3.5")
    }

    #[test]
    fn test_roots() {
        assert_eq!(site_packages_root(&linux()), "lib/python3.5/site-packages/");
        assert_eq!(site_packages_root(&windows()), "Lib/site-packages/");
        assert_eq!(scripts_root(&linux()), "bin/");
        assert_eq!(scripts_root(&windows()), "Scripts/");
    }

    #[test]
    fn test_module_and_script_paths() {
        assert_eq!(
            module_path(&linux(), "pkgmod/__init__.py").unwrap(),
            "lib/python3.5/site-packages/pkgmod/__init__.py"
        );
        assert_eq!(script_path(&windows(), "foo.exe").unwrap(), "Scripts/foo.exe");
        assert!(module_path(&linux(), "../escape.py").is_err());
    }

    #[test]
    fn test_data_install_path() {
        assert_eq!(data_install_path("data/share/foo.txt").unwrap(), "share/foo.txt");

        let err = data_install_path("scripts/foo").unwrap_err();
        assert!(matches!(err, Error::UnsupportedDataLayout(ref k) if k == "scripts"));
    }

    #[test]
    fn test_reroot_data_rows() {
        let data = Some("Foo-1.0.data");
        assert_eq!(
            reroot_data_path(&linux(), data, "Foo-1.0.data/data/share/foo.txt").unwrap(),
            "../../../share/foo.txt"
        );
        assert_eq!(
            reroot_data_path(&windows(), data, "Foo-1.0.data/data/share/foo.txt").unwrap(),
            "../../share/foo.txt"
        );
        assert_eq!(
            reroot_data_path(&linux(), data, "pkgmod/__init__.py").unwrap(),
            "pkgmod/__init__.py"
        );
        assert!(reroot_data_path(&linux(), data, "Foo-1.0.data/headers/x.h").is_err());
    }

    #[test]
    fn test_data_cannot_shadow_info_dir() {
        for within in ["data/info/index.json", "data/./info/files", "data/info"] {
            let err = data_install_path(within).unwrap_err();
            assert!(matches!(err, Error::UnsupportedDataLayout(ref k) if k.starts_with("data/info")));
        }
        assert_eq!(data_install_path("data/information.txt").unwrap(), "information.txt");
    }

    #[test]
    fn test_rerooted_path_resolves_to_install_location() {
        for target in [linux(), windows()] {
            let record = reroot_data_path(&target, Some("Foo-1.0.data"), "Foo-1.0.data/data/share/foo.txt")
                .unwrap();

            let root = site_packages_root(&target);
            let mut parts: Vec<&str> = root.trim_end_matches('/').split('/').collect();
            for seg in record.split('/') {
                if seg == ".." {
                    parts.pop();
                } else {
                    parts.push(seg);
                }
            }
            assert_eq!(parts.join("/"), "share/foo.txt");
        }
    }
}
