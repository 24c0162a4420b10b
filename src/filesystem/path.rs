// src/filesystem/path.rs

//! Archive path utilities
//!
//! Paths inside conda packages are always forward-slash separated and
//! relative to the install prefix. Paths coming out of a wheel are untrusted,
//! so everything that ends up as an archive name goes through these helpers.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Sanitize a path from an untrusted source
///
/// This function:
/// 1. Rejects paths containing `..` (parent directory) components
/// 2. Skips `.` (current directory) components
/// 3. Strips leading slashes to make the path relative
/// 4. Returns an error for empty paths
///
/// # Examples
///
/// ```
/// use wheel2conda::filesystem::path::sanitize_path;
/// use std::path::PathBuf;
///
/// assert_eq!(sanitize_path("pkg/./mod.py").unwrap(), PathBuf::from("pkg/mod.py"));
/// assert_eq!(sanitize_path("/pkg/mod.py").unwrap(), PathBuf::from("pkg/mod.py"));
/// assert!(sanitize_path("../etc/passwd").is_err());
/// ```
pub fn sanitize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    let relative = path_str.trim_start_matches('/');

    let mut normalized = PathBuf::new();

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => normalized.push(c),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::PathTraversal(path_str.to_string()));
            }
            Component::Prefix(_) | Component::RootDir => {}
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(Error::InvalidPath("Empty path after sanitization".to_string()));
    }

    Ok(normalized)
}

/// Render a relative filesystem path as an archive name
///
/// Host separators become `/` and dot segments are removed, so the same tree
/// produces the same names on every host.
pub fn to_archive_name(path: impl AsRef<Path>) -> Result<String> {
    let sanitized = sanitize_path(path)?;
    let parts: Vec<String> = sanitized
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Join archive name segments with `/` and canonicalize the result
///
/// Empty segments and `.` are dropped, trailing slashes on the base are
/// tolerated. `..` is rejected.
///
/// ```
/// use wheel2conda::filesystem::path::join_archive;
///
/// assert_eq!(join_archive("Lib/site-packages/", "pkg/./a.py").unwrap(), "Lib/site-packages/pkg/a.py");
/// ```
pub fn join_archive(base: &str, rest: &str) -> Result<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(rest.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(Error::PathTraversal(format!("{}/{}", base, rest)));
            }
            s => parts.push(s),
        }
    }

    if parts.is_empty() {
        return Err(Error::InvalidPath(format!(
            "Empty archive path from {:?} + {:?}",
            base, rest
        )));
    }

    Ok(parts.join("/"))
}

/// Sanitize a filename (single path component) from an untrusted source
///
/// Used for console script names, which become files in the scripts directory.
///
/// ```
/// use wheel2conda::filesystem::path::sanitize_filename;
///
/// assert_eq!(sanitize_filename("my-tool").unwrap(), "my-tool");
/// assert!(sanitize_filename("../evil").is_err());
/// ```
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name.contains('/') || name.contains('\\') {
        return Err(Error::PathTraversal(format!(
            "Filename contains path separator: {}",
            name
        )));
    }

    if name == ".." || name == "." {
        return Err(Error::PathTraversal(format!("Invalid filename: {}", name)));
    }

    if name.is_empty() {
        return Err(Error::InvalidPath("Empty filename".to_string()));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_normal() {
        assert_eq!(
            sanitize_path("pkg/sub/mod.py").unwrap(),
            PathBuf::from("pkg/sub/mod.py")
        );
    }

    #[test]
    fn test_sanitize_path_dot_and_slashes() {
        assert_eq!(
            sanitize_path("///pkg/./mod.py").unwrap(),
            PathBuf::from("pkg/mod.py")
        );
    }

    #[test]
    fn test_sanitize_path_traversal_rejected() {
        assert!(sanitize_path("..").is_err());
        assert!(sanitize_path("pkg/../../x").is_err());
    }

    #[test]
    fn test_sanitize_path_empty_rejected() {
        assert!(sanitize_path("").is_err());
        assert!(sanitize_path("/").is_err());
        assert!(sanitize_path("./").is_err());
    }

    #[test]
    fn test_to_archive_name() {
        let p = Path::new("pkg").join(".").join("data").join("x.txt");
        assert_eq!(to_archive_name(&p).unwrap(), "pkg/data/x.txt");
    }

    #[test]
    fn test_join_archive() {
        assert_eq!(
            join_archive("lib/python3.5/site-packages/", "pkg").unwrap(),
            "lib/python3.5/site-packages/pkg"
        );
        assert_eq!(join_archive("", "share/doc").unwrap(), "share/doc");
        assert_eq!(join_archive("bin/", "./foo").unwrap(), "bin/foo");
        assert!(join_archive("bin/", "../foo").is_err());
        assert!(join_archive("", ".").is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("foo").unwrap(), "foo");
        assert!(sanitize_filename("a/b").is_err());
        assert!(sanitize_filename("a\\b").is_err());
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename(".").is_err());
    }
}
