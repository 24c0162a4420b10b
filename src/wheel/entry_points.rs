// src/wheel/entry_points.rs

//! `entry_points.txt` parsing
//!
//! The file is INI-like:
//!
//! ```text
//! [console_scripts]
//! foo = pkgmod:main
//! Foo-Admin = pkgmod.admin:run [extra]
//! ```
//!
//! Keys are case-sensitive (`foo` and `Foo` are different scripts) and
//! declaration order is kept.

use crate::error::{Error, Result};

/// Section holding command-line launchers
pub const CONSOLE_SCRIPTS: &str = "console_scripts";

/// A validated `module:function` entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Script name, the file name of the generated launcher
    pub name: String,
    /// Dotted module path to import from
    pub module: String,
    /// Callable to invoke
    pub function: String,
}

impl EntryPoint {
    /// Validate an entry point value
    ///
    /// The value must split into exactly one module and one function on `:`.
    /// A trailing `[extras]` marker is dropped.
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        let malformed = || Error::MalformedEntryPoint {
            name: name.to_string(),
            value: value.to_string(),
        };

        let target = strip_extras(value);
        if target.matches(':').count() != 1 {
            return Err(malformed());
        }

        let (module, function) = target.split_once(':').ok_or_else(malformed)?;
        let (module, function) = (module.trim(), function.trim());
        if module.is_empty() || function.is_empty() {
            return Err(malformed());
        }

        Ok(Self {
            name: name.to_string(),
            module: module.to_string(),
            function: function.to_string(),
        })
    }
}

fn strip_extras(value: &str) -> &str {
    let trimmed = value.trim();
    match trimmed.rfind('[') {
        Some(idx) if trimmed.ends_with(']') => trimmed[..idx].trim_end(),
        _ => trimmed,
    }
}

/// Parse one section of an INI document into ordered `(key, value)` pairs
///
/// Returns an empty list when the section is absent. Keys are split at the
/// first `=` or `:`; lines starting with `#` or `;` are comments; indented
/// lines continue the previous value.
pub fn parse_section(content: &str, section: &str) -> Result<Vec<(String, String)>> {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut current: Option<String> = None;
    let mut seen_section = false;

    for (lineno, raw) in content.lines().enumerate() {
        let line = raw.trim_end();
        let trimmed = line.trim_start();

        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') {
            let name = trimmed
                .strip_prefix('[')
                .and_then(|s| s.strip_suffix(']'))
                .ok_or_else(|| {
                    Error::Structural(format!(
                        "entry_points.txt line {}: malformed section header {:?}",
                        lineno + 1,
                        trimmed
                    ))
                })?;
            current = Some(name.trim().to_string());
            if current.as_deref() == Some(section) {
                seen_section = true;
            }
            continue;
        }

        let in_section = current.as_deref() == Some(section);

        if line.starts_with(' ') || line.starts_with('\t') {
            if in_section && let Some((_, value)) = entries.last_mut() {
                value.push(' ');
                value.push_str(trimmed);
            }
            continue;
        }

        if current.is_none() {
            return Err(Error::Structural(format!(
                "entry_points.txt line {}: entry outside any section",
                lineno + 1
            )));
        }

        if !in_section {
            continue;
        }

        let split_at = line.find(['=', ':']).ok_or_else(|| {
            Error::Structural(format!(
                "entry_points.txt line {}: expected `name = value`, got {:?}",
                lineno + 1,
                line
            ))
        })?;

        let key = line[..split_at].trim().to_string();
        let value = line[split_at + 1..].trim().to_string();

        if entries.iter().any(|(k, _)| *k == key) {
            return Err(Error::Structural(format!(
                "entry_points.txt: duplicate {} entry {:?}",
                section, key
            )));
        }

        entries.push((key, value));
    }

    if !seen_section {
        return Ok(Vec::new());
    }

    Ok(entries)
}

/// Parse the console_scripts section
pub fn parse_console_scripts(content: &str) -> Result<Vec<(String, String)>> {
    parse_section(content, CONSOLE_SCRIPTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_console_scripts_in_order() {
        let content = "\
[console_scripts]
zeta = pkgmod:zeta
Foo = pkgmod:upper
foo = pkgmod:main

[gui_scripts]
foogui = pkgmod.gui:run
";
        let scripts = parse_console_scripts(content).unwrap();
        assert_eq!(
            scripts,
            vec![
                ("zeta".to_string(), "pkgmod:zeta".to_string()),
                ("Foo".to_string(), "pkgmod:upper".to_string()),
                ("foo".to_string(), "pkgmod:main".to_string()),
            ]
        );
    }

    #[test]
    fn test_missing_section_is_empty() {
        let scripts = parse_console_scripts("[gui_scripts]\nx = a:b\n").unwrap();
        assert!(scripts.is_empty());
        assert!(parse_console_scripts("").unwrap().is_empty());
    }

    #[test]
    fn test_comments_and_no_space_delimiters() {
        let content = "# header\n[console_scripts]\n; note\nfoo=pkgmod:main\n";
        let scripts = parse_console_scripts(content).unwrap();
        assert_eq!(scripts, vec![("foo".to_string(), "pkgmod:main".to_string())]);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let content = "[console_scripts]\nfoo = a:b\nfoo = c:d\n";
        assert!(parse_console_scripts(content).is_err());
    }

    #[test]
    fn test_entry_point_parse() {
        let ep = EntryPoint::parse("foo", "pkgmod:main").unwrap();
        assert_eq!(ep.module, "pkgmod");
        assert_eq!(ep.function, "main");

        let ep = EntryPoint::parse("foo", "pkg.cli : run [extra1,extra2]").unwrap();
        assert_eq!(ep.module, "pkg.cli");
        assert_eq!(ep.function, "run");
    }

    #[test]
    fn test_entry_point_malformed() {
        for value in ["badvalue", "a:b:c", ":main", "pkgmod:"] {
            let err = EntryPoint::parse("foo", value).unwrap_err();
            assert!(
                matches!(err, Error::MalformedEntryPoint { ref name, .. } if name == "foo"),
                "{} should be malformed",
                value
            );
        }
    }
}
