// src/wheel/compat.rs

//! Python version compatibility heuristics
//!
//! Chooses which of the configured Python versions a wheel should be built
//! for. This is deliberately coarse: only the major version matters.
//!
//! Priority:
//! 1. `Requires-Python` in METADATA, matched by prefix
//! 2. Python tags from the `Tag` fields in WHEEL
//! 3. Otherwise every candidate

use super::metadata::Metadata;
use tracing::debug;

/// Major Python line a wheel targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PythonLine {
    Py2,
    Py3,
    /// Mixed, unknown, or undeclared
    Any,
}

impl PythonLine {
    /// Whether a candidate version string belongs to this line
    pub fn accepts(&self, version: &str) -> bool {
        match self {
            Self::Py2 => version.starts_with("2."),
            Self::Py3 => !version.starts_with("2."),
            Self::Any => true,
        }
    }
}

/// Classify a `Requires-Python` specifier
///
/// Returns None when the value matches none of the prefix rules, so the
/// caller falls through to the wheel tags.
pub fn classify_requires_python(spec: &str) -> Option<PythonLine> {
    let spec: String = spec.chars().filter(|c| !c.is_whitespace()).collect();

    const PY3_PREFIXES: &[&str] = &[">=3", ">3", "~=3", "==3", "===3"];
    const PY2_PREFIXES: &[&str] = &["<3", "<=2", "==2", "~=2", "===2"];

    if PY3_PREFIXES.iter().any(|p| spec.starts_with(p)) {
        Some(PythonLine::Py3)
    } else if PY2_PREFIXES.iter().any(|p| spec.starts_with(p)) {
        Some(PythonLine::Py2)
    } else {
        None
    }
}

/// Classify wheel tags such as `py3-none-any` or `py2.py3-none-any`
pub fn classify_tags(tags: &[String]) -> PythonLine {
    let mut majors = Vec::new();

    for tag in tags {
        let python_tag = tag.split('-').next().unwrap_or("");
        for part in python_tag.split('.') {
            // py3, py35, cp34, pp27 ...
            let digits = part.trim_start_matches(|c: char| c.is_ascii_alphabetic());
            match digits.chars().next() {
                Some(d) if d.is_ascii_digit() => majors.push(d),
                _ => return PythonLine::Any,
            }
        }
    }

    if majors.is_empty() {
        PythonLine::Any
    } else if majors.iter().all(|&m| m == '3') {
        PythonLine::Py3
    } else if majors.iter().all(|&m| m == '2') {
        PythonLine::Py2
    } else {
        PythonLine::Any
    }
}

/// Determine the Python line from METADATA and WHEEL records
pub fn python_line(metadata: &Metadata, wheel_info: &Metadata) -> PythonLine {
    if let Some(spec) = metadata.get("Requires-Python")
        && let Some(line) = classify_requires_python(spec)
    {
        debug!("Requires-Python {:?} selects {:?}", spec, line);
        return line;
    }

    let line = classify_tags(wheel_info.get_all("Tag"));
    debug!("Wheel tags {:?} select {:?}", wheel_info.get_all("Tag"), line);
    line
}

/// Filter candidates, preserving their order
pub fn filter_compatible(line: PythonLine, candidates: &[String]) -> Vec<String> {
    candidates
        .iter()
        .filter(|v| line.accepts(v))
        .cloned()
        .collect()
}
