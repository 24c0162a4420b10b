// src/wheel/record.rs

//! RECORD manifest rows
//!
//! RECORD is a CSV file with one row per installed file:
//! `path,hash,size`. Hash and size are empty for RECORD itself (and for
//! signature files). Fields containing commas or quotes are quoted with
//! doubled inner quotes, the minimal quoting of Python's csv module.

use crate::error::{Error, Result};
use crate::hash;
use std::fmt::Write as _;
use std::path::Path;

/// One row of a RECORD manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    /// Path relative to site-packages
    pub path: String,
    /// Every column after the path, passed through untouched
    pub columns: Vec<String>,
}

impl RecordRow {
    /// Create a row with explicit hash and size columns
    pub fn new(path: impl Into<String>, hash: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            path: path.into(),
            columns: vec![
                hash.into(),
                size.map(|s| s.to_string()).unwrap_or_default(),
            ],
        }
    }

    /// Create a row for content we generated, hashing it with SHA-256
    pub fn for_content(path: impl Into<String>, content: &[u8]) -> Self {
        Self::new(path, hash::record_sha256(content), Some(content.len() as u64))
    }

    /// The hash column, if present and non-empty
    pub fn hash(&self) -> Option<&str> {
        self.columns
            .first()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The size column, if present and numeric
    pub fn size(&self) -> Option<u64> {
        self.columns.get(1).and_then(|s| s.parse().ok())
    }

    /// Same row at a different path
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            columns: self.columns.clone(),
        }
    }
}

/// Parse RECORD content into rows
pub fn parse_record(content: &str) -> Result<Vec<RecordRow>> {
    let mut rows = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let mut fields = split_csv_line(line).ok_or_else(|| {
            Error::Structural(format!("RECORD line {}: unterminated quote", lineno + 1))
        })?;

        let path = fields.remove(0);
        if path.is_empty() {
            return Err(Error::Structural(format!(
                "RECORD line {}: empty path",
                lineno + 1
            )));
        }

        rows.push(RecordRow { path, columns: fields });
    }

    Ok(rows)
}

/// Read and parse a RECORD file
pub fn read_record(path: &Path) -> Result<Vec<RecordRow>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Structural(format!("cannot read {}: {}", path.display(), e)))?;
    parse_record(&content)
}

/// Serialize rows as RECORD content, one `\n`-terminated line per row
pub fn write_record(rows: &[RecordRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let mut first = true;
        for field in std::iter::once(&row.path).chain(row.columns.iter()) {
            if !first {
                out.push(',');
            }
            first = false;
            write_csv_field(&mut out, field);
        }
        out.push('\n');
    }
    out
}

fn write_csv_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        let _ = write!(out, "\"{}\"", field.replace('"', "\"\""));
    } else {
        out.push_str(field);
    }
}

/// Split a single CSV line, returning None on an unterminated quote
fn split_csv_line(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => current.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}
