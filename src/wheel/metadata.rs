// src/wheel/metadata.rs

//! Parser for `METADATA` and `WHEEL` records
//!
//! Both files use RFC 822 style `Key: value` headers. A key may repeat
//! (`Classifier`, `Tag`, `Requires-Dist`), so values are kept as an ordered
//! list per key. Parsing stops at the first blank line; what follows in
//! `METADATA` is the long description body.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Header fields of a metadata record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    fields: HashMap<String, Vec<String>>,
}

impl Metadata {
    /// Parse header content
    ///
    /// Lines starting with whitespace continue the previous value.
    pub fn parse(content: &str) -> Result<Self> {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        let mut last_key: Option<String> = None;

        for (lineno, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                let value = last_key
                    .as_ref()
                    .and_then(|k| fields.get_mut(k))
                    .and_then(|values| values.last_mut())
                    .ok_or_else(|| {
                        Error::Structural(format!(
                            "continuation line {} has no preceding field",
                            lineno + 1
                        ))
                    })?;
                value.push('\n');
                value.push_str(line.trim());
                continue;
            }

            let (key, value) = line.split_once(':').ok_or_else(|| {
                Error::Structural(format!(
                    "malformed metadata line {}: {:?}",
                    lineno + 1,
                    line
                ))
            })?;

            let key = key.trim().to_string();
            fields.entry(key.clone()).or_default().push(value.trim().to_string());
            last_key = Some(key);
        }

        Ok(Self { fields })
    }

    /// Read and parse a record file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Structural(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// First value of a field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    /// All values of a field, in file order
    pub fn get_all(&self, key: &str) -> &[String] {
        self.fields.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the field is present at least once
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// First value of a field that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::Structural(format!("Missing required metadata field: {}", key)))
    }
}
