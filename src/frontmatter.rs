//! YAML frontmatter parsing for catalog source files.
//!
//! A source file may start with a metadata block delimited by `---` lines:
//!
//! ```text
//! ---
//! key: create-dto
//! applicableScripts: [create]
//! ---
//! export class {{entityBigName}}CreateDto {}
//! ```
//!
//! Everything after the closing delimiter is the body, kept verbatim.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;

const DELIMITER: &str = "---";

/// Parsed frontmatter and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    /// Parsed metadata, `None` when the file has no (or an empty) frontmatter block
    pub metadata: Option<serde_yaml::Value>,
    /// Text following the frontmatter block
    pub content: String,
}

impl Frontmatter {
    /// Deserializes the metadata into a record, using `T::default()` when there is none.
    pub fn into_record<T: DeserializeOwned + Default>(self) -> Result<(T, String)> {
        let record = match self.metadata {
            Some(value) => serde_yaml::from_value(value)?,
            None => T::default(),
        };
        Ok((record, self.content))
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches(['\r', '\n']).trim_end() == DELIMITER
}

/// Splits `source` into frontmatter metadata and body.
///
/// # Errors
/// * `Error::FrontmatterError` if an opening delimiter is never closed
/// * `Error::YamlError` if the metadata is not valid YAML
pub fn parse_frontmatter(source: &str) -> Result<Frontmatter> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut lines = source.split_inclusive('\n');

    match lines.next() {
        Some(first) if is_delimiter(first) => {}
        _ => {
            return Ok(Frontmatter { metadata: None, content: source.to_string() });
        }
    }

    let header_start = source.find('\n').map_or(source.len(), |i| i + 1);
    let mut offset = header_start;
    for line in lines {
        if is_delimiter(line) {
            let yaml = &source[header_start..offset];
            let content = source[offset + line.len()..].to_string();
            let metadata = if yaml.trim().is_empty() {
                None
            } else {
                Some(serde_yaml::from_str::<serde_yaml::Value>(yaml)?)
            };
            return Ok(Frontmatter { metadata, content });
        }
        offset += line.len();
    }

    Err(Error::FrontmatterError("missing closing '---' delimiter".to_string()))
}
