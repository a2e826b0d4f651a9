//! Project configuration handling.
//! Reads `codegen.json` from the project root. Every field is optional and missing, blank or
//! unparsable values fall back to the defaults; a broken config file is never fatal.

use crate::catalog::{NameSegment, PathSegment};
use crate::constants::CONFIG_FILE;
use indexmap::IndexMap;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Raw shape of `codegen.json`. Each field is read on its own, so one malformed value only
/// resets that field. Blank strings are normalized in [`ProjectConfig::from_raw`].
#[derive(Debug, Default)]
struct RawConfig {
    config_folder: Option<String>,
    output_path: Option<String>,
    sync_index_path: Option<String>,
    output_ext: Option<String>,
    path_order: Option<Vec<PathSegment>>,
    name_order: Option<Vec<NameSegment>>,
    ignore_sync: Option<Vec<String>>,
    sync_index_ext: Option<String>,
    barrel_name: Option<String>,
    comment_removal_patterns: Option<Vec<String>>,
    sync_skip_folders_containing: Option<Vec<String>>,
    path_comment: Option<bool>,
    comment_extensions: Option<Vec<String>>,
    formatters: Option<IndexMap<String, Vec<String>>>,
}

/// Effective project configuration with all defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Catalog root, relative to the project root
    pub config_folder: String,
    /// Default output root for generated files, relative to the project root
    pub output_path: String,
    /// Root of barrel synchronization; defaults to `output_path`
    pub sync_index_path: String,
    pub output_ext: String,
    pub path_order: Vec<PathSegment>,
    pub name_order: Vec<NameSegment>,
    /// Absolute path prefixes or relative glob masks excluded from barrel sync
    pub ignore_sync: Vec<String>,
    pub sync_index_ext: String,
    /// Barrel file name without extension
    pub barrel_name: String,
    /// Leading comment prefixes replaced by a fresh path comment
    pub comment_removal_patterns: Vec<String>,
    /// Directory-name substrings that suppress barrel writing
    pub sync_skip_folders_containing: Vec<String>,
    /// Whether generated files get a `// relative/path` header line
    pub path_comment: bool,
    /// Extensions whose files may carry a `//` path comment
    pub comment_extensions: Vec<String>,
    /// External formatter command lines keyed by extension
    pub formatters: IndexMap<String, Vec<String>>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            config_folder: "codegen".to_string(),
            output_path: "src/generated".to_string(),
            sync_index_path: "src/generated".to_string(),
            output_ext: ".ts".to_string(),
            path_order: vec![PathSegment::Entity, PathSegment::Script],
            name_order: vec![NameSegment::Entity, NameSegment::Script, NameSegment::Template],
            ignore_sync: Vec::new(),
            sync_index_ext: ".ts".to_string(),
            barrel_name: "index".to_string(),
            comment_removal_patterns: vec![
                "// Path:".to_string(),
                "// src/".to_string(),
                "// packages/".to_string(),
            ],
            sync_skip_folders_containing: Vec::new(),
            path_comment: false,
            comment_extensions: [".ts", ".tsx", ".js", ".jsx", ".mjs", ".dart"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            formatters: IndexMap::new(),
        }
    }
}

/// Reads `key` from the config object; a missing, `null` or mistyped value yields `None`.
fn field<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Option<T> {
    match object.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Invalid '{key}' in {CONFIG_FILE}, using the default: {e}");
                None
            }
        },
    }
}

impl RawConfig {
    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            config_folder: field(object, "configFolder"),
            output_path: field(object, "outputPath"),
            sync_index_path: field(object, "syncIndexPath"),
            output_ext: field(object, "outputExt"),
            path_order: field(object, "pathOrder"),
            name_order: field(object, "nameOrder"),
            ignore_sync: field(object, "ignoreSync"),
            sync_index_ext: field(object, "syncIndexExt"),
            barrel_name: field(object, "barrelName"),
            comment_removal_patterns: field(object, "commentRemovalPatterns"),
            sync_skip_folders_containing: field(object, "syncSkipFoldersContaining"),
            path_comment: field(object, "pathComment"),
            comment_extensions: field(object, "commentExtensions"),
            formatters: field(object, "formatters"),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl ProjectConfig {
    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();
        let output_path = non_blank(raw.output_path).unwrap_or(defaults.output_path);

        Self {
            config_folder: non_blank(raw.config_folder).unwrap_or(defaults.config_folder),
            sync_index_path: non_blank(raw.sync_index_path)
                .unwrap_or_else(|| output_path.clone()),
            output_path,
            output_ext: non_blank(raw.output_ext).unwrap_or(defaults.output_ext),
            path_order: raw.path_order.unwrap_or(defaults.path_order),
            name_order: raw.name_order.unwrap_or(defaults.name_order),
            ignore_sync: raw.ignore_sync.unwrap_or(defaults.ignore_sync),
            sync_index_ext: non_blank(raw.sync_index_ext).unwrap_or(defaults.sync_index_ext),
            barrel_name: non_blank(raw.barrel_name).unwrap_or(defaults.barrel_name),
            comment_removal_patterns: raw
                .comment_removal_patterns
                .unwrap_or(defaults.comment_removal_patterns),
            sync_skip_folders_containing: raw
                .sync_skip_folders_containing
                .unwrap_or(defaults.sync_skip_folders_containing),
            path_comment: raw.path_comment.unwrap_or(defaults.path_comment),
            comment_extensions: raw.comment_extensions.unwrap_or(defaults.comment_extensions),
            formatters: raw.formatters.unwrap_or(defaults.formatters),
        }
    }

    /// Parses configuration content.
    ///
    /// Invalid JSON, or a top-level value that is not an object, yields the defaults. Inside an
    /// object each field falls back to its default independently.
    pub fn parse(content: &str) -> Self {
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(object)) => Self::from_raw(RawConfig::from_object(&object)),
            Ok(_) => {
                warn!("{CONFIG_FILE} is not a JSON object, using default configuration");
                Self::default()
            }
            Err(e) => {
                warn!("Invalid {CONFIG_FILE}, using default configuration: {e}");
                Self::default()
            }
        }
    }

    /// Absolute catalog root for a project.
    pub fn catalog_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.config_folder)
    }

    /// Absolute barrel synchronization root for a project.
    pub fn sync_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.sync_index_path)
    }
}

/// Loads `codegen.json` from the project root.
///
/// # Arguments
/// * `project_root` - Directory that holds the configuration file
///
/// # Returns
/// * `ProjectConfig` - Parsed configuration, or the defaults when the file is missing or invalid
pub async fn load_config<P: AsRef<Path>>(project_root: P) -> ProjectConfig {
    let config_path = project_root.as_ref().join(CONFIG_FILE);
    match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => {
            debug!("Loading configuration from {}", config_path.display());
            ProjectConfig::parse(&content)
        }
        Err(e) => {
            debug!("No usable {} ({e}), using defaults", config_path.display());
            ProjectConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_fall_back() {
        let config = ProjectConfig::parse(r#"{"configFolder": "  ", "barrelName": ""}"#);
        assert_eq!(config.config_folder, "codegen");
        assert_eq!(config.barrel_name, "index");
    }

    #[test]
    fn test_sync_index_path_follows_output_path() {
        let config = ProjectConfig::parse(r#"{"outputPath": "lib/gen"}"#);
        assert_eq!(config.output_path, "lib/gen");
        assert_eq!(config.sync_index_path, "lib/gen");

        let config =
            ProjectConfig::parse(r#"{"outputPath": "lib/gen", "syncIndexPath": "lib"}"#);
        assert_eq!(config.sync_index_path, "lib");
    }

    #[test]
    fn test_invalid_json_uses_defaults() {
        assert_eq!(ProjectConfig::parse("{ nope"), ProjectConfig::default());
        assert_eq!(ProjectConfig::parse("[1, 2]"), ProjectConfig::default());
    }

    #[test]
    fn test_malformed_field_only_resets_itself() {
        let config = ProjectConfig::parse(
            r#"{"outputPath": "lib/gen", "barrelName": "mod", "pathOrder": ["entity", "template"], "ignoreSync": "x", "pathComment": null}"#,
        );
        let defaults = ProjectConfig::default();
        assert_eq!(config.output_path, "lib/gen");
        assert_eq!(config.sync_index_path, "lib/gen");
        assert_eq!(config.barrel_name, "mod");
        assert_eq!(config.path_order, defaults.path_order);
        assert_eq!(config.ignore_sync, defaults.ignore_sync);
        assert_eq!(config.path_comment, defaults.path_comment);
    }
}
