//! Directory ignore rules for barrel synchronization.
//! Patterns come from `ignoreSync` in `codegen.json` and take two forms:
//! - absolute paths, which ignore that directory and everything below it
//! - relative glob masks, matched against the path relative to the sync root
//!
//! # Example
//! ```json
//! { "ignoreSync": ["/abs/project/src/generated/legacy", "**/__tests__", "internal/*"] }
//! ```

use crate::error::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::debug;
use std::path::{Component, Path, PathBuf};

/// `path` made absolute against the current directory, without touching the file system.
/// Paths that cannot be resolved are returned unchanged.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn normalize(pattern: &str) -> String {
    pattern.replace('\\', "/")
}

fn normal_components(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect()
}

/// Compiled ignore patterns relative to a sync root.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    base_dir: PathBuf,
    absolute: Vec<PathBuf>,
    masks: GlobSet,
}

impl IgnoreRules {
    /// Compiles `patterns` for the sync root `base_dir`.
    ///
    /// The root is stored in absolute form, and [`IgnoreRules::is_ignored`] absolutizes the
    /// paths it checks, so relative and absolute spellings of one directory agree. In masks `*` stays within one path segment while `**` spans segments.
    ///
    /// # Errors
    /// * `Error::GlobError` if a mask is not a valid glob
    pub fn new<P: Into<PathBuf>>(base_dir: P, patterns: &[String]) -> Result<Self> {
        let mut absolute = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns.iter().map(|p| normalize(p.trim())) {
            if pattern.is_empty() {
                continue;
            }
            if Path::new(&pattern).is_absolute() {
                absolute.push(absolute_path(Path::new(pattern.trim_end_matches('/'))));
            } else {
                let mask = pattern.trim_matches('/');
                builder.add(GlobBuilder::new(mask).literal_separator(true).build()?);
            }
        }

        Ok(Self { base_dir: absolute_path(&base_dir.into()), absolute, masks: builder.build()? })
    }

    /// Rules that ignore nothing.
    pub fn empty<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self { base_dir: absolute_path(&base_dir.into()), absolute: Vec::new(), masks: GlobSet::empty() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Returns whether the directory at `path` is excluded from sync.
    ///
    /// A mask matches when any contiguous run of segments of the path (relative to the sync
    /// root) matches it, so `legacy` ignores `a/legacy` and `a/legacy/b` alike. The sync root
    /// itself is never mask-ignored.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let path = absolute_path(path);
        let path = path.as_path();
        if self.absolute.iter().any(|prefix| path.starts_with(prefix)) {
            debug!("Ignoring {} (absolute pattern)", path.display());
            return true;
        }

        let segments = match path.strip_prefix(&self.base_dir) {
            Ok(relative) => normal_components(relative),
            Err(_) => normal_components(path),
        };

        for start in 0..segments.len() {
            for end in start + 1..=segments.len() {
                if self.masks.is_match(segments[start..end].join("/")) {
                    debug!("Ignoring {} (mask)", path.display());
                    return true;
                }
            }
        }
        false
    }
}
