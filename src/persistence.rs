//! File persistence with change detection and timestamped backups.
//!
//! A file is only rewritten when its formatted content differs byte-for-byte from what is on
//! disk. Before an existing file is overwritten (or removed) it is copied to a sibling
//! `<name>.bak.<YYYYMMDDTHHMMSS>`. Backups are never pruned.

use crate::constants::{BACKUP_INFIX, BACKUP_STAMP_FORMAT};
use crate::error::Result;
use crate::formatter::{format_or_original, Formatter};
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of persisting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No file existed before
    Created,
    /// The previous content differed and was backed up first
    Updated { backup: PathBuf },
    /// Identical content was already on disk; nothing was written
    Unchanged,
}

/// Current local time as a backup stamp, e.g. `20250131T235959`.
pub fn backup_stamp() -> String {
    chrono::Local::now().format(BACKUP_STAMP_FORMAT).to_string()
}

/// `<path>.bak.<stamp>`
pub fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(BACKUP_INFIX);
    name.push(stamp);
    path.with_file_name(name)
}

fn is_backup_stamp(stamp: &str) -> bool {
    let bytes = stamp.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'T'
        && bytes.iter().enumerate().all(|(i, b)| i == 8 || b.is_ascii_digit())
}

/// Reads a file, treating a missing file as `None`.
pub async fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Copies `path` to a fresh backup next to it.
pub async fn backup_file(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path, &backup_stamp());
    tokio::fs::copy(path, &backup).await?;
    debug!("Backed up {} to {}", path.display(), backup.display());
    Ok(backup)
}

/// Writes already formatted `content` to `path` unless it is identical to the file on disk.
pub async fn write_if_changed(path: &Path, content: &str) -> Result<SaveOutcome> {
    let outcome = match read_existing(path).await? {
        Some(existing) if existing == content.as_bytes() => return Ok(SaveOutcome::Unchanged),
        Some(_) => SaveOutcome::Updated { backup: backup_file(path).await? },
        None => SaveOutcome::Created,
    };

    tokio::fs::write(path, content).await?;
    Ok(outcome)
}

/// Backs up and deletes `path`, returning the backup location.
pub async fn remove_with_backup(path: &Path) -> Result<PathBuf> {
    let backup = backup_file(path).await?;
    tokio::fs::remove_file(path).await?;
    Ok(backup)
}

/// Finds the newest `<file_name>.bak.<stamp>` in `dir`.
pub async fn latest_backup(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let prefix = format!("{file_name}{BACKUP_INFIX}");
    let mut newest: Option<String> = None;

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stamp) = name.strip_prefix(&prefix) else { continue };
        if is_backup_stamp(stamp) && newest.as_deref().map_or(true, |best| stamp > best) {
            newest = Some(stamp.to_string());
        }
    }

    Ok(newest.map(|stamp| backup_path(&dir.join(file_name), &stamp)))
}

/// Copies the newest backup of `dir/file_name` over the file.
///
/// # Returns
/// * `Result<Option<PathBuf>>` - The restored backup, or `None` when there is none
pub async fn restore_latest(dir: &Path, file_name: &str) -> Result<Option<PathBuf>> {
    let Some(backup) = latest_backup(dir, file_name).await? else {
        return Ok(None);
    };
    tokio::fs::copy(&backup, dir.join(file_name)).await?;
    Ok(Some(backup))
}

/// `// relative/path` header for generated files.
#[derive(Debug, Clone)]
pub struct PathComment {
    project_root: PathBuf,
    removal_patterns: Vec<String>,
    extensions: Vec<String>,
}

impl PathComment {
    /// # Arguments
    /// * `project_root` - Root the header path is relative to
    /// * `removal_patterns` - Leading comment prefixes replaced by the header
    /// * `extensions` - Extensions (with dot) whose files get a header
    pub fn new(project_root: PathBuf, removal_patterns: Vec<String>, extensions: Vec<String>) -> Self {
        Self { project_root, removal_patterns, extensions }
    }

    fn applies_to(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    fn header_line(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        format!("// {}", segments.join("/"))
    }

    /// Replaces any leading path comments of `content` with a fresh header for `path`.
    pub fn apply(&self, path: &Path, content: &str) -> String {
        if !self.applies_to(path) {
            return content.to_string();
        }

        let header = self.header_line(path);
        let mut rest = content;
        while !rest.is_empty() {
            let (line, tail) = match rest.find('\n') {
                Some(i) => (&rest[..i], &rest[i + 1..]),
                None => (rest, ""),
            };
            let trimmed = line.trim();
            let removable = trimmed.is_empty()
                || trimmed == header
                || self.removal_patterns.iter().any(|p| trimmed.starts_with(p.as_str()));
            if !removable {
                break;
            }
            rest = tail;
        }

        format!("{header}\n\n{rest}")
    }
}

/// Formats, compares and writes generated files.
#[derive(Clone)]
pub struct FilePersister {
    formatter: Arc<dyn Formatter>,
    path_comment: Option<PathComment>,
}

impl FilePersister {
    pub fn new(formatter: Arc<dyn Formatter>) -> Self {
        Self { formatter, path_comment: None }
    }

    /// Enables the path-comment header.
    pub fn with_path_comment(mut self, path_comment: PathComment) -> Self {
        self.path_comment = Some(path_comment);
        self
    }

    /// Saves `content` as `dir/file_name`.
    ///
    /// # Flow
    /// 1. Creates `dir`
    /// 2. Adds the path comment, if enabled
    /// 3. Formats (best effort)
    /// 4. Skips the write when the formatted content equals the file on disk, otherwise backs
    ///    up the previous file and writes
    pub async fn save(&self, dir: &Path, file_name: &str, content: &str) -> Result<SaveOutcome> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(file_name);

        let body = match &self.path_comment {
            Some(comment) => comment.apply(&path, content),
            None => content.to_string(),
        };
        let formatted = format_or_original(self.formatter.as_ref(), &path, &body).await;

        write_if_changed(&path, &formatted).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path() {
        let path = backup_path(Path::new("/a/user.create.ts"), "20250101T010203");
        assert_eq!(path, PathBuf::from("/a/user.create.ts.bak.20250101T010203"));
    }

    #[test]
    fn test_is_backup_stamp() {
        assert!(is_backup_stamp("20250101T010203"));
        assert!(is_backup_stamp(&backup_stamp()));
        assert!(!is_backup_stamp("20250101-010203"));
        assert!(!is_backup_stamp("2025"));
    }

    #[test]
    fn test_path_comment_replaces_old_header() {
        let comment = PathComment::new(
            PathBuf::from("/proj"),
            vec!["// Path:".to_string()],
            vec![".ts".to_string()],
        );
        let path = Path::new("/proj/src/user.ts");
        let out = comment.apply(path, "// Path: old\n\nexport {};\n");
        assert_eq!(out, "// src/user.ts\n\nexport {};\n");

        assert_eq!(comment.apply(path, &out), out);
        assert_eq!(comment.apply(Path::new("/proj/data.json"), "{}"), "{}");
    }
}
