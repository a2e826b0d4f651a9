use async_trait::async_trait;
use codesmith::error::{Error, Result};
use codesmith::formatter::{Formatter, NoopFormatter};
use codesmith::persistence::{
    backup_path, latest_backup, restore_latest, FilePersister, PathComment, SaveOutcome,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn backups(dir: &Path, file_name: &str) -> Vec<PathBuf> {
    let prefix = format!("{file_name}.bak.");
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.file_name().unwrap().to_str().unwrap().starts_with(&prefix))
        .collect();
    found.sort();
    found
}

struct Uppercase;

#[async_trait]
impl Formatter for Uppercase {
    async fn format(&self, _path: &Path, content: &str) -> Result<String> {
        Ok(content.to_uppercase())
    }
}

struct Failing;

#[async_trait]
impl Formatter for Failing {
    async fn format(&self, _path: &Path, _content: &str) -> Result<String> {
        Err(Error::FormatError("boom".to_string()))
    }
}

#[tokio::test]
async fn test_save_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("out/users");
    let persister = FilePersister::new(Arc::new(NoopFormatter));

    let first = persister.save(&dir, "user.create.ts", "export {};\n").await.unwrap();
    assert_eq!(first, SaveOutcome::Created);

    let second = persister.save(&dir, "user.create.ts", "export {};\n").await.unwrap();
    assert_eq!(second, SaveOutcome::Unchanged);
    assert!(backups(&dir, "user.create.ts").is_empty());
}

#[tokio::test]
async fn test_backup_on_change() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let persister = FilePersister::new(Arc::new(NoopFormatter));

    persister.save(dir, "a.ts", "old\n").await.unwrap();
    let outcome = persister.save(dir, "a.ts", "new\n").await.unwrap();

    let SaveOutcome::Updated { backup } = outcome else {
        panic!("Expected Updated, got {outcome:?}");
    };
    assert_eq!(fs::read_to_string(&backup).unwrap(), "old\n");
    assert_eq!(fs::read_to_string(dir.join("a.ts")).unwrap(), "new\n");
    assert_eq!(backups(dir, "a.ts"), vec![backup]);
}

#[tokio::test]
async fn test_comparison_uses_formatted_content() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("a.ts"), "HELLO").unwrap();

    let persister = FilePersister::new(Arc::new(Uppercase));
    let outcome = persister.save(dir, "a.ts", "hello").await.unwrap();
    assert_eq!(outcome, SaveOutcome::Unchanged);
}

#[tokio::test]
async fn test_formatter_failure_keeps_original() {
    let temp_dir = TempDir::new().unwrap();
    let persister = FilePersister::new(Arc::new(Failing));

    let outcome = persister.save(temp_dir.path(), "a.ts", "raw").await.unwrap();
    assert_eq!(outcome, SaveOutcome::Created);
    assert_eq!(fs::read_to_string(temp_dir.path().join("a.ts")).unwrap(), "raw");
}

#[tokio::test]
async fn test_path_comment_header() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let persister = FilePersister::new(Arc::new(NoopFormatter)).with_path_comment(PathComment::new(
        root.to_path_buf(),
        vec!["// src/".to_string()],
        vec![".ts".to_string()],
    ));

    let dir = root.join("src/generated");
    persister.save(&dir, "a.ts", "// src/old/a.ts\n\nexport {};\n").await.unwrap();
    assert_eq!(
        fs::read_to_string(dir.join("a.ts")).unwrap(),
        "// src/generated/a.ts\n\nexport {};\n"
    );

    persister.save(&dir, "a.json", "{}").await.unwrap();
    assert_eq!(fs::read_to_string(dir.join("a.json")).unwrap(), "{}");
}

#[tokio::test]
async fn test_restore_newest_backup() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let target = dir.join("a.ts");
    fs::write(&target, "current").unwrap();
    fs::write(backup_path(&target, "20240101T000000"), "older").unwrap();
    fs::write(backup_path(&target, "20250101T000000"), "newest").unwrap();
    fs::write(dir.join("a.ts.bak.notastamp"), "junk").unwrap();

    let latest = latest_backup(dir, "a.ts").await.unwrap();
    assert_eq!(latest, Some(backup_path(&target, "20250101T000000")));

    let restored = restore_latest(dir, "a.ts").await.unwrap();
    assert_eq!(restored, latest);
    assert_eq!(fs::read_to_string(&target).unwrap(), "newest");

    assert_eq!(restore_latest(dir, "other.ts").await.unwrap(), None);
}
