//! Barrel (re-export index) synchronization.
//!
//! Every synchronized directory goes through one pass of:
//! discover children → drop ignored folders → rule collects exportables → rule renders →
//! format → compare with the existing barrel → skip, backup + write, or backup + delete.
//!
//! Directories are processed deepest first, and a subfolder is only exported when it holds a
//! barrel of its own by the time its parent is synchronized.

pub mod rules;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::formatter::{format_or_original, Formatter};
use crate::ignore::{absolute_path, IgnoreRules};
use crate::persistence::{read_existing, remove_with_backup, write_if_changed, SaveOutcome};
use log::{debug, info, warn};
use rules::{sort_names, RuleRegistry, SyncRule};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Settings of one sync run.
#[derive(Clone)]
pub struct SyncOptions {
    /// Sync root; relative directories are resolved against it
    pub base_dir: PathBuf,
    /// Barrel extension, e.g. `.ts`
    pub sync_ext: String,
    /// Barrel file name without extension
    pub barrel_name: String,
    pub ignore: IgnoreRules,
    /// Directory-name substrings that suppress barrel writing
    pub skip_markers: Vec<String>,
    pub formatter: Arc<dyn Formatter>,
    pub registry: RuleRegistry,
}

impl SyncOptions {
    /// Builds options from the project configuration.
    ///
    /// # Errors
    /// * `Error::GlobError` if an `ignoreSync` mask is invalid
    pub fn from_config(
        config: &ProjectConfig,
        project_root: &Path,
        formatter: Arc<dyn Formatter>,
    ) -> Result<Self> {
        let base_dir = absolute_path(&config.sync_dir(project_root));
        Ok(Self {
            ignore: IgnoreRules::new(&base_dir, &config.ignore_sync)?,
            base_dir,
            sync_ext: config.sync_index_ext.clone(),
            barrel_name: config.barrel_name.clone(),
            skip_markers: config.sync_skip_folders_containing.clone(),
            formatter,
            registry: RuleRegistry::default(),
        })
    }
}

/// What happened to one directory's barrel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated { backup: PathBuf },
    Unchanged,
    /// The directory has nothing to export any more; its stale barrel was backed up and deleted
    Removed { backup: PathBuf },
    /// Nothing to export and no barrel present
    Empty,
    /// The directory name contains a skip marker
    Skipped,
}

/// Summary of a sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub empty: usize,
    pub skipped: usize,
    pub failures: Vec<Error>,
}

impl SyncReport {
    fn record(&mut self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated { .. } => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
            SyncOutcome::Removed { .. } => self.removed += 1,
            SyncOutcome::Empty => self.empty += 1,
            SyncOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Whether any barrel was written or removed.
    pub fn changed(&self) -> bool {
        self.created + self.updated + self.removed > 0
    }
}

/// Collects `root` and its descendant directories, pruning ignored ones. Links are not
/// followed.
fn walk_dirs(root: &Path, ignore: &IgnoreRules) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| entry.file_type().is_dir() && !ignore.is_ignored(entry.path()));

    for entry in walker {
        match entry {
            Ok(entry) => dirs.push(entry.into_path()),
            Err(e) if e.depth() == 0 => return Err(Error::IoError(e.into())),
            Err(e) => warn!("Skipping unreadable directory: {e}"),
        }
    }
    Ok(dirs)
}

/// Barrel synchronization engine.
pub struct SyncEngine {
    options: SyncOptions,
    rule: Arc<dyn SyncRule>,
}

impl SyncEngine {
    pub fn new(options: SyncOptions) -> Self {
        let rule = options.registry.rule_for(&options.sync_ext);
        Self { options, rule }
    }

    /// `<barrelName><syncExt>`, e.g. `index.ts`.
    pub fn barrel_file_name(&self) -> String {
        format!("{}{}", self.options.barrel_name, self.options.sync_ext)
    }

    fn resolve(&self, dir: &Path) -> PathBuf {
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            absolute_path(&self.options.base_dir.join(dir))
        }
    }

    /// `root` and all its non-ignored descendant directories.
    pub async fn collect_dirs(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        let ignore = self.options.ignore.clone();
        tokio::task::spawn_blocking(move || walk_dirs(&root, &ignore))
            .await
            .map_err(|e| Error::IoError(std::io::Error::other(e)))?
    }

    /// Synchronizes every directory under the sync root.
    ///
    /// A missing or unreadable sync root is logged and reported as a failure.
    pub async fn run(&self) -> SyncReport {
        let base_dir = self.options.base_dir.clone();
        match self.collect_dirs(&base_dir).await {
            Ok(dirs) => self.sync_dirs(dirs).await,
            Err(e) => {
                warn!("Cannot sync {}: {e}", base_dir.display());
                SyncReport { failures: vec![Error::at(base_dir, e)], ..Default::default() }
            }
        }
    }

    /// Synchronizes the given directories and all their descendants.
    ///
    /// Relative directories are resolved against the sync root. Directories that cannot be
    /// read are reported as failures.
    pub async fn run_on(&self, dirs: &[PathBuf]) -> SyncReport {
        let mut selected = BTreeSet::new();
        let mut failures = Vec::new();

        for dir in dirs.iter().map(|d| self.resolve(d)) {
            if self.options.ignore.is_ignored(&dir) {
                debug!("{} is ignored", dir.display());
                continue;
            }
            match self.collect_dirs(&dir).await {
                Ok(found) => selected.extend(found),
                Err(e) => {
                    warn!("Cannot sync {}: {e}", dir.display());
                    failures.push(Error::at(dir, e));
                }
            }
        }

        let mut report = self.sync_dirs(selected.into_iter().collect()).await;
        failures.append(&mut report.failures);
        report.failures = failures;
        report
    }

    /// Synchronizes `dirs` one at a time, deepest first. Failures are logged and collected.
    pub async fn sync_dirs(&self, mut dirs: Vec<PathBuf>) -> SyncReport {
        dirs.sort_by(|a, b| {
            Reverse(a.components().count()).cmp(&Reverse(b.components().count())).then_with(|| a.cmp(b))
        });
        dirs.dedup();

        let mut report = SyncReport::default();
        for dir in dirs {
            match self.sync_dir(&dir).await {
                Ok(outcome) => {
                    debug!("{}: {outcome:?}", dir.display());
                    report.record(&outcome);
                }
                Err(e) => {
                    warn!("Failed to sync {}: {e}", dir.display());
                    report.failures.push(Error::at(dir, e));
                }
            }
        }

        if report.changed() {
            info!("Barrel synchronization finished");
        } else {
            info!("Barrels are up to date");
        }
        report
    }

    /// Lists exportable subfolders (non-ignored, holding a barrel) and all file names.
    async fn list_children(&self, dir: &Path) -> Result<(Vec<String>, Vec<String>)> {
        let barrel_file = self.barrel_file_name();
        let mut folders = Vec::new();
        let mut files = Vec::new();

        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            let Ok(name) = entry.file_name().into_string() else {
                warn!("Skipping non UTF-8 name in {}", dir.display());
                continue;
            };

            if file_type.is_dir() {
                let path = entry.path();
                if self.options.ignore.is_ignored(&path) {
                    continue;
                }
                if tokio::fs::try_exists(path.join(&barrel_file)).await? {
                    folders.push(name);
                }
            } else if file_type.is_file() {
                files.push(name);
            }
        }

        sort_names(&mut folders);
        Ok((folders, files))
    }

    /// Synchronizes the barrel of a single directory.
    pub async fn sync_dir(&self, dir: &Path) -> Result<SyncOutcome> {
        let dir = self.resolve(dir);
        let dir_name = dir.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.options.skip_markers.iter().any(|marker| !marker.is_empty() && dir_name.contains(marker.as_str())) {
            return Ok(SyncOutcome::Skipped);
        }

        let (folders, files) = self.list_children(&dir).await?;
        let barrel_name = &self.options.barrel_name;
        let exportables = self.rule.collect_exportables(&files, barrel_name);
        let barrel_path = dir.join(self.barrel_file_name());

        let Some(content) = self.rule.render_barrel(&folders, &exportables, barrel_name) else {
            return match read_existing(&barrel_path).await? {
                Some(_) => Ok(SyncOutcome::Removed { backup: remove_with_backup(&barrel_path).await? }),
                None => Ok(SyncOutcome::Empty),
            };
        };

        let formatted = format_or_original(self.options.formatter.as_ref(), &barrel_path, &content).await;
        Ok(match write_if_changed(&barrel_path, &formatted).await? {
            SaveOutcome::Created => SyncOutcome::Created,
            SaveOutcome::Updated { backup } => SyncOutcome::Updated { backup },
            SaveOutcome::Unchanged => SyncOutcome::Unchanged,
        })
    }
}
