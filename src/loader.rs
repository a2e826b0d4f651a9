//! Catalog loading.
//! Walks the catalog root's known subfolders, parses every `.hbs` source file into a record
//! and fills the [`Catalog`]. The five subfolders are loaded concurrently; a file that fails
//! to parse is logged and skipped without affecting its siblings.

use crate::catalog::{Catalog, Entity, Preset, Record, Repository, Script, Template, TemplatePart};
use crate::constants::{
    CATALOG_FILE_EXT, ENTITIES_DIR, MAX_WALK_DEPTH, PARTS_DIR, PRESETS_DIR, SCRIPTS_DIR,
    TEMPLATES_DIR,
};
use crate::error::{Error, Result};
use crate::frontmatter::parse_frontmatter;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loader for a catalog rooted at a base directory.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    base_dir: PathBuf,
}

impl CatalogLoader {
    /// Creates a loader for the catalog rooted at `base_dir`.
    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self { base_dir: base_dir.into() }
    }

    /// Loads all five collections concurrently.
    ///
    /// Missing subfolders yield empty collections; a project without presets or parts is
    /// perfectly normal.
    pub async fn load_all(&self) -> Catalog {
        debug!("Loading catalog from {}", self.base_dir.display());

        let (templates, parts, scripts, entities, presets) = tokio::join!(
            self.load_records::<Template>(TEMPLATES_DIR),
            self.load_records::<TemplatePart>(PARTS_DIR),
            self.load_records::<Script>(SCRIPTS_DIR),
            self.load_records::<Entity>(ENTITIES_DIR),
            self.load_records::<Preset>(PRESETS_DIR),
        );

        debug!(
            "Catalog loaded: {} templates, {} parts, {} scripts, {} entities, {} presets",
            templates.len(),
            parts.len(),
            scripts.len(),
            entities.len(),
            presets.len()
        );

        Catalog { templates, parts, scripts, entities, presets }
    }

    async fn load_records<T>(&self, subdir: &str) -> Repository<T>
    where
        T: Record + DeserializeOwned + Default,
    {
        let dir = self.base_dir.join(subdir);
        let mut repo = Repository::new();

        for path in collect_catalog_files(&dir).await {
            match load_record::<T>(&path).await {
                Ok(record) => repo.upsert(record),
                Err(e) => {
                    let relative = path.strip_prefix(&dir).unwrap_or(&path);
                    warn!("Skipping {subdir}/{}: {e}", relative.display());
                }
            }
        }

        repo
    }
}

/// Reads and parses a single catalog source file.
///
/// The file stem (without `.hbs`) becomes the record key when the frontmatter has none.
pub async fn load_record<T>(path: &Path) -> Result<T>
where
    T: Record + DeserializeOwned + Default,
{
    let raw = tokio::fs::read_to_string(path).await?;
    let (mut record, content) = parse_frontmatter(&raw)?.into_record::<T>()?;
    record.set_content(content);

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    record.default_key(stem);

    if record.key().is_empty() {
        return Err(Error::CatalogError(format!(
            "record in '{}' has no key",
            path.display()
        )));
    }
    Ok(record)
}

fn walk_catalog_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(true).max_depth(MAX_WALK_DEPTH);

    for entry in walker {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file()
                    && path.extension().is_some_and(|ext| ext == CATALOG_FILE_EXT)
                {
                    files.push(entry.into_path());
                }
            }
            Err(e) if e.loop_ancestor().is_some() => {
                warn!("Directory cycle detected, skipping: {e}");
            }
            Err(e) if e.depth() == 0 => debug!("Cannot read {}: {e}", root.display()),
            Err(e) => warn!("Skipping unreadable catalog entry: {e}"),
        }
    }

    files.sort();
    files
}

/// Recursively collects `.hbs` files under `root`, sorted by path.
///
/// Symlinks are followed; cycles are skipped with a warning and the walk stops at
/// [`MAX_WALK_DEPTH`]. A missing root yields no files.
pub async fn collect_catalog_files(root: &Path) -> Vec<PathBuf> {
    let root = root.to_path_buf();
    match tokio::task::spawn_blocking(move || walk_catalog_files(&root)).await {
        Ok(files) => files,
        Err(e) => {
            warn!("Catalog walk failed: {e}");
            Vec::new()
        }
    }
}
