//! Catalog records and their keyed in-memory stores.
//!
//! A [`Catalog`] is rebuilt from disk on every invocation by the loader; nothing here is
//! persisted. Each collection is a [`Repository`] keyed by the record's unique key, where the
//! last upsert for a key wins.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Variable mapping of a script, an entity or the user.
pub type Variables = BTreeMap<String, String>;

/// Well-known variable keys. Any other key is allowed as well.
pub mod vars {
    pub const ENTITY_NAME: &str = "entityName";
    pub const ENTITY_SMALL_NAME: &str = "entitySmallName";
    pub const ENTITY_BIG_NAME: &str = "entityBigName";
    pub const SCRIPT_NAME: &str = "scriptName";
    pub const SCRIPT_SMALL_NAME: &str = "scriptSmallName";
    pub const SCRIPT_BIG_NAME: &str = "scriptBigName";
    pub const PATH_NAME: &str = "pathName";
    pub const PATH: &str = "path";
}

/// Segment of an output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathSegment {
    Entity,
    Script,
}

/// Part of an output file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameSegment {
    Entity,
    Script,
    Template,
}

/// Common behaviour of records stored in a [`Repository`].
pub trait Record {
    /// Unique key within the record's collection.
    fn key(&self) -> &str;

    /// Assigns `key` when the source file did not declare one.
    fn default_key(&mut self, key: &str);

    /// Receives the body that followed the frontmatter block.
    fn set_content(&mut self, _content: String) {}
}

/// A named subject, e.g. a domain object, with its name-derived variables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Entity {
    pub name: String,
    pub variables: Variables,
    /// Preset keys; unknown keys are ignored where presets are consumed
    pub presets: IndexSet<String>,
}

/// A named generation recipe, independent of any entity.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Script {
    pub name: String,
    pub variables: Variables,
}

/// A reusable text fragment included with `{{> key}}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplatePart {
    pub key: String,
    pub content: String,
}

/// A text blueprint plus applicability rules and output-naming hints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Template {
    pub key: String,
    pub content: String,
    pub description: Option<String>,
    pub applicable_scripts: Vec<String>,
    pub non_applicable_scripts: Vec<String>,
    pub applicable_entities: Vec<String>,
    pub non_applicable_entities: Vec<String>,
    /// Falls back to the project's `outputExt` when absent
    pub output_ext: Option<String>,
    /// Output root relative to the project root
    pub output_path: Option<String>,
    pub path_order: Option<Vec<PathSegment>>,
    pub name_order: Option<Vec<NameSegment>>,
    /// Template's own file-name part; may contain `{{variables}}`
    pub path_name: Option<String>,
}

/// A named bundle of scripts usable with entities that reference it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preset {
    pub key: String,
    pub scripts: Vec<String>,
    pub description: Option<String>,
}

impl Record for Entity {
    fn key(&self) -> &str {
        &self.name
    }

    fn default_key(&mut self, key: &str) {
        if self.name.is_empty() {
            self.name = key.to_string();
        }
    }
}

impl Record for Script {
    fn key(&self) -> &str {
        &self.name
    }

    fn default_key(&mut self, key: &str) {
        if self.name.is_empty() {
            self.name = key.to_string();
        }
    }
}

impl Record for TemplatePart {
    fn key(&self) -> &str {
        &self.key
    }

    fn default_key(&mut self, key: &str) {
        if self.key.is_empty() {
            self.key = key.to_string();
        }
    }

    fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

impl Record for Template {
    fn key(&self) -> &str {
        &self.key
    }

    fn default_key(&mut self, key: &str) {
        if self.key.is_empty() {
            self.key = key.to_string();
        }
    }

    fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

impl Record for Preset {
    fn key(&self) -> &str {
        &self.key
    }

    fn default_key(&mut self, key: &str) {
        if self.key.is_empty() {
            self.key = key.to_string();
        }
    }
}

/// Keyed upsert/lookup store. Iteration follows first-insertion order of keys.
#[derive(Debug, Clone)]
pub struct Repository<T> {
    store: IndexMap<String, T>,
}

impl<T> Default for Repository<T> {
    fn default() -> Self {
        Self { store: IndexMap::new() }
    }
}

impl<T: Record> Repository<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all records.
    pub fn get_all(&self) -> Vec<&T> {
        self.store.values().collect()
    }

    /// Looks a record up by its key.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.store.get(key)
    }

    /// Inserts a record, replacing any record with the same key.
    pub fn upsert(&mut self, item: T) {
        self.store.insert(item.key().to_string(), item);
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.store.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl<T: Record> FromIterator<T> for Repository<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut repo = Self::new();
        for item in iter {
            repo.upsert(item);
        }
        repo
    }
}

/// All five catalog collections of a project.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub templates: Repository<Template>,
    pub parts: Repository<TemplatePart>,
    pub scripts: Repository<Script>,
    pub entities: Repository<Entity>,
    pub presets: Repository<Preset>,
}

impl Catalog {
    /// Resolves preset keys to presets, silently dropping unknown keys.
    pub fn resolve_presets<'a, I>(&self, keys: I) -> Vec<&Preset>
    where
        I: IntoIterator<Item = &'a String>,
    {
        keys.into_iter().filter_map(|key| self.presets.get(key)).collect()
    }

    /// Resolves script names to scripts, silently dropping unknown names.
    pub fn resolve_scripts<'a, I>(&self, names: I) -> Vec<&Script>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names.into_iter().filter_map(|name| self.scripts.get(name)).collect()
    }
}
