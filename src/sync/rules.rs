//! Barrel rules: what counts as exportable in a directory and how a barrel is written.
//!
//! Rules are looked up by the barrel extension through a [`RuleRegistry`]. Extensions without
//! a dedicated rule get the generic [`ReexportRule`].

use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// Per-syntax barrel strategy.
pub trait SyncRule: Send + Sync {
    /// Picks exportable module names (extension stripped, sorted) from the file names of a
    /// directory. The barrel itself, named `barrel_name` plus extension, is never exportable.
    fn collect_exportables(&self, files: &[String], barrel_name: &str) -> Vec<String>;

    /// Renders the barrel for `folders` and exportable `files`, or `None` when there is
    /// nothing to export.
    ///
    /// `folders` only lists subfolders that already hold a barrel of their own. The engine
    /// syncs directories deepest first, so a subfolder without exportable content never gets
    /// a barrel and is left out of its parent's.
    fn render_barrel(&self, folders: &[String], files: &[String], barrel_name: &str) -> Option<String>;
}

fn natural_order(a: &String, b: &String) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Sorts names case-insensitively, dropping duplicates.
pub fn sort_names(names: &mut Vec<String>) {
    names.sort_by(natural_order);
    names.dedup();
}

/// Module names of files ending in one of `extensions` and in none of `excluded_suffixes`.
fn collect_by_extension(
    files: &[String],
    barrel_name: &str,
    extensions: &[&str],
    excluded_suffixes: &[&str],
) -> Vec<String> {
    let mut modules: Vec<String> = files
        .iter()
        .filter_map(|file| {
            let lower = file.to_ascii_lowercase();
            if excluded_suffixes.iter().any(|suffix| lower.ends_with(&suffix.to_ascii_lowercase())) {
                return None;
            }
            let ext = extensions.iter().find(|ext| lower.ends_with(&ext.to_ascii_lowercase()))?;
            let module = &file[..file.len() - ext.len()];
            (!module.is_empty() && !module.eq_ignore_ascii_case(barrel_name))
                .then(|| module.to_string())
        })
        .collect();
    sort_names(&mut modules);
    modules
}

fn es_reexports(folders: &[String], files: &[String]) -> Option<String> {
    if folders.is_empty() && files.is_empty() {
        return None;
    }
    let lines: Vec<String> = folders
        .iter()
        .chain(files)
        .map(|name| format!("export * from './{name}';"))
        .collect();
    Some(format!("{}\n", lines.join("\n")))
}

/// ES module barrels (`export * from './x';`) for TypeScript or JavaScript sources.
#[derive(Debug, Clone, Copy)]
pub struct EsModuleRule {
    extensions: &'static [&'static str],
    excluded_suffixes: &'static [&'static str],
}

impl EsModuleRule {
    pub const TYPESCRIPT: Self = Self { extensions: &[".ts", ".tsx"], excluded_suffixes: &[".d.ts"] };
    pub const JAVASCRIPT: Self = Self { extensions: &[".js", ".jsx", ".mjs"], excluded_suffixes: &[] };
}

impl SyncRule for EsModuleRule {
    fn collect_exportables(&self, files: &[String], barrel_name: &str) -> Vec<String> {
        collect_by_extension(files, barrel_name, self.extensions, self.excluded_suffixes)
    }

    fn render_barrel(&self, folders: &[String], files: &[String], _barrel_name: &str) -> Option<String> {
        es_reexports(folders, files)
    }
}

/// Dart library barrels. Generated part files are not exported.
#[derive(Debug, Clone, Copy, Default)]
pub struct DartRule;

impl SyncRule for DartRule {
    fn collect_exportables(&self, files: &[String], barrel_name: &str) -> Vec<String> {
        collect_by_extension(files, barrel_name, &[".dart"], &[".g.dart", ".freezed.dart"])
    }

    fn render_barrel(&self, folders: &[String], files: &[String], barrel_name: &str) -> Option<String> {
        if folders.is_empty() && files.is_empty() {
            return None;
        }
        let lines: Vec<String> = folders
            .iter()
            .map(|folder| format!("export '{folder}/{barrel_name}.dart';"))
            .chain(files.iter().map(|file| format!("export '{file}.dart';")))
            .collect();
        Some(format!("{}\n", lines.join("\n")))
    }
}

/// Fallback rule: files with the barrel's own extension are re-exported ES-style.
#[derive(Debug, Clone)]
pub struct ReexportRule {
    ext: String,
}

impl ReexportRule {
    pub fn new<S: Into<String>>(ext: S) -> Self {
        Self { ext: ext.into() }
    }
}

impl SyncRule for ReexportRule {
    fn collect_exportables(&self, files: &[String], barrel_name: &str) -> Vec<String> {
        collect_by_extension(files, barrel_name, &[self.ext.as_str()], &[])
    }

    fn render_barrel(&self, folders: &[String], files: &[String], _barrel_name: &str) -> Option<String> {
        es_reexports(folders, files)
    }
}

/// Barrel extension → rule mapping.
#[derive(Clone)]
pub struct RuleRegistry {
    rules: IndexMap<String, Arc<dyn SyncRule>>,
}

impl RuleRegistry {
    /// A registry without any rules; every extension gets the fallback.
    pub fn empty() -> Self {
        Self { rules: IndexMap::new() }
    }

    /// Registers `rule` for `ext` (e.g. `.ts`), replacing any previous rule.
    pub fn register<R: SyncRule + 'static>(&mut self, ext: &str, rule: R) {
        self.rules.insert(ext.to_lowercase(), Arc::new(rule));
    }

    /// Rule for barrels with extension `ext`.
    pub fn rule_for(&self, ext: &str) -> Arc<dyn SyncRule> {
        match self.rules.get(&ext.to_lowercase()) {
            Some(rule) => Arc::clone(rule),
            None => Arc::new(ReexportRule::new(ext)),
        }
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(".ts", EsModuleRule::TYPESCRIPT);
        registry.register(".tsx", EsModuleRule::TYPESCRIPT);
        registry.register(".js", EsModuleRule::JAVASCRIPT);
        registry.register(".jsx", EsModuleRule::JAVASCRIPT);
        registry.register(".mjs", EsModuleRule::JAVASCRIPT);
        registry.register(".dart", DartRule);
        registry
    }
}
