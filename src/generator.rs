//! Generation pipeline.
//!
//! Turns a selection of templates, scripts and entities into generated files. Every
//! (template, script, entity) combination that passes the applicability check becomes a
//! [`GenerationRequest`]. The request is resolved into a body, a directory and a file name,
//! then handed to the [`FilePersister`].
//!
//! Combinations are processed one at a time. A failing combination is logged and recorded
//! in the [`GenerationReport`]; the remaining ones still run.

use crate::applicability::{applicable_templates, is_applicable, scripts_with_templates};
use crate::catalog::{Catalog, Entity, Record, Script, Template, Variables};
use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::formatter::{CommandFormatter, Formatter, NoopFormatter};
use crate::naming::{build_name, build_path, OutputConfig};
use crate::persistence::{restore_latest, FilePersister, PathComment, SaveOutcome};
use crate::prompt::{choose, Selector};
use crate::renderer::PartialRenderer;
use indexmap::IndexSet;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const NO_ENTITY_LABEL: &str = "(no entity)";

/// One template rendered for one script and optional entity.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub template: &'a Template,
    pub script: &'a Script,
    pub entity: Option<&'a Entity>,
    pub output: OutputConfig,
    pub user_vars: &'a Variables,
}

/// Name filters given on the command line. Empty lists mean "ask".
#[derive(Debug, Clone, Default)]
pub struct Filters {
    pub entities: Vec<String>,
    /// Generate without an entity
    pub no_entity: bool,
    pub scripts: Vec<String>,
    pub templates: Vec<String>,
    pub presets: Vec<String>,
}

/// Templates, scripts and entities chosen for a run. `None` in `entities` stands for
/// generation without an entity.
#[derive(Debug, Clone, Default)]
pub struct Selection<'a> {
    pub templates: Vec<&'a Template>,
    pub scripts: Vec<&'a Script>,
    pub entities: Vec<Option<&'a Entity>>,
}

/// Summary of a generation or restore run.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub restored: Vec<PathBuf>,
    /// Restore targets without any backup
    pub missing_backups: Vec<PathBuf>,
    pub failures: Vec<Error>,
}

impl GenerationReport {
    fn record(&mut self, path: PathBuf, outcome: SaveOutcome) {
        match outcome {
            SaveOutcome::Created => self.created.push(path),
            SaveOutcome::Updated { .. } => self.updated.push(path),
            SaveOutcome::Unchanged => self.unchanged.push(path),
        }
    }

    /// Number of files written.
    pub fn written(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

fn entity_label(entity: &Option<&Entity>) -> String {
    entity.map_or_else(|| NO_ENTITY_LABEL.to_string(), |e| e.name.clone())
}

fn template_label(template: &&Template) -> String {
    match template.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{} - {}", template.key, description),
        None => template.key.clone(),
    }
}

/// Picks `wanted` records by key, keeping the order of `candidates`. Unknown keys are warned
/// about and dropped.
fn filter_by_key<'a, T: Record>(kind: &str, candidates: Vec<&'a T>, wanted: &[String]) -> Result<Vec<&'a T>> {
    for key in wanted {
        if !candidates.iter().any(|c| c.key() == key) {
            warn!("Unknown or inapplicable {kind} '{key}' ignored");
        }
    }
    let picked: Vec<&T> = candidates
        .into_iter()
        .filter(|c| wanted.iter().any(|key| key == c.key()))
        .collect();
    if picked.is_empty() {
        return Err(Error::SelectionCancelled(format!("no matching {kind}")));
    }
    Ok(picked)
}

/// Filters `candidates` by `wanted` keys, or lets the user choose when no key is given.
fn pick<'a, T, F>(
    selector: &dyn Selector,
    kind: &str,
    candidates: Vec<&'a T>,
    wanted: &[String],
    label: F,
) -> Result<Vec<&'a T>>
where
    T: Record,
    F: Fn(&&'a T) -> String,
{
    if wanted.is_empty() {
        choose(selector, &format!("Select {kind}s"), candidates, label)
    } else {
        filter_by_key(kind, candidates, wanted)
    }
}

fn pick_entities<'a>(
    catalog: &'a Catalog,
    filters: &Filters,
    selector: &dyn Selector,
) -> Result<Vec<Option<&'a Entity>>> {
    if filters.no_entity {
        return Ok(vec![None]);
    }
    let all = catalog.entities.get_all();
    if !filters.entities.is_empty() {
        return Ok(filter_by_key("entity", all, &filters.entities)?.into_iter().map(Some).collect());
    }

    let mut candidates: Vec<Option<&Entity>> = all.into_iter().map(Some).collect();
    candidates.push(None);
    choose(selector, "Select entities", candidates, entity_label)
}

/// Builds the selection for the generate and restore commands.
///
/// # Flow
/// 1. Entities, plus the "no entity" choice
/// 2. Scripts that have an applicable template for one of those entities
/// 3. Templates applicable to one of the chosen (script, entity) pairs
///
/// # Errors
/// * `Error::SelectionCancelled` if a step ends up with nothing selected
pub fn select_for_generation<'a>(
    catalog: &'a Catalog,
    filters: &Filters,
    selector: &dyn Selector,
) -> Result<Selection<'a>> {
    let all_templates = catalog.templates.get_all();
    let entities = pick_entities(catalog, filters, selector)?;

    let scripts = scripts_with_templates(&all_templates, &catalog.scripts.get_all(), &entities);
    let scripts = pick(selector, "script", scripts, &filters.scripts, |s| s.name.clone())?;

    let templates = applicable_templates(&all_templates, &scripts, &entities);
    let templates = pick(selector, "template", templates, &filters.templates, template_label)?;

    Ok(Selection { templates, scripts, entities })
}

/// Entities chosen for the preset command together with the chosen preset keys.
#[derive(Debug, Clone)]
pub struct PresetSelection<'a> {
    pub entities: Vec<&'a Entity>,
    pub presets: IndexSet<String>,
}

/// Builds the selection for the preset command.
///
/// Only entities that declare presets are offered. Preset keys that do not exist in the
/// catalog are ignored.
///
/// # Errors
/// * `Error::SelectionCancelled` if no entity or no known preset is selected
pub fn select_for_presets<'a>(
    catalog: &'a Catalog,
    filters: &Filters,
    selector: &dyn Selector,
) -> Result<PresetSelection<'a>> {
    let candidates: Vec<&Entity> = catalog
        .entities
        .get_all()
        .into_iter()
        .filter(|e| !e.presets.is_empty())
        .collect();
    let entities = pick(selector, "entity", candidates, &filters.entities, |e| e.name.clone())?;

    let declared: IndexSet<&String> = entities.iter().flat_map(|e| e.presets.iter()).collect();
    let known = catalog.resolve_presets(declared);
    let presets = pick(selector, "preset", known, &filters.presets, |p| match &p.description {
        Some(description) => format!("{} - {}", p.key, description),
        None => p.key.clone(),
    })?;

    Ok(PresetSelection {
        entities,
        presets: presets.into_iter().map(|p| p.key.clone()).collect(),
    })
}

/// Creates the persister described by the project configuration.
pub fn persister_from_config(config: &ProjectConfig, project_root: &Path) -> FilePersister {
    let persister = FilePersister::new(formatter_from_config(config));
    if config.path_comment {
        persister.with_path_comment(PathComment::new(
            project_root.to_path_buf(),
            config.comment_removal_patterns.clone(),
            config.comment_extensions.clone(),
        ))
    } else {
        persister
    }
}

/// External command formatter when `formatters` is configured, a no-op otherwise.
pub fn formatter_from_config(config: &ProjectConfig) -> Arc<dyn Formatter> {
    if config.formatters.is_empty() {
        Arc::new(NoopFormatter)
    } else {
        Arc::new(CommandFormatter::new(config.formatters.clone()))
    }
}

/// Drives generation for one loaded catalog.
pub struct Generator<'a> {
    catalog: &'a Catalog,
    config: &'a ProjectConfig,
    project_root: PathBuf,
    persister: FilePersister,
}

impl<'a> Generator<'a> {
    pub fn new<P: Into<PathBuf>>(
        catalog: &'a Catalog,
        config: &'a ProjectConfig,
        project_root: P,
        persister: FilePersister,
    ) -> Self {
        Self { catalog, config, project_root: project_root.into(), persister }
    }

    /// Builds the request for one combination with the template's effective output config.
    pub fn request(
        &self,
        template: &'a Template,
        script: &'a Script,
        entity: Option<&'a Entity>,
        user_vars: &'a Variables,
    ) -> GenerationRequest<'a> {
        GenerationRequest {
            template,
            script,
            entity,
            output: OutputConfig::for_template(template, self.config, &self.project_root),
            user_vars,
        }
    }

    /// Output directory and file name of a request.
    pub fn target(&self, request: &GenerationRequest<'_>) -> (PathBuf, String) {
        let empty = Variables::new();
        let entity_vars = request.entity.map_or(&empty, |e| &e.variables);
        let script_vars = &request.script.variables;

        let dir = build_path(&request.output, entity_vars, script_vars);
        let name = build_name(entity_vars, script_vars, request.template, &request.output, request.user_vars);
        (dir, name)
    }

    /// Renders and saves one request.
    ///
    /// # Returns
    /// * `Result<(PathBuf, SaveOutcome)>` - The target file and what happened to it
    ///
    /// # Errors
    /// * `Error::CatalogError` if the template does not apply to the script and entity
    /// * `Error::IoError` if the file cannot be written
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> Result<(PathBuf, SaveOutcome)> {
        if !is_applicable(request.template, request.script, request.entity) {
            return Err(Error::CatalogError(format!(
                "template '{}' does not apply to script '{}' and entity '{}'",
                request.template.key,
                request.script.name,
                entity_label(&request.entity),
            )));
        }

        let empty = Variables::new();
        let entity_vars = request.entity.map_or(&empty, |e| &e.variables);
        let body = PartialRenderer::new(&self.catalog.parts).resolve(
            request.template,
            entity_vars,
            &request.script.variables,
            request.user_vars,
        );

        let (dir, name) = self.target(request);
        let outcome = self.persister.save(&dir, &name, &body).await?;
        Ok((dir.join(name), outcome))
    }

    /// Applicable requests of a selection, template by template.
    fn requests(&self, selection: &Selection<'a>, user_vars: &'a Variables) -> Vec<GenerationRequest<'a>> {
        let mut requests = Vec::new();
        for &template in &selection.templates {
            for &script in &selection.scripts {
                for &entity in &selection.entities {
                    if is_applicable(template, script, entity) {
                        requests.push(self.request(template, script, entity, user_vars));
                    } else {
                        debug!(
                            "Skipping '{}' for {} / {}",
                            template.key,
                            script.name,
                            entity_label(&entity)
                        );
                    }
                }
            }
        }
        requests
    }

    async fn run_requests(&self, requests: Vec<GenerationRequest<'_>>) -> GenerationReport {
        let mut report = GenerationReport::default();
        for request in requests {
            match self.generate(&request).await {
                Ok((path, outcome)) => {
                    debug!("{}: {outcome:?}", path.display());
                    report.record(path, outcome);
                }
                Err(e) => {
                    let (dir, name) = self.target(&request);
                    warn!("Failed to generate '{}': {e}", request.template.key);
                    report.failures.push(Error::at(dir.join(name), e));
                }
            }
        }
        info!(
            "Generated {} file(s), {} unchanged, {} failed",
            report.written(),
            report.unchanged.len(),
            report.failures.len()
        );
        report
    }

    /// Generates every applicable combination of `selection`.
    pub async fn generate_all(&self, selection: &Selection<'a>, user_vars: &'a Variables) -> GenerationReport {
        let requests = self.requests(selection, user_vars);
        self.run_requests(requests).await
    }

    /// Generates, per entity, the templates applicable to the scripts of its selected presets.
    ///
    /// An entity only receives the presets it declares itself; unknown preset keys and
    /// unknown script names are ignored.
    pub async fn generate_presets(
        &self,
        selection: &PresetSelection<'a>,
        user_vars: &'a Variables,
    ) -> GenerationReport {
        let all_templates = self.catalog.templates.get_all();
        let mut requests = Vec::new();

        for &entity in &selection.entities {
            let keys = entity.presets.iter().filter(|key| selection.presets.contains(*key));
            let script_names: IndexSet<&String> = self
                .catalog
                .resolve_presets(keys)
                .into_iter()
                .flat_map(|preset| preset.scripts.iter())
                .collect();
            let scripts = self.catalog.resolve_scripts(script_names);
            if scripts.is_empty() {
                warn!("Presets of '{}' name no known script", entity.name);
                continue;
            }

            let entities = [Some(entity)];
            let partial = Selection {
                templates: applicable_templates(&all_templates, &scripts, &entities),
                scripts,
                entities: entities.to_vec(),
            };
            requests.extend(self.requests(&partial, user_vars));
        }

        self.run_requests(requests).await
    }

    /// Restores the newest backup of every file the selection would generate.
    ///
    /// `user_vars` must match the ones used for generation, since they can take part in file
    /// names.
    pub async fn restore_all(&self, selection: &Selection<'a>, user_vars: &'a Variables) -> GenerationReport {
        let mut report = GenerationReport::default();

        for &template in &selection.templates {
            for &script in &selection.scripts {
                for &entity in &selection.entities {
                    if !is_applicable(template, script, entity) {
                        continue;
                    }
                    let request = self.request(template, script, entity, user_vars);
                    let (dir, name) = self.target(&request);
                    let path = dir.join(&name);
                    match restore_latest(&dir, &name).await {
                        Ok(Some(backup)) => {
                            debug!("Restored {} from {}", path.display(), backup.display());
                            report.restored.push(path);
                        }
                        Ok(None) => report.missing_backups.push(path),
                        Err(e) => {
                            warn!("Failed to restore {}: {e}", path.display());
                            report.failures.push(Error::at(path, e));
                        }
                    }
                }
            }
        }

        info!(
            "Restored {} file(s), {} without backup",
            report.restored.len(),
            report.missing_backups.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::AcceptAll;

    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.entities.upsert(Entity { name: "user".to_string(), ..Default::default() });
        catalog.scripts.upsert(Script { name: "create".to_string(), ..Default::default() });
        catalog.scripts.upsert(Script { name: "delete".to_string(), ..Default::default() });
        catalog.templates.upsert(Template {
            key: "dto".to_string(),
            applicable_scripts: vec!["create".to_string()],
            applicable_entities: vec!["user".to_string()],
            ..Default::default()
        });
        catalog
    }

    #[test]
    fn test_selection_narrows_scripts() {
        let catalog = catalog();
        let selection = select_for_generation(&catalog, &Filters::default(), &AcceptAll).unwrap();
        let scripts: Vec<&str> = selection.scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(scripts, vec!["create"]);
        assert_eq!(selection.entities.len(), 2);
    }

    #[test]
    fn test_unknown_filter_cancels() {
        let catalog = catalog();
        let filters = Filters { scripts: vec!["missing".to_string()], ..Default::default() };
        let result = select_for_generation(&catalog, &filters, &AcceptAll);
        assert!(matches!(result, Err(Error::SelectionCancelled(_))));
    }

    #[test]
    fn test_no_entity_leaves_entity_bound_templates_out() {
        let catalog = catalog();
        let filters = Filters { no_entity: true, ..Default::default() };
        let result = select_for_generation(&catalog, &filters, &AcceptAll);
        assert!(matches!(result, Err(Error::SelectionCancelled(_))));
    }
}
