//! Template body resolution.
//!
//! Resolution is plain regex-driven text rewriting in three ordered passes:
//! 1. dynamic partial names: `{{> {{pathName}}-form}}` becomes `{{> user-form}}`
//! 2. variables: `{{KEY}}` becomes the merged variable value, or nothing
//! 3. partials: `{{> key}}` becomes the part's content, or nothing
//!
//! Partial expansion is a single pass; markers inside an inserted part stay as they are.

use crate::catalog::{Repository, Template, TemplatePart, Variables};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static DYNAMIC_PARTIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{>\s*\{\{\s*(\w+)\s*\}\}\s*-\s*([^\s}]+)\s*\}\}").expect("valid regex")
});
static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid regex"));
static PARTIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{>\s*([^\s}]+)\s*\}\}").expect("valid regex"));

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template body with an already merged variable mapping.
    fn render(&self, body: &str, vars: &Variables) -> String;
}

/// Merges variable layers; later layers win (script < entity < user).
pub fn merge_variables(
    script_vars: &Variables,
    entity_vars: &Variables,
    user_vars: &Variables,
) -> Variables {
    let mut merged = script_vars.clone();
    merged.extend(entity_vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.extend(user_vars.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Rewrites `{{> {{X}}-suffix}}` into a concrete partial marker.
pub fn resolve_dynamic_partials(text: &str, vars: &Variables) -> String {
    DYNAMIC_PARTIAL
        .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) if !value.is_empty() => format!("{{{{> {}-{}}}}}", value, &caps[2]),
            _ => String::new(),
        })
        .into_owned()
}

/// Replaces every `{{KEY}}` with its value; unknown keys become empty.
pub fn substitute_variables(text: &str, vars: &Variables) -> String {
    VARIABLE
        .replace_all(text, |caps: &Captures| vars.get(&caps[1]).cloned().unwrap_or_default())
        .into_owned()
}

/// Renderer that expands variables and template parts from a part repository.
pub struct PartialRenderer<'a> {
    parts: &'a Repository<TemplatePart>,
}

impl<'a> PartialRenderer<'a> {
    pub fn new(parts: &'a Repository<TemplatePart>) -> Self {
        Self { parts }
    }

    /// Replaces every `{{> key}}` with the part's content, one level deep.
    pub fn expand_partials(&self, text: &str) -> String {
        PARTIAL
            .replace_all(text, |caps: &Captures| {
                self.parts.get(&caps[1]).map(|part| part.content.clone()).unwrap_or_default()
            })
            .into_owned()
    }

    /// Resolves a template body for one script/entity combination.
    ///
    /// # Arguments
    /// * `template` - Template whose body is resolved
    /// * `entity_vars` - Entity variables, empty when generating without an entity
    /// * `script_vars` - Script variables
    /// * `user_vars` - Ad-hoc variables, highest precedence
    pub fn resolve(
        &self,
        template: &Template,
        entity_vars: &Variables,
        script_vars: &Variables,
        user_vars: &Variables,
    ) -> String {
        let vars = merge_variables(script_vars, entity_vars, user_vars);
        self.render(&template.content, &vars)
    }
}

impl TemplateRenderer for PartialRenderer<'_> {
    fn render(&self, body: &str, vars: &Variables) -> String {
        let text = resolve_dynamic_partials(body, vars);
        let text = substitute_variables(&text, vars);
        self.expand_partials(&text)
    }
}
