//! Output path and file name construction.

use crate::catalog::{vars, NameSegment, PathSegment, Template, Variables};
use crate::config::ProjectConfig;
use crate::constants::DEFAULT_SCRIPT_PATH_NAME;
use crate::renderer::{merge_variables, substitute_variables};
use cruet::Inflector;
use std::path::{Path, PathBuf};

/// Where and how one template is written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    /// Absolute output root
    pub output_path: PathBuf,
    pub output_ext: String,
    pub path_order: Vec<PathSegment>,
    pub name_order: Vec<NameSegment>,
}

impl OutputConfig {
    /// Effective output config of `template`: its own `outputPath`, `pathOrder` and
    /// `nameOrder` override the project's.
    pub fn for_template(template: &Template, config: &ProjectConfig, project_root: &Path) -> Self {
        let output_path = template
            .output_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&config.output_path);

        Self {
            output_path: project_root.join(output_path),
            output_ext: config.output_ext.clone(),
            path_order: template.path_order.clone().unwrap_or_else(|| config.path_order.clone()),
            name_order: template.name_order.clone().unwrap_or_else(|| config.name_order.clone()),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

/// Builds the output directory from the `path` variables in `pathOrder`.
pub fn build_path(output: &OutputConfig, entity_vars: &Variables, script_vars: &Variables) -> PathBuf {
    output
        .path_order
        .iter()
        .filter_map(|segment| match segment {
            PathSegment::Entity => non_empty(entity_vars.get(vars::PATH)),
            PathSegment::Script => non_empty(script_vars.get(vars::PATH)),
        })
        .fold(output.output_path.clone(), |dir, segment| dir.join(segment))
}

/// Builds the output file name.
///
/// Up to three parts are joined with `.` in `nameOrder`: the entity's `pathName`, the
/// script's `pathName` (or `script`) and the template's `pathName` after variable
/// substitution and kebab-case normalization. Empty parts are omitted. The template's
/// extension wins over the output config's.
pub fn build_name(
    entity_vars: &Variables,
    script_vars: &Variables,
    template: &Template,
    output: &OutputConfig,
    user_vars: &Variables,
) -> String {
    let template_part = template.path_name.as_deref().and_then(|raw| {
        let merged = merge_variables(script_vars, entity_vars, user_vars);
        let resolved = substitute_variables(raw, &merged);
        let resolved = resolved.trim();
        (!resolved.is_empty()).then(|| resolved.to_kebab_case())
    });

    let parts: Vec<String> = output
        .name_order
        .iter()
        .filter_map(|segment| match segment {
            NameSegment::Entity => non_empty(entity_vars.get(vars::PATH_NAME)).map(str::to_string),
            NameSegment::Script => Some(
                non_empty(script_vars.get(vars::PATH_NAME))
                    .unwrap_or(DEFAULT_SCRIPT_PATH_NAME)
                    .to_string(),
            ),
            NameSegment::Template => template_part.clone().filter(|p| !p.is_empty()),
        })
        .collect();

    let ext = template
        .output_ext
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or(&output.output_ext);

    format!("{}{}", parts.join("."), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn output() -> OutputConfig {
        let config = ProjectConfig::default();
        OutputConfig::for_template(&Template::default(), &config, Path::new("/project"))
    }

    #[test]
    fn test_build_name_default_order() {
        let name = build_name(
            &vars(&[("pathName", "user")]),
            &vars(&[("pathName", "create")]),
            &Template { path_name: Some("  ".to_string()), ..Default::default() },
            &output(),
            &Variables::new(),
        );
        assert_eq!(name, "user.create.ts");
    }

    #[test]
    fn test_build_name_template_part_is_normalized() {
        let template = Template {
            path_name: Some("{{entityBigName}}Form".to_string()),
            output_ext: Some(".tsx".to_string()),
            ..Default::default()
        };
        let name = build_name(
            &vars(&[("pathName", "user"), ("entityBigName", "UserProfile")]),
            &Variables::new(),
            &template,
            &output(),
            &Variables::new(),
        );
        assert_eq!(name, "user.script.user-profile-form.tsx");
    }

    #[test]
    fn test_build_name_custom_order() {
        let mut out = output();
        out.name_order = vec![NameSegment::Template, NameSegment::Entity];
        let template = Template { path_name: Some("dto".to_string()), ..Default::default() };
        let name =
            build_name(&vars(&[("pathName", "user")]), &Variables::new(), &template, &out, &Variables::new());
        assert_eq!(name, "dto.user.ts");
    }

    #[test]
    fn test_build_path_skips_empty_segments() {
        let out = output();
        let dir = build_path(&out, &vars(&[("path", "users")]), &vars(&[("path", "")]));
        assert_eq!(dir, PathBuf::from("/project/src/generated/users"));

        let mut out = output();
        out.path_order = vec![PathSegment::Script, PathSegment::Entity];
        let dir = build_path(&out, &vars(&[("path", "users")]), &vars(&[("path", "create")]));
        assert_eq!(dir, PathBuf::from("/project/src/generated/create/users"));
    }

    #[test]
    fn test_template_output_path_overrides_project() {
        let template = Template { output_path: Some("lib/api".to_string()), ..Default::default() };
        let out = OutputConfig::for_template(&template, &ProjectConfig::default(), Path::new("/p"));
        assert_eq!(out.output_path, PathBuf::from("/p/lib/api"));
    }
}
