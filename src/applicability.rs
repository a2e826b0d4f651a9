//! Template applicability.
//!
//! A template declares, per dimension (script and entity), an optional allow-list and an
//! optional deny-list:
//! 1. neither list → applicable
//! 2. non-empty allow-list → the name must be listed; the deny-list is ignored
//! 3. only a non-empty deny-list → the name must not be listed
//!
//! A template with an entity allow-list is never applicable without an entity. A deny-list
//! does not block the entity-less case.

use crate::catalog::{Entity, Script, Template};

fn dimension_ok(allow: &[String], deny: &[String], name: Option<&str>) -> bool {
    match name {
        Some(name) if !allow.is_empty() => allow.iter().any(|n| n == name),
        Some(name) => !deny.iter().any(|n| n == name),
        None => allow.is_empty(),
    }
}

/// Returns whether `template` can be generated for `script` and the optional `entity`.
pub fn is_applicable(template: &Template, script: &Script, entity: Option<&Entity>) -> bool {
    let script_ok = dimension_ok(
        &template.applicable_scripts,
        &template.non_applicable_scripts,
        Some(script.name.as_str()),
    );
    let entity_ok = dimension_ok(
        &template.applicable_entities,
        &template.non_applicable_entities,
        entity.map(|e| e.name.as_str()),
    );

    script_ok && entity_ok
}

/// Scripts with at least one applicable template for at least one of `entities`.
///
/// `None` in `entities` stands for generation without an entity.
pub fn scripts_with_templates<'a>(
    templates: &[&Template],
    scripts: &[&'a Script],
    entities: &[Option<&Entity>],
) -> Vec<&'a Script> {
    scripts
        .iter()
        .copied()
        .filter(|script| {
            templates
                .iter()
                .any(|tpl| entities.iter().any(|entity| is_applicable(tpl, script, *entity)))
        })
        .collect()
}

/// Templates applicable to at least one (script, entity) pair.
pub fn applicable_templates<'a>(
    templates: &[&'a Template],
    scripts: &[&Script],
    entities: &[Option<&Entity>],
) -> Vec<&'a Template> {
    templates
        .iter()
        .copied()
        .filter(|tpl| {
            scripts.iter().any(|script| {
                entities.iter().any(|entity| is_applicable(tpl, script, *entity))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn script(name: &str) -> Script {
        Script { name: name.to_string(), ..Default::default() }
    }

    fn entity(name: &str) -> Entity {
        Entity { name: name.to_string(), ..Default::default() }
    }

    #[test]
    fn test_no_lists_always_applicable() {
        let tpl = Template::default();
        assert!(is_applicable(&tpl, &script("create"), None));
        assert!(is_applicable(&tpl, &script("create"), Some(&entity("User"))));
    }

    #[test]
    fn test_entity_allow_list() {
        let tpl = Template { applicable_entities: names(&["User"]), ..Default::default() };
        let create = script("create");

        assert!(!is_applicable(&tpl, &create, None));
        assert!(is_applicable(&tpl, &create, Some(&entity("User"))));
        assert!(!is_applicable(&tpl, &create, Some(&entity("Order"))));
    }

    #[test]
    fn test_allow_list_overrides_deny_list() {
        let tpl = Template {
            applicable_scripts: names(&["create"]),
            non_applicable_scripts: names(&["create", "delete"]),
            ..Default::default()
        };
        assert!(is_applicable(&tpl, &script("create"), None));
        assert!(!is_applicable(&tpl, &script("update"), None));
    }

    #[test]
    fn test_deny_list_only() {
        let tpl = Template {
            non_applicable_scripts: names(&["delete"]),
            non_applicable_entities: names(&["Order"]),
            ..Default::default()
        };
        assert!(!is_applicable(&tpl, &script("delete"), None));
        assert!(is_applicable(&tpl, &script("create"), None));
        assert!(!is_applicable(&tpl, &script("create"), Some(&entity("Order"))));
        assert!(is_applicable(&tpl, &script("create"), Some(&entity("User"))));
    }

    #[test]
    fn test_scripts_with_templates_filters_unmatched_scripts() {
        let tpl = Template { applicable_scripts: names(&["create"]), ..Default::default() };
        let create = script("create");
        let remove = script("remove");

        let found = scripts_with_templates(&[&tpl], &[&create, &remove], &[None]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "create");
    }
}
