use codesmith::loader::{collect_catalog_files, load_record, CatalogLoader};
use codesmith::catalog::{Entity, PathSegment, Template};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test_log::test(tokio::test)]
async fn test_load_all_collections() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "_templates/api/create.hbs",
        "---\ndescription: Create DTO\napplicableScripts: [create]\npathOrder: [script, entity]\n---\n  export class {{entityBigName}} {}\n",
    );
    write(root, "t-parts/header.hbs", "// header\n");
    write(root, "_scripts/create.hbs", "---\nvariables:\n  pathName: create\n  path: create\n---\n");
    write(
        root,
        "_entities/user.hbs",
        "---\nname: user\nvariables:\n  pathName: user\npresets: [crud, missing]\n---\n",
    );
    write(root, "_e.presets/crud.hbs", "---\nscripts: [create, delete]\n---\n");

    let catalog = CatalogLoader::new(root).load_all().await;

    let template = catalog.templates.get("create").unwrap();
    assert_eq!(template.description.as_deref(), Some("Create DTO"));
    assert_eq!(template.applicable_scripts, vec!["create".to_string()]);
    assert_eq!(template.path_order, Some(vec![PathSegment::Script, PathSegment::Entity]));
    assert_eq!(template.content, "  export class {{entityBigName}} {}\n");

    assert_eq!(catalog.parts.get("header").unwrap().content, "// header\n");
    assert_eq!(
        catalog.scripts.get("create").unwrap().variables.get("path").map(String::as_str),
        Some("create")
    );

    let user = catalog.entities.get("user").unwrap();
    assert_eq!(user.presets.len(), 2);
    assert_eq!(catalog.resolve_presets(&user.presets).len(), 1);
    assert_eq!(catalog.presets.get("crud").unwrap().scripts.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_malformed_file_is_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "_templates/good.hbs", "---\nkey: good\n---\nok\n");
    write(root, "_templates/unclosed.hbs", "---\nkey: broken\nbody\n");
    write(root, "_templates/bad-yaml.hbs", "---\nkey: [unterminated\n---\nbody\n");
    write(root, "_templates/wrong-type.hbs", "---\napplicableScripts: 42\n---\nbody\n");
    write(root, "_templates/notes.txt", "not a catalog file");

    let catalog = CatalogLoader::new(root).load_all().await;

    assert_eq!(catalog.templates.len(), 1);
    assert!(catalog.templates.get("good").is_some());
}

#[tokio::test]
async fn test_missing_catalog_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = CatalogLoader::new(temp_dir.path().join("nope")).load_all().await;

    assert!(catalog.templates.is_empty());
    assert!(catalog.entities.is_empty());
    assert!(catalog.presets.is_empty());
}

#[tokio::test]
async fn test_last_loaded_record_wins() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "_templates/a/dto.hbs", "---\nkey: dto\n---\nfirst\n");
    write(root, "_templates/b/dto.hbs", "---\nkey: dto\n---\nsecond\n");

    let catalog = CatalogLoader::new(root).load_all().await;

    assert_eq!(catalog.templates.len(), 1);
    assert_eq!(catalog.templates.get("dto").unwrap().content, "second\n");
}

#[tokio::test]
async fn test_key_defaults_to_file_stem() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "order.hbs", "---\nvariables:\n  pathName: order\n---\n");

    let entity: Entity = load_record(&temp_dir.path().join("order.hbs")).await.unwrap();
    assert_eq!(entity.name, "order");

    write(temp_dir.path(), "plain.hbs", "no frontmatter {{x}}");
    let template: Template = load_record(&temp_dir.path().join("plain.hbs")).await.unwrap();
    assert_eq!(template.key, "plain");
    assert_eq!(template.content, "no frontmatter {{x}}");
}

#[cfg(unix)]
#[test_log::test(tokio::test)]
async fn test_symlink_cycle_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "nested/a.hbs", "a");
    std::os::unix::fs::symlink(root, root.join("nested/loop")).unwrap();

    let files = collect_catalog_files(root).await;
    assert_eq!(files, vec![root.join("nested/a.hbs")]);
}
