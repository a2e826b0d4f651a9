//! codesmith's main application entry point and orchestration logic.
//! Handles command-line argument parsing, catalog loading and dispatch to the generation and
//! sync pipelines.

use std::path::{Path, PathBuf};

use codesmith::{
    catalog::Catalog,
    cli::{get_args, user_variables, Args, Command},
    config::{load_config, ProjectConfig},
    error::{default_error_handler, Error, Result},
    generator::{
        formatter_from_config, persister_from_config, select_for_generation, select_for_presets,
        GenerationReport, Generator,
    },
    ignore::absolute_path,
    loader::CatalogLoader,
    prompt::{AcceptAll, DialoguerSelector, Selector},
    sync::{SyncEngine, SyncOptions},
};

/// Main application entry point.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = get_args();

    // Logger configuration
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    if let Err(err) = run(args).await {
        match err {
            Error::SelectionCancelled(reason) => log::warn!("Nothing to do: {reason}"),
            err => default_error_handler(err),
        }
    }
}

fn selector(yes: bool) -> Box<dyn Selector> {
    if yes {
        Box::new(AcceptAll)
    } else {
        Box::new(DialoguerSelector::new())
    }
}

async fn load_catalog(config: &ProjectConfig, project_root: &Path) -> Catalog {
    let catalog = CatalogLoader::new(config.catalog_dir(project_root)).load_all().await;
    log::debug!(
        "Catalog: {} templates, {} parts, {} scripts, {} entities, {} presets",
        catalog.templates.len(),
        catalog.parts.len(),
        catalog.scripts.len(),
        catalog.entities.len(),
        catalog.presets.len()
    );
    catalog
}

fn print_report(report: &GenerationReport) {
    let groups: [(&str, &Vec<PathBuf>); 4] = [
        ("Created", &report.created),
        ("Updated", &report.updated),
        ("Unchanged", &report.unchanged),
        ("Restored", &report.restored),
    ];
    for (action, paths) in groups {
        for path in paths {
            println!("{action}: '{}'", path.display());
        }
    }
    for path in &report.missing_backups {
        println!("No backup: '{}'", path.display());
    }
}

/// Main application logic execution.
///
/// # Flow
/// 1. Loads `codegen.json` from the project root
/// 2. Loads the catalog (generation commands only)
/// 3. Selects what to generate, from filters or prompts
/// 4. Generates, restores or synchronizes
async fn run(args: Args) -> Result<()> {
    let project_root = absolute_path(&args.project);
    let config = load_config(&project_root).await;

    match args.command {
        Command::Generate(generate) => {
            let catalog = load_catalog(&config, &project_root).await;
            let selector = selector(generate.selection.yes);
            let selection =
                select_for_generation(&catalog, &generate.selection.filters(), &*selector)?;
            let user_vars = user_variables(&generate.vars);

            let persister = persister_from_config(&config, &project_root);
            let generator = Generator::new(&catalog, &config, &project_root, persister);
            print_report(&generator.generate_all(&selection, &user_vars).await);
        }
        Command::Preset(preset) => {
            let catalog = load_catalog(&config, &project_root).await;
            let selector = selector(preset.yes);
            let selection = select_for_presets(&catalog, &preset.filters(), &*selector)?;
            let user_vars = user_variables(&preset.vars);

            let persister = persister_from_config(&config, &project_root);
            let generator = Generator::new(&catalog, &config, &project_root, persister);
            print_report(&generator.generate_presets(&selection, &user_vars).await);
        }
        Command::Restore(restore) => {
            let catalog = load_catalog(&config, &project_root).await;
            let selector = selector(restore.selection.yes);
            let selection =
                select_for_generation(&catalog, &restore.selection.filters(), &*selector)?;
            let user_vars = user_variables(&restore.vars);

            let persister = persister_from_config(&config, &project_root);
            let generator = Generator::new(&catalog, &config, &project_root, persister);
            print_report(&generator.restore_all(&selection, &user_vars).await);
        }
        Command::Sync { dirs } => {
            let options =
                SyncOptions::from_config(&config, &project_root, formatter_from_config(&config))?;
            let engine = SyncEngine::new(options);
            let report = if dirs.is_empty() { engine.run().await } else { engine.run_on(&dirs).await };
            println!(
                "Barrels: {} created, {} updated, {} removed, {} unchanged, {} skipped, {} failed",
                report.created,
                report.updated,
                report.removed,
                report.unchanged,
                report.skipped,
                report.failures.len()
            );
        }
    }
    Ok(())
}
