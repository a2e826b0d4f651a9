//! Command-line interface implementation for codesmith.
//! Provides argument parsing and help text formatting using clap.

use crate::catalog::Variables;
use crate::generator::Filters;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for codesmith.
#[derive(Parser, Debug)]
#[command(author, version, about = "codesmith: catalog-driven file generation and barrel sync", long_about = None)]
pub struct Args {
    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root holding codegen.json
    #[arg(short, long, value_name = "PROJECT", default_value = ".", global = true)]
    pub project: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate files from templates for the selected scripts and entities
    Generate(GenerateArgs),

    /// Generate files for the presets declared by entities
    Preset(PresetArgs),

    /// Restore the newest backup of files the selection would generate
    Restore(GenerateArgs),

    /// Synchronize barrel files under the sync root, or under the given directories only
    Sync {
        /// Directories to synchronize, relative to the sync root or absolute
        #[arg(value_name = "DIR")]
        dirs: Vec<PathBuf>,
    },
}

/// Template, script and entity filters.
#[derive(clap::Args, Debug, Default)]
pub struct SelectionArgs {
    /// Entity name (repeatable); prompts when omitted
    #[arg(long = "entity", value_name = "NAME")]
    pub entities: Vec<String>,

    /// Generate without an entity
    #[arg(long, conflicts_with = "entities")]
    pub no_entity: bool,

    /// Script name (repeatable); prompts when omitted
    #[arg(long = "script", value_name = "NAME")]
    pub scripts: Vec<String>,

    /// Template key (repeatable); prompts when omitted
    #[arg(long = "template", value_name = "KEY")]
    pub templates: Vec<String>,

    /// Accept every candidate instead of prompting
    #[arg(short, long)]
    pub yes: bool,
}

impl SelectionArgs {
    pub fn filters(&self) -> Filters {
        Filters {
            entities: self.entities.clone(),
            no_entity: self.no_entity,
            scripts: self.scripts.clone(),
            templates: self.templates.clone(),
            presets: Vec::new(),
        }
    }
}

/// Selection plus `--var` overrides, shared by `generate` and `restore`.
#[derive(clap::Args, Debug, Default)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Extra template variable, overriding script and entity variables
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
}

#[derive(clap::Args, Debug, Default)]
pub struct PresetArgs {
    /// Entity name (repeatable); prompts when omitted
    #[arg(long = "entity", value_name = "NAME")]
    pub entities: Vec<String>,

    /// Preset key (repeatable); prompts when omitted
    #[arg(long = "preset", value_name = "KEY")]
    pub presets: Vec<String>,

    /// Extra template variable, overriding script and entity variables
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Accept every candidate instead of prompting
    #[arg(short, long)]
    pub yes: bool,
}

impl PresetArgs {
    pub fn filters(&self) -> Filters {
        Filters {
            entities: self.entities.clone(),
            presets: self.presets.clone(),
            ..Default::default()
        }
    }
}

/// Collects `--var` pairs into a variable map; later pairs win.
pub fn user_variables(pairs: &[(String, String)]) -> Variables {
    pairs.iter().cloned().collect()
}

/// Parses a `KEY=VALUE` pair. The value may be empty and may contain `=`.
pub fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parses command line arguments and returns the Args structure.
///
/// # Returns
/// * `Args` - Parsed command line arguments
///
/// # Exits
/// * With status code 1 if the subcommand is missing
/// * With clap's default error handling for other argument errors
pub fn get_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            if matches!(
                e.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::MissingSubcommand
                    | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) {
                let _ = Args::command()
                    .help_template(
                        r#"{about-section}
{usage-heading} {usage}

{all-args}
{after-help}
"#,
                    )
                    .print_help();
                std::process::exit(1);
            } else {
                e.exit();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(parse_var("a=b"), Ok(("a".to_string(), "b".to_string())));
        assert_eq!(parse_var("url=x=y"), Ok(("url".to_string(), "x=y".to_string())));
        assert_eq!(parse_var("empty="), Ok(("empty".to_string(), String::new())));
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=v").is_err());
    }

    #[test]
    fn test_user_variables_last_wins() {
        let vars = user_variables(&[
            ("k".to_string(), "1".to_string()),
            ("k".to_string(), "2".to_string()),
        ]);
        assert_eq!(vars.get("k").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }
}
