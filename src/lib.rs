//! codesmith is a catalog-driven file generation engine.
//! It renders reusable templates for scripts and entities into deterministic output paths,
//! keeps timestamped backups of everything it overwrites, and keeps barrel (re-export index)
//! files in sync with directory contents.

/// Template applicability rules
pub mod applicability;

/// Catalog records and keyed repositories
pub mod catalog;

/// Command-line interface module
pub mod cli;

/// Project configuration (codegen.json)
pub mod config;

/// Shared names and limits
pub mod constants;

/// Error types and handling for codesmith
pub mod error;

/// External formatter integration
pub mod formatter;

/// YAML frontmatter parsing for catalog files
pub mod frontmatter;

/// Generation pipeline
/// Drives selection, rendering and persistence for the generate, preset and restore commands
pub mod generator;

/// Directory ignore patterns for barrel sync
pub mod ignore;

/// Catalog loading from the configuration folder
/// Scans:
/// - _templates
/// - t-parts
/// - _scripts
/// - _entities
/// - _e.presets
pub mod loader;

/// Output path and file name construction
pub mod naming;

/// Change-detecting file writes with backups
pub mod persistence;

/// User selection handling
pub mod prompt;

/// Variable and partial resolution in template bodies
pub mod renderer;

/// Barrel file synchronization
pub mod sync;
