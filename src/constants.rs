//! Common constants used throughout codesmith.

/// Project configuration file expected at the project root
pub const CONFIG_FILE: &str = "codegen.json";

/// Extension of catalog source files
pub const CATALOG_FILE_EXT: &str = "hbs";

/// Catalog subfolders, relative to the configured catalog root
pub const TEMPLATES_DIR: &str = "_templates";
pub const PARTS_DIR: &str = "t-parts";
pub const SCRIPTS_DIR: &str = "_scripts";
pub const ENTITIES_DIR: &str = "_entities";
pub const PRESETS_DIR: &str = "_e.presets";

/// Infix separating a file name from its backup timestamp
pub const BACKUP_INFIX: &str = ".bak.";

/// chrono format of backup timestamps, e.g. `20250131T235959`
pub const BACKUP_STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Recursion cap for catalog directory walks
pub const MAX_WALK_DEPTH: usize = 32;

/// Script name part used when a script defines no `pathName`
pub const DEFAULT_SCRIPT_PATH_NAME: &str = "script";
