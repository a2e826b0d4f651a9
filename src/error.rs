//! Error handling for codesmith.
//! Defines the crate error type and the result alias used throughout the application.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for codesmith operations.
///
/// Most of these never abort a whole run: the generation and sync loops catch them per item,
/// log a warning and carry on with the remaining items.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// Frontmatter metadata was not valid YAML
    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),

    /// Project configuration or metadata could not be (de)serialized
    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    /// Represents invalid glob masks in `ignoreSync`
    #[error("Ignore pattern error: {0}.")]
    GlobError(#[from] globset::Error),

    /// A catalog source file had a malformed frontmatter block
    #[error("Frontmatter error: {0}.")]
    FrontmatterError(String),

    /// A catalog record could not be built from its source file
    #[error("Catalog error: {0}.")]
    CatalogError(String),

    /// The user declined or cancelled a required selection
    #[error("Selection cancelled: {0}.")]
    SelectionCancelled(String),

    /// The external formatter failed; callers fall back to unformatted content
    #[error("Formatter error: {0}.")]
    FormatError(String),

    /// A single file or directory failed while the batch kept going
    #[error("Failed to process '{path}': {source}")]
    ProcessError {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wraps an error with the path of the item that was being processed.
    pub fn at<P: Into<PathBuf>>(path: P, source: Error) -> Self {
        Error::ProcessError { path: path.into(), source: Box::new(source) }
    }
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
