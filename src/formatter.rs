//! Best-effort content formatting before files are compared and written.
//!
//! Formatting is delegated to external commands configured per file extension in
//! `codegen.json`:
//!
//! ```json
//! { "formatters": { ".ts": ["prettier", "--stdin-filepath", "{path}"] } }
//! ```
//!
//! The content is piped to the command's stdin and its stdout is taken as the result.
//! A `{path}` argument is replaced by the target file path.

use crate::error::{Error, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use log::debug;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Formats file content for a target path.
#[async_trait]
pub trait Formatter: Send + Sync {
    /// Returns formatted `content` for the file at `path`.
    async fn format(&self, path: &Path, content: &str) -> Result<String>;
}

/// Formatter that leaves content untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFormatter;

#[async_trait]
impl Formatter for NoopFormatter {
    async fn format(&self, _path: &Path, content: &str) -> Result<String> {
        Ok(content.to_string())
    }
}

/// Formatter running an external command selected by the file extension.
#[derive(Debug, Default, Clone)]
pub struct CommandFormatter {
    commands: IndexMap<String, Vec<String>>,
}

impl CommandFormatter {
    /// Creates a formatter from an extension → argv map. Extension keys are matched
    /// case-insensitively, with or without the leading dot.
    pub fn new(commands: IndexMap<String, Vec<String>>) -> Self {
        let commands = commands
            .into_iter()
            .map(|(ext, argv)| (ext.trim_start_matches('.').to_lowercase(), argv))
            .collect();
        Self { commands }
    }

    fn command_for(&self, path: &Path) -> Option<&[String]> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        self.commands.get(&ext).map(Vec::as_slice).filter(|argv| !argv.is_empty())
    }
}

#[async_trait]
impl Formatter for CommandFormatter {
    async fn format(&self, path: &Path, content: &str) -> Result<String> {
        let Some(argv) = self.command_for(path) else {
            return Ok(content.to_string());
        };

        let path_arg = path.display().to_string();
        let args: Vec<String> = argv[1..].iter().map(|a| a.replace("{path}", &path_arg)).collect();

        let mut child = Command::new(&argv[0])
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::FormatError("formatter stdin unavailable".to_string()))?;
        let input = content.as_bytes().to_vec();
        let writer = async move {
            stdin.write_all(&input).await?;
            drop(stdin);
            Ok::<_, std::io::Error>(())
        };

        let ((), output) = tokio::try_join!(writer, child.wait_with_output())?;

        if !output.status.success() {
            return Err(Error::FormatError(format!(
                "'{}' exited with {}: {}",
                argv[0],
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::FormatError(format!("'{}' produced invalid UTF-8: {e}", argv[0])))
    }
}

/// Formats `content`, falling back to the unformatted text on any failure.
pub async fn format_or_original(formatter: &dyn Formatter, path: &Path, content: &str) -> String {
    match formatter.format(path, content).await {
        Ok(formatted) => formatted,
        Err(e) => {
            debug!("Formatting {} failed, keeping unformatted content: {e}", path.display());
            content.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_extension_is_untouched() {
        let formatter = CommandFormatter::new(IndexMap::new());
        let out = formatter.format(Path::new("a.ts"), "x  =  1").await.unwrap();
        assert_eq!(out, "x  =  1");
    }

    #[tokio::test]
    async fn test_failing_command_falls_back() {
        let mut commands = IndexMap::new();
        commands.insert(".ts".to_string(), vec!["codesmith-no-such-formatter".to_string()]);
        let formatter = CommandFormatter::new(commands);

        let out = format_or_original(&formatter, Path::new("a.ts"), "raw").await;
        assert_eq!(out, "raw");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_output_is_used() {
        let mut commands = IndexMap::new();
        commands.insert("TXT".to_string(), vec!["tr".to_string(), "a-z".to_string(), "A-Z".to_string()]);
        let formatter = CommandFormatter::new(commands);

        let out = formatter.format(Path::new("note.txt"), "hello").await.unwrap();
        assert_eq!(out, "HELLO");
    }
}
