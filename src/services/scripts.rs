//! Script file I/O service.
//!
//! All file access of the command-line front end goes through here. The sync
//! engine itself never touches the file system.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::{codegen, models::Document, parser};

/// Service for reading and writing script files.
pub struct ScriptService;

impl ScriptService {
    /// Reads a script file, refusing files larger than `max_bytes`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use mapsync::services::ScriptService;
    ///
    /// let text = ScriptService::read(Path::new("remap.rhai"), 1024 * 1024)?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn read(path: &Path, max_bytes: usize) -> Result<String> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        if usize::try_from(metadata.len()).map_or(true, |len| len > max_bytes) {
            bail!(
                "Script {} is {} bytes, exceeding the limit of {max_bytes} bytes",
                path.display(),
                metadata.len()
            );
        }

        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))
    }

    /// Reads and parses a script file.
    ///
    /// Parse errors are returned as the inner [`parser::ParseError`] so callers
    /// can render a code frame; I/O failures use `anyhow` context.
    pub fn load(path: &Path, max_bytes: usize) -> Result<(String, Result<Document, parser::ParseError>)> {
        let text = Self::read(path, max_bytes)?;
        let parsed = parser::parse_with_limit(&text, max_bytes);
        Ok((text, parsed))
    }

    /// Writes script text to a file.
    ///
    /// This performs an atomic write using a temp file + rename pattern to
    /// ensure the file is never left in a corrupted state.
    pub fn write(path: &Path, content: &str) -> Result<()> {
        let extension = path
            .extension()
            .map_or_else(|| "tmp".to_string(), |ext| format!("{}.tmp", ext.to_string_lossy()));
        let temp_path = path.with_extension(extension);

        std::fs::write(&temp_path, content)
            .with_context(|| format!("Failed to write to temporary file: {}", temp_path.display()))?;

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to rename temporary file to: {}", path.display()))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "script written");
        Ok(())
    }

    /// Generates script text for a document and writes it to a file.
    pub fn save(doc: &Document, path: &Path, options: &codegen::FormatOptions) -> Result<()> {
        Self::write(path, &codegen::generate_with(doc, options))
            .with_context(|| format!("Failed to save script to {}", path.display()))
    }
}
