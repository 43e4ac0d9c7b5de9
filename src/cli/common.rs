//! Shared types for CLI commands: errors, exit codes and JSON responses.

use crate::branding::usage_hint;
use crate::config::Config;
use crate::models::Document;
use crate::parser::{self, ParseError};
use crate::services::ScriptService;
use crate::validator::ValidationError;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Result type returned by every command.
pub type CliResult<T> = Result<T, CliError>;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Validation failed, or a file needs formatting
    ValidationFailed = 1,
    /// Script could not be parsed
    ParseError = 2,
    /// File system or configuration failure
    IoError = 3,
}

impl ExitCode {
    /// Numeric code passed to `std::process::exit`.
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Failure of a CLI command.
#[derive(Debug, Clone)]
pub struct CliError {
    /// Exit code category
    pub kind: ExitCode,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Validation failure or unformatted input.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::ValidationFailed,
            message: message.into(),
        }
    }

    /// Syntax error; `message` is usually a rendered code frame.
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::ParseError,
            message: message.into(),
        }
    }

    /// File system failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// Unreadable or invalid configuration.
    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// Numeric process exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.kind.code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Loads the configuration from `--config` or the default location.
pub fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    config.map_err(|e| CliError::config(format!("Failed to load configuration: {e:#}")))
}

/// Reads a script, applying the configured size limit.
pub fn read_script(path: &Path, config: &Config) -> CliResult<String> {
    if !path.exists() {
        return Err(CliError::io(format!(
            "Script not found: {}\n\n{}",
            path.display(),
            usage_hint()
        )));
    }
    ScriptService::read(path, config.limits.max_input_bytes)
        .map_err(|e| CliError::io(format!("{e:#}")))
}

/// Renders a parse error as a code frame naming the file.
#[must_use]
pub fn render_parse_error(err: &ParseError, source: &str, path: &Path) -> String {
    err.render_named(source, &path.display().to_string())
}

/// Parses script text, turning a syntax error into a [`CliError::parse`].
pub fn parse_script(text: &str, path: &Path, config: &Config) -> CliResult<Document> {
    parser::parse_with_limit(text, config.limits.max_input_bytes)
        .map_err(|e| CliError::parse(render_parse_error(&e, text, path)))
}

/// Parse error in JSON responses.
#[derive(Debug, Clone, Serialize)]
pub struct ParseErrorOutput {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    /// Error message
    pub message: String,
    /// How to fix it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl From<&ParseError> for ParseErrorOutput {
    fn from(err: &ParseError) -> Self {
        Self {
            line: err.line,
            column: err.column,
            message: err.message.clone(),
            suggestion: err.suggestion.clone(),
        }
    }
}

/// Counts of a parsed document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// Mapping statements in all scopes
    pub mappings: usize,
    /// Distinct layer names
    pub layers: usize,
    /// Device blocks
    pub devices: usize,
}

impl DocumentSummary {
    /// Summarizes a document.
    #[must_use]
    pub fn of(doc: &Document) -> Self {
        Self {
            mappings: doc.mapping_count(),
            layers: crate::services::layer_names(doc).len(),
            devices: doc.devices.len(),
        }
    }
}

/// JSON response of `check`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResponse {
    /// True when the script parsed and has no errors
    pub valid: bool,
    /// Syntax error, if parsing failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<ParseErrorOutput>,
    /// Error-severity issues
    pub errors: Vec<ValidationError>,
    /// Warning-severity issues
    pub warnings: Vec<ValidationError>,
    /// Document counts (absent when parsing failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DocumentSummary>,
}

/// Prints a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}
