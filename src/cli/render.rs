//! Render command: turn a JSON document into script text.

use crate::cli::common::{CliError, CliResult};
use crate::codegen::generate_with;
use crate::config::Config;
use crate::models::Document;
use crate::services::ScriptService;
use crate::validator::{self, ValidationReport};
use clap::Args;
use std::path::PathBuf;

/// Generate a script from a JSON document
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Path to the JSON document (as printed by `inspect --json`'s `document` field)
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Write the script to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Refuse to render documents with validation errors
    #[arg(long)]
    pub validate: bool,
}

impl RenderArgs {
    /// Execute the render command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let json = ScriptService::read(&self.input, config.limits.max_input_bytes)
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        let doc: Document = serde_json::from_str(&json).map_err(|e| {
            CliError::io(format!(
                "Failed to parse document JSON {}: {e}",
                self.input.display()
            ))
        })?;

        if self.validate {
            let report = ValidationReport::from_issues(validator::validate(&doc));
            if !report.is_valid() {
                eprint!("{}", report.format_message());
                return Err(CliError::validation("Document has validation errors"));
            }
        }

        match &self.output {
            Some(path) => {
                ScriptService::save(&doc, path, &config.format)
                    .map_err(|e| CliError::io(format!("{e:#}")))?;
                println!("✓ Wrote {}", path.display());
            }
            None => print!("{}", generate_with(&doc, &config.format)),
        }

        Ok(())
    }
}
