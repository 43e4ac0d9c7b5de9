//! Check command: parse and validate a script.

use crate::cli::common::{
    print_json, read_script, render_parse_error, CheckResponse, CliError, CliResult,
    DocumentSummary, ParseErrorOutput,
};
use crate::config::Config;
use crate::parser;
use crate::validator::{self, ValidationError, ValidationReport};
use clap::Args;
use std::path::PathBuf;

/// Parse and validate a script file
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Path to the script file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Treat warnings as errors (exit non-zero)
    #[arg(long)]
    pub strict: bool,
}

impl CheckArgs {
    /// Execute the check command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let text = read_script(&self.file, config)?;

        let doc = match parser::parse_with_limit(&text, config.limits.max_input_bytes) {
            Ok(doc) => doc,
            Err(e) => {
                if self.json {
                    print_json(&CheckResponse {
                        valid: false,
                        parse_error: Some(ParseErrorOutput::from(&e)),
                        errors: Vec::new(),
                        warnings: Vec::new(),
                        summary: None,
                    })?;
                    return Err(CliError::parse(format!(
                        "{}:{e}",
                        self.file.display()
                    )));
                }
                return Err(CliError::parse(render_parse_error(&e, &text, &self.file)));
            }
        };

        let report = ValidationReport::from_issues(validator::validate(&doc));
        let summary = DocumentSummary::of(&doc);
        let valid = report.is_valid();

        if self.json {
            print_json(&CheckResponse {
                valid,
                parse_error: None,
                errors: report.errors.clone(),
                warnings: report.warnings.clone(),
                summary: Some(summary),
            })?;
        } else {
            if valid {
                println!(
                    "✓ {}: {} mappings, {} layers, {} devices",
                    self.file.display(),
                    summary.mappings,
                    summary.layers,
                    summary.devices
                );
            } else {
                println!("✗ {}: validation failed", self.file.display());
            }

            if !report.errors.is_empty() || !report.warnings.is_empty() {
                println!("\nIssues:");
                for issue in report.errors.iter().chain(&report.warnings) {
                    print_issue(issue);
                }
            }
        }

        if !valid {
            return Err(CliError::validation(format!(
                "{} validation errors",
                report.errors.len()
            )));
        }

        if self.strict && !report.warnings.is_empty() {
            return Err(CliError::validation("Warnings found in strict mode"));
        }

        Ok(())
    }
}

fn print_issue(issue: &ValidationError) {
    let prefix = if issue.is_error() { "  ✗" } else { "  ⚠" };
    println!(
        "{prefix} {}:{} {}: {}",
        issue.line, issue.column, issue.kind, issue.message
    );
    if let Some(suggestion) = &issue.suggestion {
        println!("    → {suggestion}");
    }
}
