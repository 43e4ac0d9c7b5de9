//! Format command for script files.

use crate::cli::common::{read_script, render_parse_error, CliError, CliResult};
use crate::codegen::try_format;
use crate::config::Config;
use crate::services::ScriptService;
use clap::Args;
use std::path::PathBuf;

/// Reformat a script file
#[derive(Debug, Clone, Args)]
pub struct FmtArgs {
    /// Path to the script file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Rewrite the file in place instead of printing
    #[arg(short, long, conflicts_with = "check")]
    pub write: bool,

    /// Exit non-zero if the file is not formatted
    #[arg(long)]
    pub check: bool,
}

impl FmtArgs {
    /// Execute the fmt command
    pub fn execute(&self, config: &Config) -> CliResult<()> {
        let text = read_script(&self.file, config)?;
        let formatted = try_format(&text, &config.format)
            .map_err(|e| CliError::parse(render_parse_error(&e, &text, &self.file)))?;
        let changed = formatted != text;

        if self.check {
            if changed {
                println!("✗ {} is not formatted", self.file.display());
                return Err(CliError::validation(format!(
                    "{} would be reformatted",
                    self.file.display()
                )));
            }
            println!("✓ {} is formatted", self.file.display());
            return Ok(());
        }

        if self.write {
            if changed {
                ScriptService::write(&self.file, &formatted)
                    .map_err(|e| CliError::io(format!("{e:#}")))?;
                tracing::info!(path = %self.file.display(), "formatted");
                println!("✓ Formatted {}", self.file.display());
            } else {
                println!("✓ {} already formatted", self.file.display());
            }
            return Ok(());
        }

        print!("{formatted}");
        Ok(())
    }
}
