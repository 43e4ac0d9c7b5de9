//! Configuration management CLI commands.

use crate::branding::APP_DISPLAY_NAME;
use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::config::Config;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display the effective configuration
    Show(ConfigShowArgs),
    /// Print the config file location
    Path,
    /// Set configuration values
    Set(ConfigSetArgs),
}

/// Display the effective configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Set configuration values
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Spaces per indentation level
    #[arg(long, value_name = "N")]
    indent_width: Option<usize>,

    /// Line length above which macro lists are wrapped
    #[arg(long, value_name = "N")]
    max_line_length: Option<usize>,

    /// Collapse runs of blank lines into one
    #[arg(long, value_name = "BOOL")]
    collapse_blank_lines: Option<bool>,

    /// Keep end-of-line comments on their statement's line
    #[arg(long, value_name = "BOOL")]
    keep_comments_in_place: Option<bool>,

    /// Quiet period before text edits are parsed
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Largest script accepted
    #[arg(long, value_name = "BYTES")]
    max_input_bytes: Option<usize>,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(config_path),
            ConfigCommand::Path => {
                println!("{}", resolve_path(config_path)?.display());
                Ok(())
            }
            ConfigCommand::Set(args) => args.execute(config_path),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        let config = load_config(config_path)?;

        if self.json {
            return print_json(&config);
        }

        let content = toml::to_string_pretty(&config)
            .map_err(|e| CliError::io(format!("Failed to serialize configuration: {e}")))?;
        println!(
            "# {APP_DISPLAY_NAME} configuration ({})",
            resolve_path(config_path)?.display()
        );
        print!("{content}");
        Ok(())
    }
}

impl ConfigSetArgs {
    fn is_empty(&self) -> bool {
        self.indent_width.is_none()
            && self.max_line_length.is_none()
            && self.collapse_blank_lines.is_none()
            && self.keep_comments_in_place.is_none()
            && self.debounce_ms.is_none()
            && self.max_input_bytes.is_none()
    }

    /// Execute set command
    pub fn execute(&self, config_path: Option<&Path>) -> CliResult<()> {
        if self.is_empty() {
            return Err(CliError::validation(
                "At least one configuration option must be specified: --indent-width, \
                 --max-line-length, --collapse-blank-lines, --keep-comments-in-place, \
                 --debounce-ms or --max-input-bytes",
            ));
        }

        let path = resolve_path(config_path)?;
        let mut config = if path.exists() {
            load_config(Some(&path))?
        } else {
            Config::new()
        };

        if let Some(value) = self.indent_width {
            config.format.indent_width = value;
        }
        if let Some(value) = self.max_line_length {
            config.format.max_line_length = value;
        }
        if let Some(value) = self.collapse_blank_lines {
            config.format.collapse_blank_lines = value;
        }
        if let Some(value) = self.keep_comments_in_place {
            config.format.keep_comments_in_place = value;
        }
        if let Some(value) = self.debounce_ms {
            config.sync.debounce_ms = value;
        }
        if let Some(value) = self.max_input_bytes {
            config.limits.max_input_bytes = value;
        }

        config
            .validate()
            .map_err(|e| CliError::validation(format!("Invalid configuration: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::io(format!(
                    "Failed to create config directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        config
            .save_to(&path)
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        tracing::info!(path = %path.display(), "configuration saved");
        println!("Configuration updated successfully.");
        Ok(())
    }
}

fn resolve_path(config_path: Option<&Path>) -> CliResult<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path()
            .map_err(|e| CliError::config(format!("Failed to locate config file: {e}"))),
    }
}
