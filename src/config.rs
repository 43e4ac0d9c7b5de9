//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application configuration
//! in TOML format with platform-specific directory resolution.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::branding::APP_DATA_DIR;
use crate::codegen::FormatOptions;
use crate::constants::{DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_INPUT_BYTES};
use crate::sync::EngineOptions;

/// Longest accepted debounce interval.
const MAX_DEBOUNCE_MS: u64 = 10_000;

/// Text synchronization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Quiet period after the last text edit before re-parsing
    pub debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// Input limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest script accepted by the parser and the CLI
    pub max_input_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/mapsync/config.toml`
/// - macOS: `~/Library/Application Support/mapsync/config.toml`
/// - Windows: `%APPDATA%\mapsync\config.toml`
///
/// # Validation
///
/// - `format.indent_width` must be between 1 and 16
/// - `format.max_line_length` must be at least 20
/// - `sync.debounce_ms` must not exceed 10 seconds
/// - `limits.max_input_bytes` must be positive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Formatter and generator layout
    pub format: FormatOptions,
    /// Sync engine settings
    pub sync: SyncConfig,
    /// Input limits
    pub limits: LimitsConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/mapsync/`
    /// - macOS: `~/Library/Application Support/mapsync/`
    /// - Windows: `%APPDATA%\mapsync\`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_DATA_DIR);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::new());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates configuration from an explicit file.
    ///
    /// Missing sections and keys fall back to their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .context(format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .context(format!("Invalid config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Saves configuration to the config file using atomic write.
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).context(format!(
            "Failed to create config directory: {}",
            config_dir.display()
        ))?;

        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to an explicit file.
    ///
    /// Uses temp file + rename pattern for atomic writes.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        // Serialize to TOML
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        let temp_path = config_path.with_extension("toml.tmp");

        // Write to temp file
        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    ///
    /// Checks:
    /// - `indent_width` is between 1 and 16
    /// - `max_line_length` is at least 20
    /// - `debounce_ms` is at most 10000
    /// - `max_input_bytes` is positive
    pub fn validate(&self) -> Result<()> {
        if !(1..=16).contains(&self.format.indent_width) {
            anyhow::bail!(
                "format.indent_width must be between 1 and 16, got {}",
                self.format.indent_width
            );
        }

        if self.format.max_line_length < 20 {
            anyhow::bail!(
                "format.max_line_length must be at least 20, got {}",
                self.format.max_line_length
            );
        }

        if self.sync.debounce_ms > MAX_DEBOUNCE_MS {
            anyhow::bail!(
                "sync.debounce_ms must be at most {MAX_DEBOUNCE_MS}, got {}",
                self.sync.debounce_ms
            );
        }

        if self.limits.max_input_bytes == 0 {
            anyhow::bail!("limits.max_input_bytes must be greater than 0");
        }

        Ok(())
    }

    /// Layout options for the formatter and generator.
    #[must_use]
    pub fn format_options(&self) -> FormatOptions {
        self.format.clone()
    }

    /// Options for a sync engine.
    #[must_use]
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            debounce: Duration::from_millis(self.sync.debounce_ms),
            format: self.format_options(),
            max_input_bytes: self.limits.max_input_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.format.indent_width, 4);
        assert_eq!(config.format.max_line_length, 80);
        assert!(config.format.collapse_blank_lines);
        assert!(config.format.keep_comments_in_place);
        assert_eq!(config.sync.debounce_ms, 500);
        assert_eq!(config.limits.max_input_bytes, 1024 * 1024);
    }

    #[test]
    fn test_config_validate() {
        let mut config = Config::new();
        assert!(config.validate().is_ok());

        config.format.indent_width = 0;
        assert!(config.validate().is_err());
        config.format.indent_width = 17;
        assert!(config.validate().is_err());
        config.format.indent_width = 2;

        config.format.max_line_length = 19;
        assert!(config.validate().is_err());
        config.format.max_line_length = 20;
        assert!(config.validate().is_ok());

        config.sync.debounce_ms = 10_001;
        assert!(config.validate().is_err());
        config.sync.debounce_ms = 0;
        assert!(config.validate().is_ok());

        config.limits.max_input_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        let mut config = Config::new();
        config.format.indent_width = 2;
        config.sync.debounce_ms = 250;

        config.save_to(&config_file).unwrap();
        assert!(!temp_dir.path().join("config.toml.tmp").exists());

        let loaded = Config::load_from(&config_file).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        fs::write(&config_file, "[sync]\ndebounce_ms = 100\n").unwrap();

        let loaded = Config::load_from(&config_file).unwrap();
        assert_eq!(loaded.sync.debounce_ms, 100);
        assert_eq!(loaded.format, FormatOptions::default());
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");

        fs::write(&config_file, "[format]\nindent_width = 40\n").unwrap();
        let err = Config::load_from(&config_file).unwrap_err();
        assert!(format!("{err:#}").contains("indent_width"));

        fs::write(&config_file, "not = [valid").unwrap();
        assert!(Config::load_from(&config_file).is_err());
    }

    #[test]
    fn test_engine_options() {
        let mut config = Config::new();
        config.sync.debounce_ms = 50;
        let options = config.engine_options();
        assert_eq!(options.debounce, Duration::from_millis(50));
        assert_eq!(options.max_input_bytes, config.limits.max_input_bytes);
    }
}
