//! Application identity.
//!
//! Names and paths that appear in help text, config locations and
//! user-facing messages live here so they stay consistent.

/// The human-readable display name of the application.
pub const APP_DISPLAY_NAME: &str = "mapsync";

/// The binary/executable name (lowercase, no spaces).
///
/// Used in command examples printed by the CLI and in error hints.
pub const APP_BINARY_NAME: &str = "mapsync";

/// The directory name for application data.
///
/// Used in platform-specific paths:
/// - Linux: `~/.config/{APP_DATA_DIR}/`
/// - macOS: `~/Library/Application Support/{APP_DATA_DIR}/`
/// - Windows: `%APPDATA%\{APP_DATA_DIR}\`
pub const APP_DATA_DIR: &str = "mapsync";

/// Short description for help text.
pub const APP_DESCRIPTION: &str =
    "Parse, validate, format and generate key-remapping scripts";

/// File extension used by remapping scripts.
pub const SCRIPT_EXTENSION: &str = "rhai";

/// Usage hint shown when a script path is missing or wrong.
pub fn usage_hint() -> String {
    format!(
        "Examples:\n  {APP_BINARY_NAME} check my_keymap.{SCRIPT_EXTENSION}\n  {APP_BINARY_NAME} fmt --write my_keymap.{SCRIPT_EXTENSION}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branding_consistency() {
        assert_eq!(APP_BINARY_NAME, APP_BINARY_NAME.to_lowercase());
        assert!(!APP_BINARY_NAME.contains(' '));
        assert!(!APP_DATA_DIR.contains(' '));
        assert!(!SCRIPT_EXTENSION.starts_with('.'));
    }

    #[test]
    fn test_usage_hint_mentions_binary() {
        let hint = usage_hint();
        assert!(hint.contains(APP_BINARY_NAME));
        assert!(hint.contains(".rhai"));
    }
}
