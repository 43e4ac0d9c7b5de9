//! Engine-wide defaults and limits.
//!
//! Values here are the defaults used when no configuration file overrides
//! them (see [`crate::config`]).

/// Default indentation width used by the formatter.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Default maximum line length before macro key lists are wrapped.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 80;

/// Default quiet period before a text edit is parsed.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default maximum accepted script size in bytes (1 MiB).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Smallest accepted tap-hold timeout in milliseconds.
pub const MIN_TAP_HOLD_TIMEOUT_MS: i64 = 1;

/// Largest accepted tap-hold timeout in milliseconds.
pub const MAX_TAP_HOLD_TIMEOUT_MS: i64 = 10_000;
