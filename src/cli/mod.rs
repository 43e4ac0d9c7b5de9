//! CLI command handlers.
//!
//! Headless, scriptable access to the parser, validator and formatter for
//! editors, pre-commit hooks and CI.

pub mod check;
pub mod common;
pub mod config;
pub mod fmt;
pub mod inspect;
pub mod keys;
pub mod render;

// Re-export types used by main.rs and tests
pub use check::CheckArgs;
pub use common::{load_config, CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use fmt::FmtArgs;
pub use inspect::InspectArgs;
pub use keys::KeysArgs;
pub use render::RenderArgs;
