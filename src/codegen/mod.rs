//! Script text output: generation from documents and formatting of text.

pub mod formatter;
pub mod generator;

pub use formatter::{format, try_format, FormatOptions};
pub use generator::{generate, generate_with, render_mapping};
