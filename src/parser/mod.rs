//! Lexing and parsing of mapping scripts.
//!
//! This module turns script text into a [`crate::models::Document`] and
//! reports the first syntax error with its line and column.

pub mod error;
pub mod lexer;
pub mod script;

// Re-export commonly used items
pub use error::ParseError;
pub use script::{parse, parse_with_limit};
