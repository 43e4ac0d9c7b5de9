//! mapsync library
//!
//! Parsing, validation, generation and formatting of key-remapping scripts,
//! plus the engine that keeps a script's text and its parsed [`models::Document`]
//! in sync while either one is being edited.
//!
//! ```
//! use mapsync::{codegen, parser, validator};
//!
//! let doc = parser::parse(r#"map("CapsLock", "Escape");"#).unwrap();
//! assert!(validator::validate(&doc).is_empty());
//! assert_eq!(codegen::generate(&doc), "map(\"CapsLock\", \"Escape\");\n");
//! ```

// Module declarations
pub mod branding;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod constants;
pub mod keycode_db;
pub mod models;
pub mod parser;
pub mod services;
pub mod sync;
pub mod validator;
