//! Data models for mapping scripts.
//!
//! The document tree, mapping values and structural edit commands. Models are
//! independent of parsing, rendering and synchronization.

pub mod document;
pub mod edit;
pub mod mapping;

// Re-export all model types
pub use document::{DeviceBlock, Document, Entry, LayerBlock, Scope, Span};
pub use edit::{DocumentEdit, EditError};
pub use mapping::{KeyRole, Mapping};
