//! Service layer.
//!
//! Derived queries over documents and the file I/O used by the command-line
//! front end.

pub mod queries;
pub mod scripts;

// Re-export commonly used types and functions
pub use queries::{
    device_patterns, devices_matching, has_global_mappings, layer_names, mappings_for_device,
};
pub use scripts::ScriptService;
