//! Shared test fixtures for E2E CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use mapsync::models::{DeviceBlock, Document, LayerBlock, Mapping};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Formatted script covering every statement kind and scope.
pub const SAMPLE_SCRIPT: &str = "\
// global remaps
map(\"CapsLock\", \"Escape\");
layer_switch(\"RAlt\", \"nav\");

layer(\"nav\") {
    map(\"H\", \"Left\");
    map(\"L\", \"Right\");
}

device(\"SN-*\") {
    tap_hold(\"Space\", \"Space\", \"LCtrl\", 200);

    layer(\"fn\") {
        macro(\"F1\", [\"H\", \"I\"]);
    }
}
";

/// Same statements as a two-line script with sloppy spacing.
pub const UNFORMATTED_SCRIPT: &str =
    "map( \"CapsLock\",\"Escape\" ) ;device(\"SN1\"){map(\"A\",\"B\");}\n";

/// Expected formatter output for [`UNFORMATTED_SCRIPT`].
pub const UNFORMATTED_SCRIPT_FORMATTED: &str =
    "map(\"CapsLock\", \"Escape\");\ndevice(\"SN1\") {\n    map(\"A\", \"B\");\n}\n";

/// Script with an unknown key name.
pub const UNKNOWN_KEY_SCRIPT: &str = "map(\"CapsLok\", \"Escape\");\n";

/// Script with a missing closing parenthesis.
pub const BROKEN_SCRIPT: &str = "map(\"A\",\"B\"";

/// Script whose only issue is a warning (duplicate device pattern).
pub const WARNING_SCRIPT: &str = "\
device(\"SN1\") {
    map(\"A\", \"B\");
}
device(\"SN1\") {
    map(\"C\", \"D\");
}
";

/// Document equivalent of the structural part of [`SAMPLE_SCRIPT`].
pub fn sample_document() -> Document {
    Document::new()
        .with_mapping(Mapping::simple("CapsLock", "Escape"))
        .with_mapping(Mapping::layer_switch("RAlt", "nav"))
        .with_layer(
            LayerBlock::new("nav")
                .with_mapping(Mapping::simple("H", "Left"))
                .with_mapping(Mapping::simple("L", "Right")),
        )
        .with_device(
            DeviceBlock::new("SN-*")
                .with_mapping(Mapping::tap_hold("Space", "Space", "LCtrl", 200))
                .with_layer(
                    LayerBlock::new("fn").with_mapping(Mapping::macro_sequence("F1", ["H", "I"])),
                ),
        )
}

/// Writes `content` to `name` inside a fresh temp directory.
///
/// Keep the `TempDir` alive for as long as the file is used.
pub fn create_temp_file(name: &str, content: &str) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join(name);
    fs::write(&path, content).expect("Failed to write temp file");
    (path, temp_dir)
}

/// Writes a script file.
pub fn create_temp_script(content: &str) -> (PathBuf, TempDir) {
    create_temp_file("remap.rhai", content)
}

/// Writes an empty config file (all defaults) next to a script, so CLI
/// tests never read the user's real configuration.
pub fn create_default_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, "").expect("Failed to write config file");
    path
}
