//! End-to-end tests for `mapsync fmt`.

use std::fs;
use std::process::Command;

mod fixtures;
use fixtures::*;

/// Path to the mapsync binary
fn mapsync_bin() -> &'static str {
    env!("CARGO_BIN_EXE_mapsync")
}

#[test]
fn test_fmt_prints_formatted_script() {
    let (path, temp_dir) = create_temp_script(UNFORMATTED_SCRIPT);
    let config = create_default_config(&temp_dir);

    let output = Command::new(mapsync_bin())
        .args(["fmt", path.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), UNFORMATTED_SCRIPT_FORMATTED);

    // File untouched without --write
    assert_eq!(fs::read_to_string(&path).unwrap(), UNFORMATTED_SCRIPT);
}

#[test]
fn test_fmt_write_rewrites_file() {
    let (path, temp_dir) = create_temp_script(UNFORMATTED_SCRIPT);
    let config = create_default_config(&temp_dir);

    let output = Command::new(mapsync_bin())
        .args([
            "fmt",
            "--write",
            path.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(&path).unwrap(), UNFORMATTED_SCRIPT_FORMATTED);
    assert!(
        !temp_dir.path().join("remap.rhai.tmp").exists(),
        "temp file should be renamed away"
    );
}

#[test]
fn test_fmt_check_unformatted_fails() {
    let (path, temp_dir) = create_temp_script(UNFORMATTED_SCRIPT);
    let config = create_default_config(&temp_dir);

    let output = Command::new(mapsync_bin())
        .args([
            "fmt",
            "--check",
            path.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(&path).unwrap(), UNFORMATTED_SCRIPT);
}

#[test]
fn test_fmt_check_formatted_passes() {
    let (path, temp_dir) = create_temp_script(SAMPLE_SCRIPT);
    let config = create_default_config(&temp_dir);

    let output = Command::new(mapsync_bin())
        .args([
            "fmt",
            "--check",
            path.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(
        output.status.code(),
        Some(0),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains('✓'));
}

#[test]
fn test_fmt_uses_configured_indent() {
    let (path, temp_dir) = create_temp_script(UNFORMATTED_SCRIPT);
    let config = temp_dir.path().join("custom.toml");
    fs::write(&config, "[format]\nindent_width = 2\n").unwrap();

    let output = Command::new(mapsync_bin())
        .args(["fmt", path.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("\n  map(\"A\", \"B\");\n"));
}

#[test]
fn test_fmt_unlexable_input_is_parse_error() {
    let (path, temp_dir) = create_temp_script("map(\"A\", @);\n");
    let config = create_default_config(&temp_dir);

    let output = Command::new(mapsync_bin())
        .args(["fmt", path.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("remap.rhai:1:"), "stderr: {stderr}");
}

#[test]
fn test_fmt_missing_file() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let config = create_default_config(&temp_dir);
    let missing = temp_dir.path().join("nope.rhai");

    let output = Command::new(mapsync_bin())
        .args(["fmt", missing.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_fmt_write_and_check_conflict() {
    let (path, _temp_dir) = create_temp_script(SAMPLE_SCRIPT);

    let output = Command::new(mapsync_bin())
        .args(["fmt", "--write", "--check", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2), "clap usage errors exit with 2");
}
