//! Integration tests for `kmodtest config` command.
//!
//! Tests config validation and display against the built binary with real TOML files.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn kmodtest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_kmodtest"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("should spawn kmodtest binary")
}

fn write_config(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("should write config");
    path.display().to_string()
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_config_validate_valid_toml() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(
        &temp_dir,
        "kmodtest.toml",
        r#"
[general]
log_level = "info"
log_format = "json"

[module]
name = "scull"

[test_suite]
path = "./scull_test"
"#,
    );

    // When: Validating it
    let output = kmodtest(&["config", "validate", "--config", &config_path]);

    // Then: Should succeed and report VALID
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("VALID"));
}

#[test]
fn test_config_validate_without_file_uses_defaults() {
    // Given: No config file

    // When: Validating
    let output = kmodtest(&["config", "validate"]);

    // Then: Built-in defaults are valid
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("(built-in defaults)"));
}

#[test]
fn test_config_validate_malformed_toml() {
    // Given: A malformed TOML file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "bad.toml", "[module\nname = \"mydevice\"\n");

    // When: Validating it
    let output = kmodtest(&["config", "validate", "--config", &config_path]);

    // Then: Configuration error exit code
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout_of(&output).contains("INVALID"));
}

#[test]
fn test_config_validate_missing_file() {
    // Given: A nonexistent file path
    let config_path = "/nonexistent/kmodtest.toml";
    assert!(!Path::new(config_path).exists());

    // When: Validating it
    let output = kmodtest(&["config", "validate", "--config", config_path]);

    // Then: Configuration error exit code
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_config_validate_rejects_path_like_module_name() {
    // Given: A module name that would escape /dev
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "kmodtest.toml", "[module]\nname = \"../sda\"\n");

    // When: Validating it with JSON output
    let output = kmodtest(&[
        "config",
        "validate",
        "--config",
        &config_path,
        "--output",
        "json",
    ]);

    // Then: The JSON report lists the offending field
    assert_eq!(output.status.code(), Some(2));
    let report: serde_json::Value =
        serde_json::from_str(&stdout_of(&output)).expect("stdout should be JSON");
    assert_eq!(report["valid"], false);
    let errors = report["errors"].as_array().expect("errors array");
    assert!(
        errors
            .iter()
            .any(|e| e.as_str().is_some_and(|s| s.contains("module.name")))
    );
}

#[test]
fn test_config_show_section() {
    // Given: A config overriding the build commands
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(
        &temp_dir,
        "kmodtest.toml",
        "[build]\nclean = [\"make\", \"-C\", \"src\", \"clean\"]\nbuild = [\"make\", \"-C\", \"src\"]\n",
    );

    // When: Showing the build section
    let output = kmodtest(&["config", "show", "--section", "build", "--config", &config_path]);

    // Then: The effective values are printed
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("[build]"));
    assert!(stdout.contains("\"-C\""));
}

#[test]
fn test_config_show_full_defaults() {
    // Given: No config file

    // When: Showing the full configuration
    let output = kmodtest(&["config", "show"]);

    // Then: Every section carries its default
    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("name = \"mydevice\""));
    assert!(stdout.contains("path = \"./test_suite\""));
    assert!(stdout.contains("pass_marker = \"All tests passed!\""));
}

#[test]
fn test_config_show_unknown_section() {
    // Given: An unknown section name

    // When: Showing it
    let output = kmodtest(&["config", "show", "--section", "kernel"]);

    // Then: Configuration error with the expected sections listed
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown section: kernel"));
}

#[test]
fn test_run_with_invalid_config_never_touches_the_system() {
    // Given: An invalid test-suite path
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = write_config(&temp_dir, "kmodtest.toml", "[test_suite]\npath = \"\"\n");

    // When: Running the workflow
    let output = kmodtest(&["run", "--config", &config_path]);

    // Then: It stops at configuration, before any banner
    assert_eq!(output.status.code(), Some(2));
    assert!(!stdout_of(&output).contains("Starting Automated Kernel Module Test Framework"));
}
