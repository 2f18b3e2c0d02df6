//! Integration tests for `vmprep config` and configuration loading.
//!
//! Tests config validation and display functionality with real TOML files.

use std::fs;

use tempfile::TempDir;

use vmprep_cli::cli::{ConfigAction, ConfigArgs, OutputFormat};
use vmprep_cli::commands::{self, config::build_config_report};
use vmprep_cli::output::OutputWriter;

#[tokio::test]
async fn test_load_config_explicit_valid_file() {
    // Given: A valid config file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("vmprep.toml");
    fs::write(
        &config_path,
        r#"
[general]
log_level = "debug"
log_format = "json"

[provision.disk]
device = "/dev/sdb"
partition = 3

[dispatch]
strict_scenarios = true
"#,
    )
    .expect("should write config");

    // When: Loading the config explicitly
    let (config, source) = commands::load_config(Some(config_path.as_path()))
        .await
        .expect("valid config should load");

    // Then: File values are applied, the rest are defaults
    assert_eq!(source, config_path.display().to_string());
    assert_eq!(config.provision.disk.device, "/dev/sdb");
    assert_eq!(config.provision.disk.partition, 3);
    assert!(config.dispatch.strict_scenarios);
    assert_eq!(config.dispatch.cli_entry, "test/check-cli");
}

#[tokio::test]
async fn test_load_config_explicit_missing_file_is_config_error() {
    let result = commands::load_config(Some(std::path::Path::new("/nonexistent/vmprep.toml"))).await;

    let err = result.err().expect("missing explicit file should fail");
    assert_eq!(err.exit_code(), 2, "config errors exit with 2");
    assert!(err.to_string().contains("/nonexistent/vmprep.toml"));
}

#[tokio::test]
async fn test_load_config_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[general\nlog_level = \"info\"\n").expect("should write bad config");

    let err = commands::load_config(Some(config_path.as_path()))
        .await
        .err()
        .expect("malformed TOML should fail");
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_load_config_invalid_value() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("vmprep.toml");
    fs::write(&config_path, "[provision.build]\nresult_dir = \".\"\n")
        .expect("should write config");

    let err = commands::load_config(Some(config_path.as_path()))
        .await
        .err()
        .expect("result_dir '.' should be rejected");
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("result_dir"));
}

#[tokio::test]
async fn test_config_validate_reports_invalid_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("vmprep.toml");
    fs::write(&config_path, "[general]\nlog_format = \"xml\"\n").expect("should write config");

    let writer = OutputWriter::new(OutputFormat::Json);
    let args = ConfigArgs {
        action: ConfigAction::Validate,
    };
    let err = commands::config::execute(args, Some(config_path.as_path()), &writer)
        .await
        .err()
        .expect("validate should fail");

    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn test_config_validate_accepts_example_file() {
    let example = concat!(env!("CARGO_MANIFEST_DIR"), "/../vmprep.toml.example");

    let writer = OutputWriter::new(OutputFormat::Json);
    let args = ConfigArgs {
        action: ConfigAction::Validate,
    };
    commands::config::execute(args, Some(std::path::Path::new(example)), &writer)
        .await
        .expect("example config should validate");
}

#[tokio::test]
async fn test_config_show_section_from_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("vmprep.toml");
    fs::write(
        &config_path,
        "[dispatch]\nknown_cloud_scenarios = [\"aws\", \"gcp\"]\n",
    )
    .expect("should write config");

    let (config, source) = commands::load_config(Some(config_path.as_path()))
        .await
        .expect("config should load");
    let report = build_config_report(&config, source, Some("dispatch".to_owned()))
        .expect("report should build");

    assert_eq!(report.section.as_deref(), Some("dispatch"));
    assert!(report.config_toml.contains("gcp"));
}

#[tokio::test]
async fn test_config_show_rejects_unknown_section() {
    let writer = OutputWriter::new(OutputFormat::Text);
    let example = concat!(env!("CARGO_MANIFEST_DIR"), "/../vmprep.toml.example");
    let args = ConfigArgs {
        action: ConfigAction::Show {
            section: Some("sbom".to_owned()),
        },
    };

    let err = commands::config::execute(args, Some(std::path::Path::new(example)), &writer)
        .await
        .err()
        .expect("unknown section should fail");
    assert_eq!(err.exit_code(), 1);
}
