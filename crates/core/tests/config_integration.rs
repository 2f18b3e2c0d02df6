//! vmprep.toml 통합 설정 테스트
//!
//! - vmprep.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use std::io::Write;

use vmprep_core::config::VmprepConfig;
use vmprep_core::error::{ConfigError, VmprepError};

// =============================================================================
// vmprep.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../vmprep.toml.example");
    let config = VmprepConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../vmprep.toml.example");
    let config = VmprepConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let content = include_str!("../../../vmprep.toml.example");
    let from_file = VmprepConfig::parse(content).expect("should parse");
    let from_code = VmprepConfig::default();

    // 예시 파일이 코드 Default 구현과 어긋나지 않도록 확인
    assert_eq!(from_file.general.log_level, from_code.general.log_level);
    assert_eq!(from_file.general.log_format, from_code.general.log_format);

    let (file, code) = (&from_file.provision, &from_code.provision);
    assert_eq!(file.prerequisite_package, code.prerequisite_package);
    assert_eq!(file.enterprise_os_id, code.enterprise_os_id);
    assert_eq!(file.os_release_path, code.os_release_path);
    assert_eq!(file.repo_url, code.repo_url);
    assert_eq!(file.repo_dir, code.repo_dir);
    assert_eq!(file.repo_file, code.repo_file);
    assert_eq!(file.services, code.services);
    assert_eq!(file.disk.device, code.disk.device);
    assert_eq!(file.disk.partition, code.disk.partition);
    assert_eq!(file.build.result_dir, code.build.result_dir);
    assert_eq!(file.build.build_user, code.build.build_user);
    assert_eq!(file.build.mock_path, code.build.mock_path);

    let (file, code) = (&from_file.dispatch, &from_code.dispatch);
    assert_eq!(file.build_command, code.build_command);
    assert_eq!(file.cli_entry, code.cli_entry);
    assert_eq!(file.cloud_entry, code.cloud_entry);
    assert_eq!(file.api_entry, code.api_entry);
    assert_eq!(file.known_cloud_scenarios, code.known_cloud_scenarios);
    assert_eq!(file.strict_scenarios, code.strict_scenarios);
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn dispatch_only_config_keeps_provision_defaults() {
    let toml = r#"
[dispatch]
build_command = ["make", "vm-local"]
cloud_entry = "tests/cloud"
"#;
    let config = VmprepConfig::parse(toml).expect("should parse");
    assert_eq!(config.dispatch.build_command, vec!["make", "vm-local"]);
    assert_eq!(config.dispatch.cloud_entry, "tests/cloud");
    assert_eq!(config.dispatch.cli_entry, "test/check-cli");
    assert_eq!(config.provision.disk.device, "/dev/vda");
}

#[test]
fn nested_build_section_alone_is_accepted() {
    let toml = r#"
[provision.build]
build_user = "mockbuild"
"#;
    let config = VmprepConfig::parse(toml).expect("should parse");
    assert_eq!(config.provision.build.build_user, "mockbuild");
    assert_eq!(config.provision.build.result_dir, "build-results");
    assert_eq!(config.provision.prerequisite_package, "beakerlib");
}

#[test]
fn unknown_keys_are_ignored() {
    let toml = r#"
[general]
log_level = "debug"
color = "always"
"#;
    let config = VmprepConfig::parse(toml).expect("unknown keys should not fail parsing");
    assert_eq!(config.general.log_level, "debug");
}

// =============================================================================
// 에러 테스트
// =============================================================================

#[test]
fn wrong_value_type_is_parse_error() {
    let toml = r#"
[provision.disk]
partition = "two"
"#;
    let err = VmprepConfig::parse(toml).expect_err("string partition should fail");
    assert!(matches!(
        err,
        VmprepError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().expect("should create temp file");
    writeln!(file, "[general]\nlog_format = \"xml\"").expect("should write");

    let err = VmprepConfig::from_file(file.path())
        .await
        .expect_err("invalid log_format should fail validation");
    assert!(matches!(
        err,
        VmprepError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "general.log_format"
    ));
}

#[tokio::test]
async fn empty_file_loads_defaults() {
    let file = tempfile::NamedTempFile::new().expect("should create temp file");
    let config = VmprepConfig::from_file(file.path())
        .await
        .expect("empty file should load");
    assert_eq!(config.provision.services.len(), 2);
}

#[tokio::test]
#[serial_test::serial]
async fn load_with_explicit_missing_path_fails() {
    let err = VmprepConfig::load("/nonexistent/vmprep.toml")
        .await
        .expect_err("missing file should fail");
    assert!(matches!(
        err,
        VmprepError::Config(ConfigError::FileNotFound { .. })
    ));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[provision.disk]
device = "/dev/vda"
"#;

    let original = std::env::var("VMPREP_PROVISION_DISK_DEVICE").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("VMPREP_PROVISION_DISK_DEVICE", "/dev/sdb");
    }

    let mut config = VmprepConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.provision.disk.device.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("VMPREP_PROVISION_DISK_DEVICE", val),
            None => std::env::remove_var("VMPREP_PROVISION_DISK_DEVICE"),
        }
    }

    assert_eq!(result, "/dev/sdb");
}

#[test]
#[serial_test::serial]
fn env_override_nested_build_section_uses_full_path() {
    let original = std::env::var("VMPREP_PROVISION_BUILD_BUILD_USER").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("VMPREP_PROVISION_BUILD_BUILD_USER", "mockbuild");
    }

    let mut config = VmprepConfig::default();
    config.apply_env_overrides();
    let result = config.provision.build.build_user.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("VMPREP_PROVISION_BUILD_BUILD_USER", val),
            None => std::env::remove_var("VMPREP_PROVISION_BUILD_BUILD_USER"),
        }
    }

    assert_eq!(result, "mockbuild");
}

#[test]
#[serial_test::serial]
fn env_override_build_command_is_split_into_argv() {
    let original = std::env::var("VMPREP_DISPATCH_BUILD_COMMAND").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("VMPREP_DISPATCH_BUILD_COMMAND", "make vm TEST_OS=fedora-40");
    }

    let mut config = VmprepConfig::default();
    config.apply_env_overrides();
    let result = config.dispatch.build_command.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("VMPREP_DISPATCH_BUILD_COMMAND", val),
            None => std::env::remove_var("VMPREP_DISPATCH_BUILD_COMMAND"),
        }
    }

    assert_eq!(result, vec!["make", "vm", "TEST_OS=fedora-40"]);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_partition_keeps_file_value() {
    let toml = r#"
[provision.disk]
partition = 3
"#;

    let original = std::env::var("VMPREP_PROVISION_DISK_PARTITION").ok();
    // SAFETY: serial 테스트로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("VMPREP_PROVISION_DISK_PARTITION", "third");
    }

    let mut config = VmprepConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.provision.disk.partition;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("VMPREP_PROVISION_DISK_PARTITION", val),
            None => std::env::remove_var("VMPREP_PROVISION_DISK_PARTITION"),
        }
    }

    assert_eq!(result, 3);
}
