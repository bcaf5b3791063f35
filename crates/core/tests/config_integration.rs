//! sluice.toml 통합 설정 테스트
//!
//! - sluice.toml.example 파싱 테스트
//! - 부분 설정 로딩 테스트
//! - 환경변수 우선순위 테스트

use sluice_core::config::SluiceConfig;
use sluice_core::error::{ConfigError, SluiceError};

// =============================================================================
// sluice.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../sluice.toml.example");
    let config = SluiceConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.pipeline.pipeline_dir, "/etc/sluice/pipelines");
    assert_eq!(config.pipeline.workers, 4);
    assert_eq!(config.pipeline.reload_interval_secs, 30);
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../sluice.toml.example");
    let config = SluiceConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn unknown_sections_are_ignored() {
    let toml = r#"
[general]
log_format = "pretty"

[outputs]
kafka = "localhost:9092"
"#;
    let config = SluiceConfig::parse(toml).expect("should parse");
    assert_eq!(config.general.log_format, "pretty");
}

#[test]
fn wrong_value_type_is_parse_error() {
    let toml = r#"
[pipeline]
workers = "four"
"#;
    let err = SluiceConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        SluiceError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[tokio::test]
async fn load_from_file_applies_validation() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("sluice.toml");
    std::fs::write(&path, "[pipeline]\nworkers = 0\n").expect("write config");

    let err = SluiceConfig::from_file(&path)
        .await
        .expect_err("zero workers must be rejected");
    assert!(err.to_string().contains("pipeline.workers"));
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[general]
log_level = "info"
"#;

    let original = std::env::var("SLUICE_GENERAL_LOG_LEVEL").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SLUICE_GENERAL_LOG_LEVEL", "error");
    }

    let mut config = SluiceConfig::parse(toml).expect("should parse");
    config.apply_env_overrides();
    let result = config.general.log_level.clone();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SLUICE_GENERAL_LOG_LEVEL", val),
            None => std::env::remove_var("SLUICE_GENERAL_LOG_LEVEL"),
        }
    }

    assert_eq!(result, "error");
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_defaults() {
    let original = std::env::var("SLUICE_PIPELINE_WORKERS").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SLUICE_PIPELINE_WORKERS", "16");
    }

    let mut config = SluiceConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.pipeline.workers;

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SLUICE_PIPELINE_WORKERS", val),
            None => std::env::remove_var("SLUICE_PIPELINE_WORKERS"),
        }
    }

    assert_eq!(result, 16);
}

#[test]
#[serial_test::serial]
fn env_override_channel_capacity_is_bounded() {
    let original = std::env::var("SLUICE_PIPELINE_CHANNEL_CAPACITY").ok();
    // SAFETY: serial_test로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var("SLUICE_PIPELINE_CHANNEL_CAPACITY", "4611686018427387904");
    }

    let mut config = SluiceConfig::parse("").expect("should parse");
    config.apply_env_overrides();
    let result = config.validate();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var("SLUICE_PIPELINE_CHANNEL_CAPACITY", val),
            None => std::env::remove_var("SLUICE_PIPELINE_CHANNEL_CAPACITY"),
        }
    }

    assert!(matches!(
        result,
        Err(SluiceError::Config(ConfigError::InvalidValue { ref field, .. }))
            if field == "pipeline.channel_capacity"
    ));
}
