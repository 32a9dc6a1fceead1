//! shadowguard.toml 통합 설정 테스트
//!
//! - shadowguard.toml.example 파싱 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use serial_test::serial;

use shadowguard_core::config::{PatternEntry, ShadowguardConfig};
use shadowguard_core::error::{ConfigError, ShadowguardError};

// =============================================================================
// shadowguard.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../shadowguard.toml.example");
    let config = ShadowguardConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "pretty");
    assert!(config.general.log_file.is_empty());
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../shadowguard.toml.example");
    let config = ShadowguardConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_has_sql_injection_section() {
    let content = include_str!("../../../shadowguard.toml.example");
    let config = ShadowguardConfig::parse(content).expect("should parse");

    let sqli = &config.detectors.sql_injection;
    assert!(sqli.enabled);
    assert_eq!(sqli.threshold, 3);
    assert_eq!(
        sqli.patterns,
        vec![
            PatternEntry::from("xp_cmdshell"),
            PatternEntry::from(r"information_schema\.tables"),
        ]
    );
}

// =============================================================================
// 파일 로딩 + 환경변수 우선순위
// =============================================================================

#[tokio::test]
#[serial]
async fn env_overrides_file_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shadowguard.toml");
    std::fs::write(
        &path,
        "[general]\nlog_level = \"warn\"\n[detectors.sql_injection]\nthreshold = 4\n",
    )
    .expect("write config");

    // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("SHADOWGUARD_GENERAL_LOG_LEVEL", "debug") };
    let result = ShadowguardConfig::load(&path).await;
    unsafe { std::env::remove_var("SHADOWGUARD_GENERAL_LOG_LEVEL") };

    let config = result.expect("load should succeed");
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.detectors.sql_injection.threshold, 4);
}

#[tokio::test]
#[serial]
async fn invalid_env_override_fails_validation() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shadowguard.toml");
    std::fs::write(&path, "").expect("write config");

    // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("SHADOWGUARD_SQL_INJECTION_THRESHOLD", "0") };
    let result = ShadowguardConfig::load(&path).await;
    unsafe { std::env::remove_var("SHADOWGUARD_SQL_INJECTION_THRESHOLD") };

    let err = result.expect_err("threshold 0 must be rejected");
    assert!(matches!(
        err,
        ShadowguardError::Config(ConfigError::InvalidValue { .. })
    ));
}

#[tokio::test]
#[serial]
async fn env_override_repairs_invalid_file_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shadowguard.toml");
    std::fs::write(&path, "[detectors.sql_injection]\nthreshold = 0\n").expect("write config");

    // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("SHADOWGUARD_SQL_INJECTION_THRESHOLD", "5") };
    let result = ShadowguardConfig::load(&path).await;
    unsafe { std::env::remove_var("SHADOWGUARD_SQL_INJECTION_THRESHOLD") };

    let config = result.expect("validation runs after env overrides");
    assert_eq!(config.detectors.sql_injection.threshold, 5);
}

#[tokio::test]
#[serial]
async fn env_overrides_rotation_limits() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shadowguard.toml");
    std::fs::write(&path, "[general]\nlog_max_files = 2\n").expect("write config");

    // SAFETY: #[serial]로 환경변수를 조작하는 테스트를 직렬화합니다.
    unsafe { std::env::set_var("SHADOWGUARD_GENERAL_LOG_MAX_BYTES", "4096") };
    let result = ShadowguardConfig::load(&path).await;
    unsafe { std::env::remove_var("SHADOWGUARD_GENERAL_LOG_MAX_BYTES") };

    let config = result.expect("load should succeed");
    assert_eq!(config.general.log_max_bytes, 4096);
    assert_eq!(config.general.log_max_files, 2);
}

// =============================================================================
// 에러 케이스
// =============================================================================

#[test]
fn wrong_type_for_threshold_is_parse_error() {
    let result = ShadowguardConfig::parse("[detectors.sql_injection]\nthreshold = \"three\"\n");
    assert!(matches!(
        result,
        Err(ShadowguardError::Config(ConfigError::ParseFailed { .. }))
    ));
}

#[test]
fn unknown_sections_are_ignored() {
    let config = ShadowguardConfig::parse("[reports]\noutput_dir = \"/tmp/reports\"\n")
        .expect("unknown sections should be ignored");
    assert_eq!(config.detectors.sql_injection.threshold, 3);
}
