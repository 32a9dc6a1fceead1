//! 설정 관리 -- shadowguard.toml 파싱 및 런타임 설정
//!
//! [`ShadowguardConfig`]는 로깅, 스캔, 탐지기 설정을 담는 최상위 구조체입니다.
//! 전역 싱글톤 없이 명시적으로 생성한 값을 오케스트레이터와 각 탐지기 빌더에 넘깁니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SHADOWGUARD_SQL_INJECTION_THRESHOLD=5` 형식)
//! 3. 설정 파일 (`shadowguard.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), shadowguard_core::error::ShadowguardError> {
//! use shadowguard_core::config::ShadowguardConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = ShadowguardConfig::load("shadowguard.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = ShadowguardConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ShadowguardError};

/// Shadowguard 통합 설정
///
/// `shadowguard.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadowguardConfig {
    /// 일반 설정 (로깅)
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 오케스트레이션 설정
    #[serde(default)]
    pub scan: ScanConfig,
    /// 탐지기별 설정
    #[serde(default)]
    pub detectors: DetectorsConfig,
}

impl ShadowguardConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ShadowguardError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드와 검증 없음).
    ///
    /// 검증은 오버라이드가 적용된 최종 값에 대해 [`load`](Self::load)에서 한 번만 수행합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ShadowguardError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShadowguardError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                ShadowguardError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, ShadowguardError> {
        toml::from_str(toml_str).map_err(|e| {
            ShadowguardError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SHADOWGUARD_{SECTION}_{FIELD}`
    /// 예: `SHADOWGUARD_GENERAL_LOG_LEVEL=debug`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SHADOWGUARD_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "SHADOWGUARD_GENERAL_LOG_FORMAT",
        );
        override_string(&mut self.general.log_file, "SHADOWGUARD_GENERAL_LOG_FILE");
        override_usize(
            &mut self.general.log_max_bytes,
            "SHADOWGUARD_GENERAL_LOG_MAX_BYTES",
        );
        override_usize(
            &mut self.general.log_max_files,
            "SHADOWGUARD_GENERAL_LOG_MAX_FILES",
        );

        // Scan
        override_bool(
            &mut self.scan.shard_by_source,
            "SHADOWGUARD_SCAN_SHARD_BY_SOURCE",
        );
        override_usize(&mut self.scan.max_shards, "SHADOWGUARD_SCAN_MAX_SHARDS");

        // SQL injection detector
        override_bool(
            &mut self.detectors.sql_injection.enabled,
            "SHADOWGUARD_SQL_INJECTION_ENABLED",
        );
        override_u32(
            &mut self.detectors.sql_injection.threshold,
            "SHADOWGUARD_SQL_INJECTION_THRESHOLD",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), ShadowguardError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.general.log_max_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.log_max_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.general.log_max_files == 0 {
            return Err(ConfigError::InvalidValue {
                field: "general.log_max_files".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.scan.shard_by_source && self.scan.max_shards == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scan.max_shards".to_owned(),
                reason: "must be greater than 0 when shard_by_source is enabled".to_owned(),
            }
            .into());
        }

        if self.detectors.sql_injection.threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detectors.sql_injection.threshold".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 기본 로그 파일 회전 크기 (10 MiB)
pub const DEFAULT_LOG_MAX_BYTES: usize = 10 * 1024 * 1024;

/// 기본 보관 파일 수
pub const DEFAULT_LOG_MAX_FILES: usize = 5;

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 콘솔 로그 형식 (json, pretty)
    pub log_format: String,
    /// 추가 로그 파일 경로 (빈 문자열이면 콘솔만 사용)
    pub log_file: String,
    /// 로그 파일 회전 기준 크기 (바이트)
    pub log_max_bytes: usize,
    /// 회전된 로그 파일 보관 개수
    pub log_max_files: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
            log_file: String::new(),
            log_max_bytes: DEFAULT_LOG_MAX_BYTES,
            log_max_files: DEFAULT_LOG_MAX_FILES,
        }
    }
}

/// 스캔 오케스트레이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 출발지 IP별로 독립된 스캐너를 둘지 여부
    pub shard_by_source: bool,
    /// 동시에 유지할 최대 샤드 수
    pub max_shards: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            shard_by_source: false,
            max_shards: 10_000,
        }
    }
}

/// 탐지기별 설정 모음
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorsConfig {
    /// SQL 인젝션 탐지기
    pub sql_injection: SqlInjectionConfig,
}

/// SQL 인젝션 탐지기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlInjectionConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 이상 신호를 내기까지 필요한 연속 매칭 라인 수
    pub threshold: u32,
    /// 기본 시그니처 뒤에 추가할 정규식 패턴
    pub patterns: Vec<PatternEntry>,
}

impl Default for SqlInjectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 3,
            patterns: Vec::new(),
        }
    }
}

/// 설정 파일의 패턴 항목
///
/// 문자열이 아닌 값(숫자, 테이블 등)도 파싱 단계에서는 받아 두고,
/// 패턴 컴파일 단계에서 경고와 함께 제외합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternEntry {
    /// 정규식 소스 문자열
    Source(String),
    /// 지원하지 않는 타입의 값
    Other(toml::Value),
}

impl PatternEntry {
    /// 값의 타입 이름 (진단용)
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Source(_) => "string",
            Self::Other(value) => value.type_str(),
        }
    }
}

impl From<&str> for PatternEntry {
    fn from(source: &str) -> Self {
        Self::Source(source.to_owned())
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}
