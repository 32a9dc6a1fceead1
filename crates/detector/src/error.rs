//! 탐지기 크레이트 에러 타입
//!
//! [`DetectorError`]는 탐지기 구성과 배치 스캔 중 발생하는 에러를 표현합니다.
//! 라인 단위 분석 실패는 에러로 전파되지 않고 `process` 경계에서 흡수됩니다.
//! `From<DetectorError> for ShadowguardError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use shadowguard_core::error::{ConfigError, DetectionError, ShadowguardError};

/// 탐지기 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 탐지기 구성 실패
    #[error("detector build error: {detector}: {reason}")]
    Build {
        /// 탐지기 이름
        detector: String,
        /// 실패 사유
        reason: String,
    },

    /// 입력 스트림 읽기 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DetectorError> for ShadowguardError {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::Config { field, reason } => {
                ShadowguardError::Config(ConfigError::InvalidValue { field, reason })
            }
            DetectorError::Build { detector, reason } => {
                ShadowguardError::Detection(DetectionError::Build { detector, reason })
            }
            DetectorError::Io(e) => ShadowguardError::Io(e),
        }
    }
}
