//! Shadowguard 공통 크레이트
//!
//! 로그 위협 탐지에 참여하는 모든 크레이트가 공유하는 타입을 정의합니다.
//!
//! - [`pipeline`]: 탐지기 확장 포인트 ([`Detector`] trait, [`Verdict`], [`Anomaly`])
//! - [`types`]: 도메인 타입 ([`Severity`], [`AnalysisContext`])
//! - [`config`]: `shadowguard.toml` 설정
//! - [`error`]: 에러 타입
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, DetectionError, ShadowguardError};

// 설정
pub use config::ShadowguardConfig;

// 탐지기 trait
pub use pipeline::{AnalysisError, Anomaly, Detector, Verdict};

// 도메인 타입
pub use types::{AnalysisContext, Severity};
