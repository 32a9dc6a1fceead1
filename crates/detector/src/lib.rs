//! # shadowguard-detector
//!
//! 로그 라인을 시그니처로 검사하고 임계값 기반으로 이상 신호를 내는 탐지 엔진입니다.
//!
//! # 모듈 구성
//!
//! - [`pattern`]: 설정된 패턴 소스를 대소문자 무시 시그니처로 컴파일
//! - [`process`]: 모든 탐지기에 공통으로 제공되는 `process` 경계 (이상 신호/결함 기록)
//! - [`sql_injection`]: 연속 매칭 카운터를 가진 SQL 인젝션 탐지기
//! - [`scanner`]: 탐지기 레지스트리와 라인 단위 오케스트레이션
//! - [`shard`]: 출발지 IP별 스캐너 샤딩
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! line + context -> Scanner -> Detector::process -> Detector::analyze -> Verdict
//!                      |              |                                     |
//!                 catch_unwind   warn / error record           Clean / Suspicious / Anomaly
//! ```
//!
//! # 예시
//!
//! ```
//! use shadowguard_core::types::AnalysisContext;
//! use shadowguard_detector::{Scanner, SqlInjectionDetector};
//!
//! let mut scanner = Scanner::builder()
//!     .detector(SqlInjectionDetector::new())
//!     .build()
//!     .unwrap();
//!
//! let ctx = AnalysisContext::new().with("ip_address", "192.168.1.100");
//! assert!(scanner.analyze_log("SELECT * FROM users", &ctx));
//! assert!(!scanner.analyze_log("GET /home HTTP/1.1", &ctx));
//! ```

pub mod error;
pub mod lines;
pub mod pattern;
pub mod process;
pub mod scanner;
pub mod shard;
pub mod sql_injection;

// --- 주요 타입 re-export ---

// 에러
pub use error::DetectorError;

// 입력
pub use lines::{LossyLines, lossy_lines};

// 시그니처
pub use pattern::{PatternSource, Signature, compile_patterns, compile_signature};

// 처리 경계
pub use process::{DetectorExt, MAX_LOG_ENTRY_CHARS, truncate_entry};

// 탐지기
pub use sql_injection::{DEFAULT_SIGNATURES, SqlInjectionDetector};

// 오케스트레이션
pub use scanner::{ScanSummary, Scanner, ScannerBuilder};
pub use shard::ShardedScanner;
