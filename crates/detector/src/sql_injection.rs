//! SQL 인젝션 탐지기
//!
//! 기본 시그니처 집합과 운영자가 추가한 패턴으로 로그 라인을 검사합니다.
//! 연속으로 매칭된 라인 수가 임계값에 도달하면 `High` 심각도의 이상 신호를 만들고,
//! 매칭되지 않는 라인이 하나라도 들어오면 카운터를 0으로 되돌립니다.
//!
//! # 단일 작성자 요구사항
//!
//! `match_count`는 `analyze` 호출마다 읽고-증가-비교하는 가변 상태입니다.
//! 한 인스턴스를 여러 스트림이 동시에 공유하면 증가분이 유실되거나 리셋 순서가 꼬이므로,
//! 스트림마다 별도 인스턴스를 두거나 [`crate::shard::ShardedScanner`]처럼
//! 출발지별로 직렬화해서 사용해야 합니다.

use serde_json::Value;

use shadowguard_core::config::SqlInjectionConfig;
use shadowguard_core::pipeline::{AnalysisError, Anomaly, Detector, Verdict};
use shadowguard_core::types::{AnalysisContext, Severity};

use crate::pattern::{PatternSource, Signature, compile_patterns};

/// 탐지기 이름
pub const DETECTOR_NAME: &str = "sql_injection";

/// 기본 임계값
pub const DEFAULT_THRESHOLD: u32 = 3;

/// 컨텍스트에 IP가 없을 때 사용하는 값
pub const UNKNOWN_IP: &str = "unknown";

/// 기본 시그니처 (대소문자 무시로 컴파일됨)
pub const DEFAULT_SIGNATURES: &[&str] = &[
    // DML/DQL 키워드
    r"(?:select\s.*from|insert\s+into|update\s+\w+\s+set|delete\s+from)",
    // UNION 기반 인젝션
    r"(?:union\s+select|union\s+all\s+select)",
    // 스키마 파괴 구문
    r"(?:drop\s+table|truncate\s+table|create\s+table)",
    // 주석/종결자 우회
    r"(?:/\*.*?\*/|--|#|/\*\*/)",
    // 문자열 연결 우회
    r"(?:'\s*\+\s*'\s*\+\s*')",
    // 시간 기반 블라인드
    r"(?:waitfor\s+delay|sleep\s*\(|benchmark\s*\()",
    // 조건 기반 블라인드
    r"(?:if\s*\([^)]*\)\s*[=<>]+\s*\d+\s*,\s*\w+\s*,\s*\w+\))",
    // MySQL 버전 주석
    r"(?:/\*!\d{5}.*?\*/)",
];

/// SQL 인젝션 탐지기
#[derive(Debug, Clone)]
pub struct SqlInjectionDetector {
    enabled: bool,
    signatures: Vec<Signature>,
    threshold: u32,
    match_count: u32,
}

impl SqlInjectionDetector {
    /// 기본 시그니처와 기본 임계값으로 생성합니다.
    pub fn new() -> Self {
        Self::with_custom_patterns(true, DEFAULT_THRESHOLD, Vec::<PatternSource>::new())
    }

    /// 설정 섹션으로부터 생성합니다.
    ///
    /// 잘못된 커스텀 패턴은 기록 후 제외되며 생성 자체는 실패하지 않습니다.
    pub fn from_config(config: &SqlInjectionConfig) -> Self {
        Self::with_custom_patterns(config.enabled, config.threshold, config.patterns.iter())
    }

    /// 기본 시그니처 뒤에 커스텀 패턴을 덧붙여 생성합니다.
    ///
    /// 임계값 0은 1로 취급합니다.
    pub fn with_custom_patterns<I, P>(enabled: bool, threshold: u32, custom: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PatternSource>,
    {
        let sources = DEFAULT_SIGNATURES
            .iter()
            .map(|p| PatternSource::from(*p))
            .chain(custom.into_iter().map(Into::into));

        Self {
            enabled,
            signatures: compile_patterns(DETECTOR_NAME, sources),
            threshold: threshold.max(1),
            match_count: 0,
        }
    }

    /// 현재 연속 매칭 수
    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// 컴파일된 시그니처 (기본 시그니처가 앞에 옴)
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    fn build_anomaly(&self, pattern: &str, line: &str, context: &AnalysisContext) -> Anomaly {
        let ip = context.ip_address().unwrap_or(UNKNOWN_IP);
        let timestamp = context.timestamp().cloned().unwrap_or(Value::Null);

        Anomaly::new(format!("possible SQL injection detected from IP {ip}"))
            .with_severity(Severity::High)
            .with_context("detector", DETECTOR_NAME)
            .with_context("pattern", pattern)
            .with_context("log_entry", line)
            .with_context("match_count", self.match_count)
            .with_context(AnalysisContext::IP_ADDRESS, ip)
            .with_context(AnalysisContext::TIMESTAMP, timestamp)
    }
}

impl Default for SqlInjectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for SqlInjectionDetector {
    fn name(&self) -> &str {
        DETECTOR_NAME
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn analyze(
        &mut self,
        line: &str,
        context: &AnalysisContext,
    ) -> Result<Verdict, AnalysisError> {
        if !self.enabled {
            return Ok(Verdict::Clean);
        }

        let Some(signature) = self.signatures.iter().find(|s| s.is_match(line)) else {
            self.match_count = 0;
            return Ok(Verdict::Clean);
        };

        self.match_count += 1;
        if self.match_count < self.threshold {
            return Ok(Verdict::Suspicious);
        }

        let anomaly = self.build_anomaly(signature.source(), line, context);
        // 경보 직후 같은 카운트로 재경보하지 않도록 리셋
        self.match_count = 0;
        Ok(Verdict::Anomaly(anomaly))
    }
}
