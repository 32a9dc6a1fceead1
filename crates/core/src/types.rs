//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 탐지기와 오케스트레이터, CLI가 공유하는 데이터 구조를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 심각도 레벨
///
/// 이상 신호의 심각도를 나타냅니다.
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`Low < Medium < High < Critical`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    #[default]
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 -- 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 로그 레코드에 기록되는 소문자 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분석 컨텍스트
///
/// 호출자가 로그 라인과 함께 넘기는 부가 정보 (`ip_address`, `timestamp` 등)입니다.
/// 탐지기 입장에서는 읽기 전용이며 한 번의 호출 동안만 유효합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisContext {
    fields: Map<String, Value>,
}

impl AnalysisContext {
    /// 출발지 IP 키
    pub const IP_ADDRESS: &'static str = "ip_address";
    /// 타임스탬프 키
    pub const TIMESTAMP: &'static str = "timestamp";

    /// 빈 컨텍스트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 필드를 추가한 컨텍스트를 반환합니다.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// 필드를 추가하거나 덮어씁니다.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// 필드 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// 문자열 필드를 조회합니다. 문자열이 아니면 `None`입니다.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// `ip_address` 필드
    pub fn ip_address(&self) -> Option<&str> {
        self.get_str(Self::IP_ADDRESS)
    }

    /// `timestamp` 필드 (값 타입 그대로)
    pub fn timestamp(&self) -> Option<&Value> {
        self.get(Self::TIMESTAMP)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON 객체로 변환합니다.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl From<Map<String, Value>> for AnalysisContext {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
