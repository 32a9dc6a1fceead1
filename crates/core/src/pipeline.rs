//! 탐지기 trait -- 모듈 확장 포인트 정의
//!
//! 새로운 탐지기 종류는 [`Detector`]만 구현하면 오케스트레이터를 수정하지 않고
//! 파이프라인에 추가됩니다. 실패 격리와 로그 기록을 담당하는 `process` 래퍼는
//! `shadowguard-detector` 크레이트에서 모든 탐지기에 공통으로 제공됩니다.

use std::error::Error;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{AnalysisContext, Severity};

/// 탐지기 내부 결함
///
/// 탐지기 구현마다 실패 원인이 다르므로 타입을 고정하지 않습니다.
pub type AnalysisError = Box<dyn Error + Send + Sync>;

/// 이상 신호
///
/// 탐지기가 "공격이 확실하다"고 판단했을 때 만드는 구조화된 이벤트입니다.
/// `process` 경계에서 경고 레코드로 변환된 뒤 버려집니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// 사람이 읽는 설명
    pub message: String,
    /// 심각도
    pub severity: Severity,
    /// 탐지 근거 (탐지기 이름, 매칭된 패턴 등)
    pub context: Map<String, Value>,
}

impl Anomaly {
    /// 기본 심각도(`Medium`)의 이상 신호를 생성합니다.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::default(),
            context: Map::new(),
        }
    }

    /// 심각도를 지정합니다.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// 컨텍스트 필드를 추가합니다.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// `analyze` 결과
///
/// 정상 반환(`Clean`/`Suspicious`)과 확신 신호(`Anomaly`)를 같은 타입으로 표현합니다.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// 매칭 없음
    Clean,
    /// 의심스러운 라인 (임계값 미만)
    Suspicious,
    /// 임계값 도달 -- 공격으로 판단
    Anomaly(Anomaly),
}

impl Verdict {
    /// 위협으로 집계되는 결과인지 여부
    pub fn is_threat(&self) -> bool {
        !matches!(self, Self::Clean)
    }
}

/// 탐지 로직을 구현하는 trait
///
/// `analyze`는 탐지기 내부 상태(매칭 카운터 등)를 갱신하므로 `&mut self`를 받습니다.
/// 한 탐지기 인스턴스는 한 번에 하나의 호출자만 사용해야 하며,
/// 라인 순서가 보존되어야 임계값 의미가 유지됩니다.
pub trait Detector: Send {
    /// 탐지기 이름
    fn name(&self) -> &str;

    /// 활성화 여부
    fn is_enabled(&self) -> bool;

    /// 로그 라인을 분석합니다.
    ///
    /// 내부 결함은 `Err`로 반환하며, 호출 측(`process`)에서 기록 후 흡수됩니다.
    fn analyze(
        &mut self,
        line: &str,
        context: &AnalysisContext,
    ) -> Result<Verdict, AnalysisError>;
}
