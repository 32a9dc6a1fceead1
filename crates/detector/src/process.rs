//! 탐지기 공통 처리 경계
//!
//! [`DetectorExt::process`]는 모든 [`Detector`]에 blanket 구현으로 제공되며
//! 개별 탐지기가 재정의할 수 없습니다. `analyze`의 세 가지 결과와 내부 결함을
//! 하나의 `bool`로 접고, 이상 신호와 결함만 구조화된 로그 레코드로 남깁니다.
//!
//! | analyze 결과      | 반환  | 로그 레코드 |
//! |-------------------|-------|-------------|
//! | `Clean`           | false | 없음        |
//! | `Suspicious`      | true  | 없음        |
//! | `Anomaly(..)`     | true  | warn        |
//! | `Err(..)`         | false | error       |

use metrics::counter;
use serde_json::Value;
use tracing::{error, warn};

use shadowguard_core::metrics::{
    DETECTOR_ANOMALIES_TOTAL, DETECTOR_FAULTS_TOTAL, LABEL_DETECTOR, LABEL_SEVERITY,
};
use shadowguard_core::pipeline::{AnalysisError, Anomaly, Detector, Verdict};
use shadowguard_core::types::AnalysisContext;

/// 로그 레코드에 복사되는 원본 라인의 최대 문자 수
pub const MAX_LOG_ENTRY_CHARS: usize = 1000;

/// 이상 신호 컨텍스트에 호출자 컨텍스트를 병합할 때 쓰는 키
pub const ORIGINAL_CONTEXT_KEY: &str = "original_context";

/// 모든 탐지기에 제공되는 처리 래퍼
pub trait DetectorExt: Detector {
    /// 로그 라인을 처리하고 위협 여부를 반환합니다.
    ///
    /// 비활성화된 탐지기나 빈 라인은 `analyze`를 호출하지 않고 `false`를 반환합니다.
    /// 이상 신호와 내부 결함은 이 경계를 넘어 전파되지 않습니다.
    fn process(&mut self, line: &str, context: &AnalysisContext) -> bool {
        if !self.is_enabled() || line.is_empty() {
            return false;
        }

        match self.analyze(line, context) {
            Ok(Verdict::Clean) => false,
            Ok(Verdict::Suspicious) => true,
            Ok(Verdict::Anomaly(anomaly)) => {
                report_anomaly(self.name(), &anomaly, line, context);
                true
            }
            Err(fault) => {
                report_fault(self.name(), &fault, line, context);
                false
            }
        }
    }
}

impl<D: Detector + ?Sized> DetectorExt for D {}

/// 문자 경계를 지키면서 라인을 [`MAX_LOG_ENTRY_CHARS`]자로 자릅니다.
pub fn truncate_entry(line: &str) -> &str {
    match line.char_indices().nth(MAX_LOG_ENTRY_CHARS) {
        Some((idx, _)) => &line[..idx],
        None => line,
    }
}

fn report_anomaly(detector: &str, anomaly: &Anomaly, line: &str, context: &AnalysisContext) {
    let mut merged = anomaly.context.clone();
    merged.insert(ORIGINAL_CONTEXT_KEY.to_owned(), context.to_value());
    // tracing 매크로 내부에서 `Value`는 tracing::field::Value로 해석되므로 미리 바인딩
    let merged = Value::Object(merged);

    warn!(
        detector,
        severity = %anomaly.severity,
        context = %merged,
        log_entry = truncate_entry(line),
        "anomaly detected by {}: {}",
        detector,
        anomaly.message
    );

    counter!(
        DETECTOR_ANOMALIES_TOTAL,
        LABEL_DETECTOR => detector.to_owned(),
        LABEL_SEVERITY => anomaly.severity.as_str()
    )
    .increment(1);
}

fn report_fault(detector: &str, fault: &AnalysisError, line: &str, context: &AnalysisContext) {
    error!(
        detector,
        log_entry = truncate_entry(line),
        context = %context.to_value(),
        error = %fault,
        "error in detector {}: {}",
        detector,
        fault
    );

    counter!(DETECTOR_FAULTS_TOTAL, LABEL_DETECTOR => detector.to_owned()).increment(1);
}
