//! 스캔 오케스트레이터
//!
//! [`Scanner`]는 시작 시 한 번 구성된 탐지기 레지스트리를 보유하고,
//! 로그 라인 하나를 모든 탐지기에 순서대로 전달한 뒤 결과를 하나의 `bool`로 집계합니다.
//!
//! # 실패 격리
//!
//! `process`는 결함을 스스로 흡수하지만, 계약을 어긴 탐지기가 panic을 일으키는 경우에도
//! 해당 탐지기만 "위협 없음"으로 처리하고 나머지 탐지기는 계속 실행합니다.
//! 조기 종료가 없으므로 모든 탐지기의 카운터는 항상 같은 라인 순서를 봅니다.

use std::any::Any;
use std::io::BufRead;
use std::panic::{self, AssertUnwindSafe};

use metrics::counter;
use serde::Serialize;
use tracing::{debug, error, info};

use shadowguard_core::config::DetectorsConfig;
use shadowguard_core::metrics::{
    LABEL_DETECTOR, SCANNER_DETECTOR_PANICS_TOTAL, SCANNER_LINES_ANALYZED_TOTAL,
    SCANNER_THREATS_DETECTED_TOTAL,
};
use shadowguard_core::pipeline::Detector;
use shadowguard_core::types::AnalysisContext;

use crate::error::DetectorError;
use crate::lines::lossy_lines;
use crate::process::DetectorExt;
use crate::sql_injection::SqlInjectionDetector;

/// 탐지기 레지스트리와 라인 단위 분석 진입점
pub struct Scanner {
    detectors: Vec<Box<dyn Detector>>,
}

impl Scanner {
    /// 빌더를 생성합니다.
    pub fn builder() -> ScannerBuilder {
        ScannerBuilder::new()
    }

    /// 이름 중복 검사 없이 레지스트리를 구성합니다.
    pub(crate) fn from_detectors(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// 설정에 정의된 탐지기로 스캐너를 구성합니다.
    ///
    /// 비활성화된 탐지기도 레지스트리에는 등록되며 `process`에서 건너뜁니다.
    pub fn from_config(config: &DetectorsConfig) -> Result<Self, DetectorError> {
        Self::builder()
            .detector(SqlInjectionDetector::from_config(&config.sql_injection))
            .build()
    }

    /// 등록 순서대로 탐지기 이름을 반환합니다.
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// 등록된 탐지기 수
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// 로그 라인 하나를 모든 탐지기에 전달하고 위협 여부를 반환합니다.
    ///
    /// 공백뿐인 라인은 어떤 탐지기도 호출하지 않고 `false`를 반환합니다.
    pub fn analyze_log(&mut self, line: &str, context: &AnalysisContext) -> bool {
        if line.trim().is_empty() {
            return false;
        }

        counter!(SCANNER_LINES_ANALYZED_TOTAL).increment(1);

        let mut threat = false;
        for detector in &mut self.detectors {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| detector.process(line, context)));
            match outcome {
                Ok(found) => threat |= found,
                Err(payload) => {
                    let name = detector.name();
                    error!(
                        detector = name,
                        panic = panic_message(payload.as_ref()),
                        "detector {} panicked while processing a line",
                        name
                    );
                    counter!(SCANNER_DETECTOR_PANICS_TOTAL, LABEL_DETECTOR => name.to_owned())
                        .increment(1);
                }
            }
        }

        if threat {
            counter!(SCANNER_THREATS_DETECTED_TOTAL).increment(1);
        }
        threat
    }

    /// 리더의 모든 라인을 같은 컨텍스트로 분석합니다.
    ///
    /// 읽기 실패만 에러로 반환되며, 분석 실패는 라인 단위로 흡수됩니다.
    /// UTF-8이 아닌 바이트는 치환된 채로 분석됩니다.
    pub fn scan_lines<R: BufRead>(
        &mut self,
        reader: R,
        context: &AnalysisContext,
    ) -> Result<ScanSummary, DetectorError> {
        let mut summary = ScanSummary::default();

        for (idx, line) in lossy_lines(reader).enumerate() {
            let line = line?;
            let threat = self.analyze_log(&line, context);
            summary.record(idx + 1, &line, threat);
        }

        info!(
            lines_read = summary.lines_read,
            threats = summary.threats,
            "scan finished"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("detectors", &self.detector_names())
            .finish()
    }
}

/// [`Scanner`] 빌더
///
/// 등록 순서가 곧 호출 순서입니다. 같은 이름의 탐지기는 두 번 등록할 수 없습니다.
#[derive(Default)]
pub struct ScannerBuilder {
    detectors: Vec<Box<dyn Detector>>,
}

impl ScannerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 탐지기를 등록합니다.
    pub fn detector(self, detector: impl Detector + 'static) -> Self {
        self.boxed(Box::new(detector))
    }

    /// 박싱된 탐지기를 등록합니다.
    pub fn boxed(mut self, detector: Box<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// 스캐너를 생성합니다.
    ///
    /// # Errors
    ///
    /// 같은 이름의 탐지기가 두 번 이상 등록된 경우 `DetectorError::Build`를 반환합니다.
    pub fn build(self) -> Result<Scanner, DetectorError> {
        for (i, detector) in self.detectors.iter().enumerate() {
            let name = detector.name();
            if self.detectors[..i].iter().any(|d| d.name() == name) {
                return Err(DetectorError::Build {
                    detector: name.to_owned(),
                    reason: "detector registered more than once".to_owned(),
                });
            }
        }

        debug!(
            detectors = self.detectors.len(),
            "scanner registry built"
        );
        Ok(Scanner {
            detectors: self.detectors,
        })
    }
}

/// 배치 스캔 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// 읽은 전체 라인 수
    pub lines_read: usize,
    /// 공백뿐인 라인 수
    pub blank_lines: usize,
    /// 위협으로 판정된 라인 수
    pub threats: usize,
    /// 위협으로 판정된 라인 번호 (1부터 시작)
    pub flagged_lines: Vec<usize>,
}

impl ScanSummary {
    /// 한 라인의 결과를 누적합니다.
    pub fn record(&mut self, line_number: usize, line: &str, threat: bool) {
        self.lines_read += 1;
        if line.trim().is_empty() {
            self.blank_lines += 1;
        }
        if threat {
            self.threats += 1;
            self.flagged_lines.push(line_number);
        }
    }

    /// 위협이 하나라도 있었는지 여부
    pub fn has_threats(&self) -> bool {
        self.threats > 0
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}
