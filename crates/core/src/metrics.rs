//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 탐지기 크레이트는 이 상수를 사용하여 `metrics::counter!()` 매크로를 호출합니다.
//! 전역 레코더가 설치되지 않은 경우 모든 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `shadowguard_`
//! - 접미어: `_total` (counter), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 탐지기 이름 레이블 키
pub const LABEL_DETECTOR: &str = "detector";

/// 심각도 레이블 키 (low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

// ─── Scanner 메트릭 ─────────────────────────────────────────────────

/// Scanner: 분석된 로그 라인 수 (counter)
pub const SCANNER_LINES_ANALYZED_TOTAL: &str = "shadowguard_scanner_lines_analyzed_total";

/// Scanner: 위협으로 판정된 라인 수 (counter)
pub const SCANNER_THREATS_DETECTED_TOTAL: &str = "shadowguard_scanner_threats_detected_total";

/// Scanner: `process` 밖으로 새어 나온 패닉 수 (counter, label: detector)
pub const SCANNER_DETECTOR_PANICS_TOTAL: &str = "shadowguard_scanner_detector_panics_total";

/// Scanner: 현재 유지 중인 샤드 수 (gauge)
pub const SCANNER_ACTIVE_SHARDS: &str = "shadowguard_scanner_active_shards";

// ─── Detector 메트릭 ────────────────────────────────────────────────

/// Detector: 이상 신호 수 (counter, labels: detector, severity)
pub const DETECTOR_ANOMALIES_TOTAL: &str = "shadowguard_detector_anomalies_total";

/// Detector: 내부 결함 수 (counter, label: detector)
pub const DETECTOR_FAULTS_TOTAL: &str = "shadowguard_detector_faults_total";

/// Detector: 컴파일에서 제외된 패턴 수 (counter, label: detector)
pub const DETECTOR_PATTERNS_REJECTED_TOTAL: &str = "shadowguard_detector_patterns_rejected_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        SCANNER_LINES_ANALYZED_TOTAL,
        "Total number of non-blank log lines fed to the detectors"
    );
    describe_counter!(
        SCANNER_THREATS_DETECTED_TOTAL,
        "Total number of log lines flagged by at least one detector"
    );
    describe_counter!(
        SCANNER_DETECTOR_PANICS_TOTAL,
        "Total number of panics caught around detector processing"
    );
    describe_gauge!(
        SCANNER_ACTIVE_SHARDS,
        "Number of per-source scanners currently held"
    );
    describe_counter!(
        DETECTOR_ANOMALIES_TOTAL,
        "Total number of anomalies signaled by detectors"
    );
    describe_counter!(
        DETECTOR_FAULTS_TOTAL,
        "Total number of internal detector faults absorbed"
    );
    describe_counter!(
        DETECTOR_PATTERNS_REJECTED_TOTAL,
        "Total number of configured patterns dropped during compilation"
    );
}
