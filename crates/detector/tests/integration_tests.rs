//! 통합 테스트 -- 설정부터 스캔 결과까지 전체 흐름 검증
//!
//! 공개 API만 사용해서 설정 파싱, 스캐너 구성, 라인 분석, 샤딩을 확인합니다.

use std::io::Cursor;

use shadowguard_core::config::ShadowguardConfig;
use shadowguard_core::pipeline::{AnalysisError, Detector, Verdict};
use shadowguard_core::types::{AnalysisContext, Severity};
use shadowguard_core::Anomaly;
use shadowguard_detector::{
    DEFAULT_SIGNATURES, DetectorExt, ScanSummary, Scanner, ShardedScanner, SqlInjectionDetector,
};

/// 연속 실패 로그인 횟수로 경보를 내는 탐지기 (새 탐지기 종류 확장 확인용)
struct FailedLoginDetector {
    streak: u32,
}

impl Detector for FailedLoginDetector {
    fn name(&self) -> &str {
        "failed_login"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn analyze(
        &mut self,
        line: &str,
        _context: &AnalysisContext,
    ) -> Result<Verdict, AnalysisError> {
        if !line.contains("Failed password") {
            self.streak = 0;
            return Ok(Verdict::Clean);
        }
        self.streak += 1;
        if self.streak >= 2 {
            self.streak = 0;
            return Ok(Verdict::Anomaly(
                Anomaly::new("repeated failed logins").with_severity(Severity::Medium),
            ));
        }
        Ok(Verdict::Suspicious)
    }
}

/// 항상 내부 결함을 반환하는 탐지기
struct BrokenDetector;

impl Detector for BrokenDetector {
    fn name(&self) -> &str {
        "broken"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn analyze(
        &mut self,
        _line: &str,
        _context: &AnalysisContext,
    ) -> Result<Verdict, AnalysisError> {
        Err(std::io::Error::other("lookup table unavailable").into())
    }
}

fn ctx(ip: &str) -> AnalysisContext {
    AnalysisContext::new()
        .with("ip_address", ip)
        .with("timestamp", "2024-01-15T12:00:00Z")
}

/// 설정 파일 → 스캐너 → 시나리오 흐름 테스트
#[test]
fn test_config_to_scanner_flow() {
    let config = ShadowguardConfig::parse(
        r#"
[detectors.sql_injection]
enabled = true
threshold = 3
patterns = ['xp_cmdshell']
"#,
    )
    .expect("config should parse");
    config.validate().expect("config should validate");

    let mut scanner = Scanner::from_config(&config.detectors).expect("scanner should build");
    let ctx = ctx("192.168.1.100");

    assert!(scanner.analyze_log("SELECT * FROM users", &ctx));
    assert!(scanner.analyze_log("SELECT * FROM users WHERE 1=1 --", &ctx));
    assert!(scanner.analyze_log("UNION SELECT password FROM users", &ctx));
    assert!(!scanner.analyze_log("GET /home HTTP/1.1", &ctx));
}

/// 세 번째 연속 매칭에서 High 이상 신호와 match_count 3
#[test]
fn test_threshold_scenario_anomaly_content() {
    let mut detector = SqlInjectionDetector::new();
    let ctx = ctx("192.168.1.100");

    detector.analyze("SELECT * FROM users", &ctx).unwrap();
    detector
        .analyze("SELECT * FROM users WHERE 1=1 --", &ctx)
        .unwrap();
    let verdict = detector
        .analyze("UNION SELECT password FROM users", &ctx)
        .unwrap();

    match verdict {
        Verdict::Anomaly(anomaly) => {
            assert_eq!(anomaly.severity, Severity::High);
            assert_eq!(anomaly.context["match_count"], 3);
            assert!(anomaly.message.contains("192.168.1.100"));
        }
        other => panic!("expected anomaly, got {other:?}"),
    }
}

/// 새 탐지기 종류를 오케스트레이터 수정 없이 추가
#[test]
fn test_custom_detector_kind_plugs_in() {
    let mut scanner = Scanner::builder()
        .detector(SqlInjectionDetector::new())
        .detector(FailedLoginDetector { streak: 0 })
        .build()
        .expect("distinct names");

    let ctx = ctx("10.0.0.7");
    assert!(scanner.analyze_log("sshd: Failed password for root", &ctx));
    assert!(scanner.analyze_log("sshd: Failed password for root", &ctx));
    assert!(!scanner.analyze_log("sshd: Accepted publickey for deploy", &ctx));
    assert_eq!(scanner.detector_names(), vec!["sql_injection", "failed_login"]);
}

/// 결함이 있는 탐지기가 있어도 정상 탐지기 결과가 유지됨
#[test]
fn test_fault_isolation_across_detectors() {
    let mut scanner = Scanner::builder()
        .detector(BrokenDetector)
        .detector(SqlInjectionDetector::new())
        .build()
        .expect("distinct names");
    let ctx = ctx("10.0.0.8");

    assert!(scanner.analyze_log("DROP TABLE users", &ctx));
    assert!(!scanner.analyze_log("GET /home HTTP/1.1", &ctx));
}

/// process 경계는 결함을 false로 흡수
#[test]
fn test_process_absorbs_faults() {
    let mut detector = BrokenDetector;
    assert!(!detector.process("SELECT * FROM users", &AnalysisContext::new()));
}

/// 잘못된 커스텀 패턴이 있어도 나머지 패턴으로 동작
#[test]
fn test_malformed_custom_pattern_is_dropped() {
    let config = ShadowguardConfig::parse(
        "[detectors.sql_injection]\npatterns = ['(unclosed', 'xp_cmdshell', 7]\n",
    )
    .expect("config should parse");

    let detector = SqlInjectionDetector::from_config(&config.detectors.sql_injection);
    assert_eq!(detector.signatures().len(), DEFAULT_SIGNATURES.len() + 1);

    let mut scanner = Scanner::builder().detector(detector).build().unwrap();
    assert!(scanner.analyze_log("EXEC xp_cmdshell 'net user'", &AnalysisContext::new()));
}

/// 비활성화된 탐지기는 아무것도 탐지하지 않음
#[test]
fn test_disabled_detector_from_config() {
    let config =
        ShadowguardConfig::parse("[detectors.sql_injection]\nenabled = false\n").unwrap();
    let mut scanner = Scanner::from_config(&config.detectors).unwrap();
    assert!(!scanner.analyze_log("DROP TABLE users", &AnalysisContext::new()));
}

/// 리더 기반 배치 스캔
#[test]
fn test_scan_lines_from_reader() {
    let log = "\
GET /home HTTP/1.1
GET /item?id=1 UNION SELECT password FROM users HTTP/1.1

GET /about HTTP/1.1
";
    let mut scanner = Scanner::from_config(&ShadowguardConfig::default().detectors).unwrap();
    let summary = scanner
        .scan_lines(Cursor::new(log), &ctx("172.16.0.4"))
        .expect("in-memory reader never fails");

    assert_eq!(
        summary,
        ScanSummary {
            lines_read: 4,
            blank_lines: 1,
            threats: 1,
            flagged_lines: vec![2],
        }
    );
}

/// 출발지별 샤딩: 다른 IP의 라인이 섞여도 각자의 카운터 유지
#[test]
fn test_sharding_keeps_sources_apart() {
    let mut config = ShadowguardConfig::default();
    config.scan.shard_by_source = true;
    config.detectors.sql_injection.threshold = 2;
    let sharded = ShardedScanner::from_config(&config).unwrap();

    let attack = "id=1; DROP TABLE users";
    assert!(sharded.analyze_log(attack, &ctx("1.1.1.1")));
    // 다른 출발지의 정상 라인은 1.1.1.1의 카운터를 리셋하지 않음
    assert!(!sharded.analyze_log("GET /home HTTP/1.1", &ctx("2.2.2.2")));
    assert!(sharded.analyze_log(attack, &ctx("1.1.1.1")));
    assert_eq!(sharded.shard_count(), 2);
}
