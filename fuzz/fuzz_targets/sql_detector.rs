#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use shadowguard_core::types::AnalysisContext;
use shadowguard_detector::{Scanner, SqlInjectionDetector};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 임계값 (1..=8로 제한)
    threshold: u8,
    /// 순서대로 분석할 로그 라인
    lines: Vec<String>,
    ip_address: Option<String>,
}

fuzz_target!(|input: FuzzInput| {
    let threshold = u32::from(input.threshold % 8) + 1;
    let detector = SqlInjectionDetector::with_custom_patterns(true, threshold, Vec::<&str>::new());
    let Ok(mut scanner) = Scanner::builder().detector(detector).build() else {
        return;
    };

    let mut context = AnalysisContext::new();
    if let Some(ip) = input.ip_address {
        context.insert(AnalysisContext::IP_ADDRESS, ip);
    }

    // 어떤 입력도 panic 없이 bool로 끝나야 함
    for line in input.lines.iter().take(64) {
        let _ = scanner.analyze_log(line, &context);
    }
});
