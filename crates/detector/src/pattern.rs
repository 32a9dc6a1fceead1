//! 시그니처 컴파일 -- 설정된 패턴 소스를 대소문자 무시 정규식으로 변환
//!
//! [`compile_patterns`]는 입력 순서를 유지하면서 각 소스를 [`Signature`]로 컴파일합니다.
//! 잘못된 정규식은 에러 레코드를, 지원하지 않는 타입은 경고 레코드를 남기고 제외하며,
//! 한 항목의 실패가 나머지 항목의 컴파일을 막지 않습니다.
//!
//! `regex` 크레이트는 백트래킹 없이 선형 시간에 매칭하므로 재앙적 백트래킹이 없습니다.
//! 비정상적으로 큰 패턴은 [`SIGNATURE_SIZE_LIMIT`]에 걸려 잘못된 패턴으로 처리됩니다.

use std::fmt;

use metrics::counter;
use regex::{Regex, RegexBuilder};
use tracing::{error, warn};

use shadowguard_core::config::PatternEntry;
use shadowguard_core::metrics::{DETECTOR_PATTERNS_REJECTED_TOTAL, LABEL_DETECTOR};

/// 컴파일된 시그니처 하나의 최대 크기 (바이트)
pub const SIGNATURE_SIZE_LIMIT: usize = 4 * (1 << 20);

/// 패턴 소스
#[derive(Debug, Clone)]
pub enum PatternSource {
    /// 정규식 소스 문자열 (대소문자 무시로 컴파일)
    Raw(String),
    /// 이미 컴파일된 정규식 (플래그 그대로 사용)
    Compiled(Regex),
    /// 지원하지 않는 타입의 설정 값
    Unsupported {
        /// 값의 타입 이름
        type_name: String,
    },
}

impl From<&str> for PatternSource {
    fn from(source: &str) -> Self {
        Self::Raw(source.to_owned())
    }
}

impl From<String> for PatternSource {
    fn from(source: String) -> Self {
        Self::Raw(source)
    }
}

impl From<Regex> for PatternSource {
    fn from(regex: Regex) -> Self {
        Self::Compiled(regex)
    }
}

impl From<&PatternEntry> for PatternSource {
    fn from(entry: &PatternEntry) -> Self {
        match entry {
            PatternEntry::Source(source) => Self::Raw(source.clone()),
            other => Self::Unsupported {
                type_name: other.type_name().to_owned(),
            },
        }
    }
}

/// 컴파일된 시그니처
///
/// 생성 후 변경되지 않으며, 소유한 탐지기와 수명을 같이합니다.
#[derive(Debug, Clone)]
pub struct Signature {
    regex: Regex,
}

impl Signature {
    /// 원본 패턴 소스
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    /// 로그 라인의 어느 위치에서든 매칭되는지 검사합니다.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source())
    }
}

/// 단일 정규식 소스를 대소문자 무시로 컴파일합니다.
pub fn compile_signature(source: &str) -> Result<Signature, regex::Error> {
    let regex = RegexBuilder::new(source)
        .case_insensitive(true)
        .size_limit(SIGNATURE_SIZE_LIMIT)
        .build()?;
    Ok(Signature { regex })
}

/// 패턴 소스 목록을 시그니처 목록으로 컴파일합니다.
///
/// 반환 길이는 입력 길이 이하이며, 개별 패턴의 실패로 에러를 반환하지 않습니다.
pub fn compile_patterns<I>(detector: &str, sources: I) -> Vec<Signature>
where
    I: IntoIterator<Item = PatternSource>,
{
    let mut signatures = Vec::new();

    for source in sources {
        match source {
            PatternSource::Raw(pattern) => match compile_signature(&pattern) {
                Ok(signature) => signatures.push(signature),
                Err(e) => {
                    error!(
                        detector,
                        pattern = pattern.as_str(),
                        error = %e,
                        "failed to compile signature pattern, skipping"
                    );
                    reject(detector);
                }
            },
            PatternSource::Compiled(regex) => signatures.push(Signature { regex }),
            PatternSource::Unsupported { type_name } => {
                warn!(
                    detector,
                    pattern_type = type_name.as_str(),
                    "unsupported pattern type, skipping"
                );
                reject(detector);
            }
        }
    }

    signatures
}

fn reject(detector: &str) {
    counter!(DETECTOR_PATTERNS_REJECTED_TOTAL, LABEL_DETECTOR => detector.to_owned()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn raw(patterns: &[&str]) -> Vec<PatternSource> {
        patterns.iter().map(|p| PatternSource::from(*p)).collect()
    }

    #[test]
    fn compiles_in_input_order() {
        let signatures = compile_patterns("test", raw(&["union\\s+select", "drop\\s+table"]));
        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[0].source(), "union\\s+select");
        assert_eq!(signatures[1].source(), "drop\\s+table");
    }

    #[test]
    fn raw_patterns_are_case_insensitive() {
        let signatures = compile_patterns("test", raw(&["union\\s+select"]));
        assert!(signatures[0].is_match("1 UNION SELECT password"));
        assert!(signatures[0].is_match("1 UnIoN sElEcT password"));
    }

    #[test]
    fn precompiled_regex_keeps_its_flags() {
        let case_sensitive = Regex::new("DROP").unwrap();
        let signatures = compile_patterns("test", vec![PatternSource::from(case_sensitive)]);
        assert_eq!(signatures.len(), 1);
        assert!(signatures[0].is_match("DROP"));
        assert!(!signatures[0].is_match("drop"));
    }

    #[traced_test]
    #[test]
    fn malformed_pattern_is_dropped_and_logged_once() {
        let signatures = compile_patterns(
            "test",
            raw(&["sleep\\s*\\(", "(unclosed", "benchmark\\s*\\("]),
        );

        assert_eq!(signatures.len(), 2);
        assert_eq!(signatures[0].source(), "sleep\\s*\\(");
        assert_eq!(signatures[1].source(), "benchmark\\s*\\(");

        logs_assert(|lines: &[&str]| {
            let errors = lines
                .iter()
                .filter(|l| l.contains("ERROR") && l.contains("failed to compile signature"))
                .count();
            if errors == 1 {
                Ok(())
            } else {
                Err(format!("expected 1 error record, found {errors}"))
            }
        });
    }

    #[traced_test]
    #[test]
    fn unsupported_entry_is_dropped_with_warning() {
        let sources = vec![
            PatternSource::Unsupported {
                type_name: "integer".to_owned(),
            },
            PatternSource::from("waitfor\\s+delay"),
        ];
        let signatures = compile_patterns("test", sources);

        assert_eq!(signatures.len(), 1);
        assert!(logs_contain("unsupported pattern type"));
        assert!(logs_contain("integer"));
    }

    #[test]
    fn pattern_entry_conversion() {
        let entry = PatternEntry::from("xp_cmdshell");
        assert!(matches!(PatternSource::from(&entry), PatternSource::Raw(_)));

        let config = shadowguard_core::config::ShadowguardConfig::parse(
            "[detectors.sql_injection]\npatterns = [42]\n",
        )
        .unwrap();
        let other = &config.detectors.sql_injection.patterns[0];
        match PatternSource::from(other) {
            PatternSource::Unsupported { type_name } => assert_eq!(type_name, "integer"),
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn all_invalid_yields_empty() {
        let signatures = compile_patterns("test", raw(&["(", "[z-a]", "*"]));
        assert!(signatures.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn compile_never_grows_and_never_panics(patterns in prop::collection::vec(".{0,20}", 0..8)) {
                let sources: Vec<PatternSource> =
                    patterns.iter().map(|p| PatternSource::from(p.as_str())).collect();
                let signatures = compile_patterns("proptest", sources);
                prop_assert!(signatures.len() <= patterns.len());
            }
        }
    }
}
