#![no_main]

use libfuzzer_sys::fuzz_target;

use shadowguard_detector::{PatternSource, compile_patterns};

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // 줄마다 하나의 패턴 소스
        let sources = content.lines().map(PatternSource::from);
        let signatures = compile_patterns("fuzz", sources);
        assert!(signatures.len() <= content.lines().count());
        for signature in &signatures {
            let _ = signature.is_match(content);
        }
    }
});
