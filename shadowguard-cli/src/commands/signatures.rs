//! `shadowguard signatures` command handler

use std::io::Write;

use serde::Serialize;

use shadowguard_core::config::ShadowguardConfig;
use shadowguard_detector::{DEFAULT_SIGNATURES, SqlInjectionDetector};
use shadowguard_detector::sql_injection::DETECTOR_NAME;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `signatures` command.
///
/// Compiles the configured detector and lists the signatures that survived
/// compilation. Rejected custom patterns are reported through the log.
pub fn execute(config: &ShadowguardConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let report = build_report(config);
    writer.render(&report)
}

fn build_report(config: &ShadowguardConfig) -> SignatureReport {
    let section = &config.detectors.sql_injection;
    let detector = SqlInjectionDetector::from_config(section);

    let signatures = detector
        .signatures()
        .iter()
        .enumerate()
        .map(|(idx, signature)| SignatureEntry {
            origin: if idx < DEFAULT_SIGNATURES.len() {
                "default"
            } else {
                "custom"
            },
            pattern: signature.source().to_owned(),
        })
        .collect();

    SignatureReport {
        detector: DETECTOR_NAME.to_owned(),
        enabled: section.enabled,
        threshold: detector.threshold(),
        configured_custom: section.patterns.len(),
        signatures,
    }
}

/// Signature listing payload.
#[derive(Debug, Serialize)]
pub struct SignatureReport {
    pub detector: String,
    pub enabled: bool,
    pub threshold: u32,
    /// Number of custom entries in the configuration, before compilation.
    pub configured_custom: usize,
    pub signatures: Vec<SignatureEntry>,
}

#[derive(Debug, Serialize)]
pub struct SignatureEntry {
    pub origin: &'static str,
    pub pattern: String,
}

impl SignatureReport {
    fn rejected(&self) -> usize {
        let compiled_custom = self
            .signatures
            .iter()
            .filter(|s| s.origin == "custom")
            .count();
        self.configured_custom.saturating_sub(compiled_custom)
    }
}

impl Render for SignatureReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let status = if self.enabled {
            "enabled".green()
        } else {
            "disabled".yellow()
        };
        writeln!(w, "Detector: {} ({})", self.detector.bold(), status)?;
        writeln!(w, "Threshold: {}", self.threshold)?;
        writeln!(w)?;

        writeln!(w, "{:<4} {:<8} Pattern", "#", "Origin")?;
        writeln!(w, "{}", "-".repeat(80))?;
        for (idx, s) in self.signatures.iter().enumerate() {
            writeln!(w, "{:<4} {:<8} {}", idx + 1, s.origin, s.pattern)?;
        }

        let rejected = self.rejected();
        if rejected > 0 {
            writeln!(w)?;
            writeln!(
                w,
                "{}",
                format!("{} custom pattern(s) rejected, see log for details", rejected).red()
            )?;
        }

        Ok(())
    }
}
