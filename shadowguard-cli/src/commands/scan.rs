//! `shadowguard scan` command handler

use std::fs::File;
use std::io::{BufRead, BufReader, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use shadowguard_core::config::ShadowguardConfig;
use shadowguard_core::types::AnalysisContext;
use shadowguard_detector::{ScanSummary, Scanner, ShardedScanner, lossy_lines};

use crate::cli::ScanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Maximum characters of a flagged line shown in the report.
const EXCERPT_CHARS: usize = 120;

/// Execute the `scan` command.
///
/// Returns `CliError::Threats` (exit code 4) after rendering the report
/// when at least one line was flagged.
pub async fn execute(
    args: ScanArgs,
    config: &ShadowguardConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = config.clone();
    let report = tokio::task::spawn_blocking(move || run_scan(&args, &config))
        .await
        .map_err(|e| CliError::Command(format!("scan task failed: {}", e)))??;

    writer.render(&report)?;

    if report.summary.has_threats() {
        return Err(CliError::Threats(report.summary.threats));
    }
    Ok(())
}

fn run_scan(args: &ScanArgs, config: &ShadowguardConfig) -> Result<ScanReport, CliError> {
    let mut engine = Engine::from_config(config)?;
    let source = if args.reads_stdin() {
        "<stdin>".to_owned()
    } else {
        args.path.display().to_string()
    };

    info!(
        source = %source,
        sharded = config.scan.shard_by_source,
        json_lines = args.json_lines,
        "starting log scan"
    );

    let options = ScanOptions {
        ip: args.ip.clone(),
        json_lines: args.json_lines,
    };

    let report = if args.reads_stdin() {
        let stdin = std::io::stdin();
        scan_reader(&mut engine, stdin.lock(), &options, source)?
    } else {
        let file = File::open(&args.path)?;
        scan_reader(&mut engine, BufReader::new(file), &options, source)?
    };

    info!(
        lines_read = report.summary.lines_read,
        threats = report.summary.threats,
        "log scan finished"
    );
    Ok(report)
}

/// Single scanner or one scanner per source IP, as configured.
pub enum Engine {
    Single(Scanner),
    Sharded(ShardedScanner),
}

impl Engine {
    pub fn from_config(config: &ShadowguardConfig) -> Result<Self, CliError> {
        if config.scan.shard_by_source {
            Ok(Self::Sharded(ShardedScanner::from_config(config)?))
        } else {
            Ok(Self::Single(Scanner::from_config(&config.detectors)?))
        }
    }

    fn analyze_log(&mut self, line: &str, context: &AnalysisContext) -> bool {
        match self {
            Self::Single(scanner) => scanner.analyze_log(line, context),
            Self::Sharded(scanner) => scanner.analyze_log(line, context),
        }
    }
}

/// Per-line context options.
#[derive(Debug, Default, Clone)]
pub struct ScanOptions {
    /// Fallback source IP.
    pub ip: Option<String>,
    /// Parse each line as a JSON log record.
    pub json_lines: bool,
}

/// A JSON-lines log record.
#[derive(Debug, Deserialize)]
struct LogRecord {
    message: String,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Scan every line of `reader` and collect a report.
///
/// Bytes that are not valid UTF-8 are replaced, so one bad line never ends the scan.
pub fn scan_reader<R: BufRead>(
    engine: &mut Engine,
    reader: R,
    options: &ScanOptions,
    source: String,
) -> Result<ScanReport, CliError> {
    let mut summary = ScanSummary::default();
    let mut findings = Vec::new();

    for (idx, line) in lossy_lines(reader).enumerate() {
        let line = line?;
        let line_number = idx + 1;
        let (message, context) = line_context(&line, line_number, options);

        let threat = engine.analyze_log(&message, &context);
        summary.record(line_number, &message, threat);

        if threat {
            findings.push(Finding {
                line: line_number,
                ip_address: context.ip_address().map(str::to_owned),
                excerpt: message.chars().take(EXCERPT_CHARS).collect(),
            });
        }
    }

    Ok(ScanReport {
        source,
        summary,
        findings,
    })
}

fn line_context(line: &str, line_number: usize, options: &ScanOptions) -> (String, AnalysisContext) {
    let mut context = AnalysisContext::new();
    if let Some(ip) = &options.ip {
        context.insert(AnalysisContext::IP_ADDRESS, ip.as_str());
    }

    if options.json_lines && !line.trim().is_empty() {
        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => {
                if let Some(ip) = record.ip_address {
                    context.insert(AnalysisContext::IP_ADDRESS, ip);
                }
                let timestamp = record.timestamp.unwrap_or_else(now_rfc3339);
                context.insert(AnalysisContext::TIMESTAMP, timestamp);
                return (record.message, context);
            }
            Err(e) => {
                warn!(line = line_number, error = %e, "not a JSON log record, scanning raw line");
            }
        }
    }

    context.insert(AnalysisContext::TIMESTAMP, now_rfc3339());
    (line.to_owned(), context)
}

fn now_rfc3339() -> Value {
    Value::String(chrono::Utc::now().to_rfc3339())
}

/// Scan result payload.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub source: String,
    pub summary: ScanSummary,
    pub findings: Vec<Finding>,
}

/// A flagged line.
#[derive(Debug, Serialize)]
pub struct Finding {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub excerpt: String,
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Scan: {}", self.source.bold())?;
        writeln!(
            w,
            "Lines read: {} ({} blank)",
            self.summary.lines_read, self.summary.blank_lines
        )?;

        let threats = format!("{} line(s)", self.summary.threats);
        if self.summary.has_threats() {
            writeln!(w, "Threats: {}", threats.red().bold())?;
        } else {
            writeln!(w, "Threats: {}", threats.green().bold())?;
        }
        writeln!(w)?;

        if self.findings.is_empty() {
            writeln!(w, "{}", "No threats found.".green())?;
            return Ok(());
        }

        writeln!(w, "{:<8} {:<18} Line", "No.", "Source IP")?;
        writeln!(w, "{}", "-".repeat(80))?;
        for f in &self.findings {
            writeln!(
                w,
                "{:<8} {:<18} {}",
                f.line,
                f.ip_address.as_deref().unwrap_or("-"),
                f.excerpt.yellow()
            )?;
        }

        Ok(())
    }
}
