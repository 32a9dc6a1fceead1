//! Logging initialization for the shadowguard binary.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `ShadowguardConfig`. Console records go to stderr so that command
//! output on stdout stays machine-readable. An optional plain-text file
//! layer mirrors every record to `log_file`, rotating it once it grows past
//! `log_max_bytes` and keeping `log_max_files` old files
//! (`shadowguard.log.1` is the most recent).

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use shadowguard_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines
/// * `"pretty"` - Human-readable colored output (default)
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    if !matches!(config.log_format.as_str(), "json" | "pretty") {
        return Err(anyhow::anyhow!(
            "unknown log format '{}', expected 'json' or 'pretty'",
            config.log_format
        ));
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let file_layer = if config.log_file.is_empty() {
        None
    } else {
        let file = open_log_file(
            Path::new(&config.log_file),
            config.log_max_bytes,
            config.log_max_files,
        )?;
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config.log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize JSON tracing subscriber: {}", e))?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| {
                anyhow::anyhow!("failed to initialize pretty tracing subscriber: {}", e)
            })?;
    }

    Ok(())
}

/// Open `path` as a size-rotated log file, creating its parent directory if needed.
///
/// Records are appended to an existing file. A record is never split across
/// files: rotation happens before the first write after `max_bytes` is passed.
pub fn open_log_file(
    path: &Path,
    max_bytes: usize,
    max_files: usize,
) -> Result<FileRotate<AppendCount>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }

    // FileRotate swallows open errors, so surface permission problems here
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    Ok(rotating_file(
        path,
        AppendCount::new(max_files),
        ContentLimit::BytesSurpassed(max_bytes),
    ))
}

#[cfg(unix)]
fn rotating_file(
    path: &Path,
    suffix: AppendCount,
    limit: ContentLimit,
) -> FileRotate<AppendCount> {
    FileRotate::new(path, suffix, limit, Compression::None, None)
}

#[cfg(not(unix))]
fn rotating_file(
    path: &Path,
    suffix: AppendCount,
    limit: ContentLimit,
) -> FileRotate<AppendCount> {
    FileRotate::new(path, suffix, limit, Compression::None)
}
