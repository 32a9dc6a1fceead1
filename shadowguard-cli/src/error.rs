//! CLI-specific error types and exit code mapping

use shadowguard_core::error::ShadowguardError;
use shadowguard_detector::DetectorError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The scan completed and flagged at least one line.
    #[error("threats detected in {0} line(s)")]
    Threats(usize),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from shadowguard-core.
    #[error("{0}")]
    Core(#[from] ShadowguardError),

    /// Detector construction or scan failure.
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                      |
    /// |------|------------------------------|
    /// | 0    | Success, no threats          |
    /// | 1    | General / command error      |
    /// | 2    | Configuration error          |
    /// | 4    | Scan flagged threats         |
    /// | 10   | IO error                     |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(ShadowguardError::Config(_)) => 2,
            Self::Threats(_) => 4,
            Self::Io(_) | Self::Core(ShadowguardError::Io(_)) => 10,
            Self::Detector(DetectorError::Io(_)) => 10,
            Self::Detector(DetectorError::Config { .. }) => 2,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Detector(_) => 1,
        }
    }
}
