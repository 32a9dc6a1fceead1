//! Command handlers -- one module per subcommand

pub mod config;
pub mod scan;
pub mod signatures;

use std::path::Path;

use shadowguard_core::config::ShadowguardConfig;

use crate::error::CliError;

/// Load the configuration for commands that can run without a file.
///
/// A missing file falls back to defaults with environment overrides applied.
/// A file that exists but fails to parse or validate is still an error.
pub async fn load_or_default(path: &Path) -> Result<ShadowguardConfig, CliError> {
    if path.exists() {
        return Ok(ShadowguardConfig::load(path).await?);
    }

    let mut config = ShadowguardConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
