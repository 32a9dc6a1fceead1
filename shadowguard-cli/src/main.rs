//! Shadowguard CLI -- scan application logs for SQL injection attempts.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;
use colored::Colorize;
use tracing::info;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(CliError::Threats(count)) => {
            eprintln!("{} {} line(s) flagged", "threats:".yellow().bold(), count);
            4
        }
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            e.exit_code()
        }
    };

    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = commands::load_or_default(&cli.config).await;

    // 설정이 깨져 있어도 `config validate`가 결과를 보여줄 수 있도록 기본값으로 로깅
    let mut general = loaded
        .as_ref()
        .map(|c| c.general.clone())
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(format!("{:#}", e)))?;
    shadowguard_core::metrics::describe_all();

    if !cli.config.exists() {
        info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &loaded?, &writer).await,
        Commands::Signatures => commands::signatures::execute(&loaded?, &writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
