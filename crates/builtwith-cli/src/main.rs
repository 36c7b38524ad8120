//! BuiltWith CLI - Entry Point

use builtwith_cli::{build_client, commands, init_tracing, load_config, Cli};
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let config = load_config(cli.config.as_deref())?;
    let client = build_client(&config)?;

    let report = commands::run(&cli.command, &client, &config).await?;
    std::io::stdout().lock().write_all(report.body.as_bytes())?;

    if let Some(e) = report.error {
        return Err(e.into());
    }

    if report.failed_chunks > 0 {
        tracing::warn!(failed = report.failed_chunks, "some keyword chunks failed");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
