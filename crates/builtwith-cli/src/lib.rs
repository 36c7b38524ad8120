//! BuiltWith CLI - command-line front end for the BuiltWith client.
//!
//! Parses arguments, loads configuration, runs one command and renders the
//! result for stdout. Logs go to stderr through `tracing`.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod commands;

use anyhow::Context;
use builtwith_client::{BuiltWithClient, OutputFormat, ReqwestTransport};
use builtwith_core::AppConfig;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Query the BuiltWith Lists and Keywords APIs
#[derive(Parser, Debug)]
#[command(name = "builtwith")]
#[command(version)]
#[command(about = "Query the BuiltWith Lists and Keywords APIs")]
pub struct Cli {
    /// Path to a config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List sites using a technology
    Lists(ListsArgs),
    /// Look up keywords for domains
    Keywords(KeywordsArgs),
}

/// Arguments of `builtwith lists`.
#[derive(Args, Debug)]
pub struct ListsArgs {
    /// Technology name, e.g. "Shopify"
    pub technology: String,

    /// Response format (json, xml, csv, tsv, txt)
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Country filter, ISO 3166-1 alpha-2 (repeatable or comma-separated)
    #[arg(long = "country", value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Only sites detected since this date or phrase, e.g. "30 Days Ago"
    #[arg(long, conflicts_with = "include_all")]
    pub since: Option<String>,

    /// Include company metadata
    #[arg(long)]
    pub meta: bool,

    /// Include sites that no longer use the technology
    #[arg(long = "include-all")]
    pub include_all: bool,

    /// Continuation token to resume from
    #[arg(long)]
    pub offset: Option<String>,

    /// Fetch up to N pages
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..), conflicts_with = "all_pages")]
    pub pages: Option<u32>,

    /// Follow continuation tokens until the end (or the configured page cap)
    #[arg(long)]
    pub all_pages: bool,

    /// Print parsed records (named fields, RFC 3339 timestamps) as json
    #[arg(long)]
    pub parsed: bool,
}

/// Arguments of `builtwith keywords`.
#[derive(Args, Debug)]
pub struct KeywordsArgs {
    /// Domains to look up
    #[arg(required = true)]
    pub domains: Vec<String>,

    /// Response format (json, xml)
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Split the domains into requests of at most N (1-16)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub batch_size: Option<u8>,
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,builtwith=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load the config file (explicit path or platform default) plus environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().context("failed to load config")?,
    };
    config
        .apply_overrides(|name| std::env::var(name).ok())
        .context("invalid environment override")?;
    Ok(config)
}

/// Build a client with the reqwest transport.
pub fn build_client(config: &AppConfig) -> anyhow::Result<BuiltWithClient> {
    let transport = ReqwestTransport::from_config(&config.api)?;
    let client = BuiltWithClient::from_config(config, Arc::new(transport))?;
    tracing::debug!(base_url = client.base_url(), "client ready");
    Ok(client)
}
