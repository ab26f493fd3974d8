mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use esreport_config::Config;
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let store = esreport_engine::build_store(&config)?;

    match cli.command {
        cli::Commands::Configure { prefix, force } => {
            commands::configure::handle(&config, store, prefix, force).await
        }
        cli::Commands::Tidy {
            prefix,
            days,
            dry_run,
        } => {
            let args = commands::tidy::TidyArgs {
                prefix,
                days,
                dry_run,
            };
            commands::tidy::handle(&config, store, args, OffsetDateTime::now_utc().date()).await
        }
    }
}
