mod args;
mod commands;
mod remote;
mod render;

use clap::Parser;

use crate::args::{Cli, Commands};
use crate::commands::ClaimContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let ctx = ClaimContext::from_cli(&cli)?;

    match cli.command {
        Commands::Address => commands::address(&ctx).await,
        Commands::Status => commands::status(&ctx).await,
        Commands::Claim => commands::claim(&ctx).await,
    }
}
