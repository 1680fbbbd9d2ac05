//! azs - Azure Storage command-line tool
//!
//! Blob, file share, queue and table operations against one storage account,
//! configured through a connection string.

use azstore::cli::{Cli, Commands};
use azstore::config::{self, Config};
use azstore::error::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug);

    // Execute the command
    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting azs");

    // Config commands must work before a connection string is set
    let config: Config = match &cli.command {
        Commands::Config { .. } => config::load_config_no_validation()?,
        _ => config::load_config()?,
    };

    cli.execute(config).await
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "azstore=debug" } else { "azstore=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
