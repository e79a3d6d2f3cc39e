//! Mathbot Channels - Main entry point.

use anyhow::Result;
use clap::Parser;
use mathbot_common::config::Config;
use mathbot_common::logging::init_logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mathbot-channels")]
#[command(version)]
#[command(about = "Telegram bot that evaluates one of seven formula variants.", long_about = None)]
struct Cli {
    /// Path to the JSON config file (defaults to ~/.mathbot/config.json)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Chat on stdin/stdout instead of Telegram
    #[arg(long)]
    cli: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    // Load configuration
    let config = Config::load_and_validate(args.config.as_deref())?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("Mathbot Channels v{}", env!("CARGO_PKG_VERSION"));

    mathbot_channels::run(&config, args.cli).await
}
