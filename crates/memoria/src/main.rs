//! Memoria CLI binary.
//!
//! This binary provides command-line access to Memoria:
//! - Serve the HTTP API
//! - Upload, list and delete gallery media
//! - Restyle photos
//! - Sign and moderate the guestbook

use clap::Parser;
use memoria::MemoriaConfig;
use memoria::logging::{LoggingConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, handle_guestbook_command, handle_media_command, handle_memorial_command,
        restyle_all, restyle_one, run_server,
    };

    // Pick up API keys from .env before the config refers to them
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut logging = LoggingConfig::new().with_json_logs(cli.json_logs);
    if cli.verbose {
        logging = logging.with_log_level("debug");
    }
    init_logging(&logging)?;

    let config = MemoriaConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => run_server(bind, &config).await?,
        Commands::Media(cmd) => handle_media_command(cmd, &config).await?,
        Commands::Restyle { key, force } => restyle_one(&key, force, &config).await?,
        Commands::RestyleAll => restyle_all(&config).await?,
        Commands::Guestbook(cmd) => handle_guestbook_command(cmd, &config).await?,
        Commands::Memorial(cmd) => handle_memorial_command(cmd, &config).await?,
    }

    Ok(())
}
