mod commands;
mod printer;
mod tail;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Follow a Hearthstone game through its Power.log")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a finished log and print every signal.
    Replay {
        #[arg(short, long)]
        path: PathBuf,
        /// One JSON object per line.
        #[arg(long)]
        json: bool,
    },
    /// Follow the live log.
    Watch {
        /// Overrides the configured log file.
        #[arg(short, long)]
        path: Option<PathBuf>,
        /// Replay what the log already holds before following it.
        #[arg(long)]
        from_start: bool,
        #[arg(long)]
        json: bool,
    },
    /// Enable the client log sections the parsers need.
    Setup,
    /// Show the current configuration and where it is stored.
    Config,
}

/// Initialize logging, writing to HEARTHWATCH_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("HEARTHWATCH_LOG_PATH")
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { path, json } => commands::replay(&path, json),
        Commands::Watch { path, from_start, json } => commands::watch(path, from_start, json).await,
        Commands::Setup => commands::setup(),
        Commands::Config => commands::show_config(),
    }
}
