use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

mod config;
mod env;
mod runner;

#[derive(Parser)]
#[command(name = "rest2es")]
#[command(about = "Poll HTTP sources and bulk-load them into Elasticsearch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to rest2es.toml config file
    #[arg(short, long, default_value = "rest2es.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every configured feed until the process is stopped (default)
    Run,

    /// Validate the config file and list the feeds it defines
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rest2es=info".parse()?),
        )
        .init();

    // .env is optional; it only supplies ${VAR} values for the config
    if let Some(path) = env::load_dotenv_from_ancestors()? {
        info!(path = %path.display(), "Loaded .env");
    }

    let cli = Cli::parse();
    let config = config::load_config(&cli.config)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => runner::run_feeds(config).await,
        Commands::Check => {
            print!("{}", config::describe(&config));
            Ok(())
        }
    }
}
