use clap::{Parser, Subcommand};
use pantry_core::{Database, FoodRepository, UnitOfWork};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{ConfigCommand, FoodCommand, ItemCommand};
use config::Config;

#[derive(Parser)]
#[command(name = "pantry")]
#[command(version)]
#[command(about = "Track foods, their nutrition and what is in the pantry", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage foods and their nutrition facts
    Food(FoodCommand),

    /// Manage what is stocked in the pantry
    Item(ItemCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Food(cmd)) => {
            let db = open_database(&config).await?;
            let repo = FoodRepository::new(db.clone());
            let result = cmd.run(&repo).await;
            db.close().await?;
            result?;
        }
        Some(Commands::Item(cmd)) => {
            let db = open_database(&config).await?;
            let uow = UnitOfWork::new(db.clone());
            let result = cmd.run(&uow, &config).await;
            db.close().await?;
            result?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

async fn open_database(config: &Config) -> pantry_core::Result<Arc<Database>> {
    let path = &config.database_path.value;
    tracing::debug!(path = %path.display(), "opening database");
    Ok(Arc::new(Database::open(path).await?))
}
