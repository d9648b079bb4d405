mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use opentechcalendar_core::{ImportConfig, Importer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "opentechcalendartools")]
#[command(about = "Import group events into the Open Tech Calendar data directory")]
struct Cli {
    /// Config file (defaults to ~/.config/opentechcalendartools/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ids of groups that have an import configured, one per line
    #[command(name = "listgroupstoimport")]
    ListGroupsToImport,
    /// Import upcoming events for one group
    #[command(name = "importgroup")]
    ImportGroup { group_id: String },
    /// Import every group that has an import configured
    #[command(name = "importall")]
    ImportAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging();

    let config = ImportConfig::load(cli.config.as_deref())?;
    let importer = Importer::new(&config)?;

    match cli.command {
        Commands::ListGroupsToImport => commands::list_groups::run(&importer),
        Commands::ImportGroup { group_id } => {
            commands::import_group::run(&importer, &group_id).await
        }
        Commands::ImportAll => commands::import_all::run(&importer).await,
    }
}

/// Logs go to stderr so stdout stays clean for piping group ids.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
