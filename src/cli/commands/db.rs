use clap::Subcommand;

use crate::cli::output::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Create enum types, tables and indexes")]
    Init,

    #[command(about = "Check that the database is reachable")]
    Ping,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;

    match cmd {
        DbCommands::Init => {
            DatabaseManager::ensure_schema(&pool).await?;
            output_success(output_format, "Database schema initialized", None)
        }
        DbCommands::Ping => {
            DatabaseManager::health_check(&pool).await?;
            output_success(output_format, "Database is reachable", None)
        }
    }
}
