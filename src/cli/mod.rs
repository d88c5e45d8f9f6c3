pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use sqlx::PgPool;

use crate::config::config;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "arsip")]
#[command(about = "Arsip CLI - Administrative tasks for the document archive")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Database schema management")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },

    #[command(about = "User account bootstrap")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format).await,
    }
}

/// Open a pool from the environment; every command talks to PostgreSQL directly.
pub(crate) async fn connect() -> anyhow::Result<PgPool> {
    Ok(DatabaseManager::connect(&config().database).await?)
}
