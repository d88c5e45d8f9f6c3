use clap::Subcommand;
use std::sync::Arc;

use crate::access::Role;
use crate::cli::output::output_success;
use crate::cli::{connect, OutputFormat};
use crate::config::config;
use crate::database::models::User;
use crate::database::PgStore;
use crate::services::{CreateUser, UserService};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create an administrator account")]
    CreateAdmin {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "ARSIP_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "Administrator")]
        full_name: String,
    },

    #[command(about = "List user accounts")]
    List {
        #[arg(long, help = "Only list users with this role (admin, pengelola, staf)")]
        role: Option<Role>,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = Arc::new(PgStore::new(connect().await?));
    let users = UserService::new(store, config());

    match cmd {
        UserCommands::CreateAdmin { username, email, password, full_name } => {
            let user = users
                .create(CreateUser { username, email, password, full_name, role: Role::Admin, opd_id: None })
                .await?;
            output_success(
                output_format,
                &format!("Created admin '{}' (id {})", user.username, user.id),
                Some(serde_json::to_value(&user)?),
            )
        }
        UserCommands::List { role } => {
            let all = with_role(users.list().await?, role);
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&all)?),
                OutputFormat::Text => {
                    for user in &all {
                        let unit = user.opd_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
                        let status = if user.is_active { "active" } else { "inactive" };
                        println!("{:>5}  {:<20} {:<10} unit {:<5} {}", user.id, user.username, user.role, unit, status);
                    }
                }
            }
            Ok(())
        }
    }
}

fn with_role(users: Vec<User>, role: Option<Role>) -> Vec<User> {
    match role {
        Some(role) => users.into_iter().filter(|u| u.role == role).collect(),
        None => users,
    }
}
