pub mod commands;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::config::{AppConfig, StoreBackend};
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};

#[derive(Parser)]
#[command(name = "workforce-api")]
#[command(about = "Workforce API - employee management REST backend")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create the Postgres documents table and indexes")]
    Migrate,

    #[command(about = "Seed an Admin account")]
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
    },
}

pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(config, port).await,
        Commands::Migrate => commands::migrate::handle(config).await,
        Commands::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
        } => commands::admin::handle(config, email, password, first_name, last_name).await,
    }
}

/// Opens the configured document store. Postgres stores are migrated
/// before use so a fresh database works without a separate step.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match config.database.backend {
        StoreBackend::Postgres => {
            let store = PgDocumentStore::connect(&config.database)
                .await
                .context("failed to connect to Postgres")?;
            store.migrate().await.context("failed to migrate documents table")?;
            info!("Using Postgres document store");
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory document store; data is lost on exit");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}
