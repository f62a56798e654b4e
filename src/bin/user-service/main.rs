use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use flashquiz_lib::auth::TokenIssuer;
use flashquiz_lib::config::{ServiceConfig, ServiceKind};
use flashquiz_lib::flashcards::ContentStorage;
use flashquiz_lib::server::{self, content_api, ContentState};

#[derive(Parser)]
#[command(name = "user-service", about = "Flashcard sets, study modes and history for flashquiz", version)]
struct Cli {
    /// TOML config file
    #[arg(long, env = "FLASHQUIZ_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite content database
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::load(ServiceKind::User, cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    let db_path = config.database_path(ServiceKind::User);
    let storage = ContentStorage::open(&db_path)
        .with_context(|| format!("Failed to open content store at {}", db_path.display()))?;
    let tokens = TokenIssuer::new(config.jwt_secret()?.as_bytes());

    let app = content_api::router(ContentState::new(storage, tokens))
        .layer(server::cors(&config.frontend_url));

    let mut handle = server::start("user-service", config.socket_addr(), app)
        .await
        .with_context(|| format!("Failed to bind {}", config.socket_addr()))?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    handle.stop();
    handle.stopped().await;
    Ok(())
}
