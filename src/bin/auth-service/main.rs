use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;

use flashquiz_lib::auth::{
    CredentialStorage, GoogleTokenInfo, IdTokenVerifier, LogMailer, TokenIssuer,
    UserServiceProfiles,
};
use flashquiz_lib::config::{ServiceConfig, ServiceKind};
use flashquiz_lib::server::{self, auth_api, AuthLinks, AuthState};

#[derive(Parser)]
#[command(name = "auth-service", about = "Account registration and login for flashquiz", version)]
struct Cli {
    /// TOML config file
    #[arg(long, env = "FLASHQUIZ_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config and PORT)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite credential database
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = ServiceConfig::load(ServiceKind::Auth, cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database) = cli.database {
        config.database_path = Some(database);
    }

    let db_path = config.database_path(ServiceKind::Auth);
    let credentials = CredentialStorage::open(&db_path)
        .with_context(|| format!("Failed to open credential store at {}", db_path.display()))?;
    let tokens = TokenIssuer::new(config.jwt_secret()?.as_bytes());

    let google = config.google_client_id.clone().map(|client_id| {
        Arc::new(GoogleTokenInfo::new(client_id)) as Arc<dyn IdTokenVerifier>
    });
    if google.is_none() {
        log::warn!("GOOGLE_CLIENT_ID not set, Google login is disabled");
    }

    let state = AuthState {
        credentials: Arc::new(Mutex::new(credentials)),
        tokens,
        mailer: Arc::new(LogMailer),
        google,
        profiles: Arc::new(UserServiceProfiles::new(&config.user_service_url)),
        links: AuthLinks {
            public_auth_url: config.public_auth_url.clone(),
            frontend_url: config.frontend_url.clone(),
        },
    };
    let app = auth_api::router(state).layer(server::cors(&config.frontend_url));

    let mut handle = server::start("auth-service", config.socket_addr(), app)
        .await
        .with_context(|| format!("Failed to bind {}", config.socket_addr()))?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    handle.stop();
    handle.stopped().await;
    Ok(())
}
