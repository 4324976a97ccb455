mod config;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use ballot_bot::{BotConfig, Orchestrator, SessionStore};
use ballot_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ballot=debug,ballot_bot=debug,ballot_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_salt() {
        warn!("BALLOT_VOTE_SALT is unset or a placeholder; vote pseudonyms are guessable");
    }

    if let Some(dir) = config.db_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let db = Arc::new(Database::open(&config.db_path)?);

    let sessions = Arc::new(match config.session_capacity {
        Some(capacity) => {
            info!("Session store bounded to {} users", capacity);
            SessionStore::with_capacity(capacity)
        }
        None => SessionStore::new(),
    });

    let bot = Orchestrator::new(
        db,
        sessions,
        BotConfig {
            vote_salt: config.vote_salt.clone(),
            start_photo: config.start_photo.clone(),
        },
    );

    let app = routes::router(Arc::new(bot));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Ballot server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

/// Resolves on Ctrl+C (or SIGTERM on unix). In-flight requests are allowed to
/// finish; no new connections are accepted after this.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await;
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("Received Ctrl+C, shutting down...");
    }
}
