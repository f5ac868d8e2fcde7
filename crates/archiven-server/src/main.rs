use std::path::Path;

use clap::Parser;
use tracing::{info, warn};

use archiven_server::api::{AppState, router};
use archiven_server::config::ArchivenConfig;
use archiven_server::store_factory::create_service;

/// Archiven file archive HTTP server.
#[derive(Parser, Debug)]
#[command(name = "archiven-server", about = "HTTP server for the archiven file archive")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "archiven.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = dotenv {
        if e.not_found() {
            info!("no .env file found, using process environment");
        } else {
            warn!(error = %e, "failed to load .env file");
        }
    }

    // file < environment < command line
    let mut config = ArchivenConfig::load(Path::new(&cli.config))?;
    config.apply_env()?;

    let service = create_service(&config).await?;
    info!(
        backend = ?config.storage.backend,
        allowed_types = ?service.policy().allowed_types,
        max_file_size = service.policy().max_file_size,
        "archive service initialized"
    );

    let state = AppState::new(service, &config.server.public_url);
    let app = router(state);

    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "archiven-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("archiven-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
