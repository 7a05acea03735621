//! sessiongate - session-based authentication service

use clap::Parser;
use sessiongate::api::{self, AppState};
use sessiongate::auth::{Authenticator, SessionManager};
use sessiongate::config::Config;
use sessiongate::credentials::InMemoryCredentialStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// sessiongate - session-based authentication service
#[derive(Parser, Debug)]
#[command(name = "sessiongate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration from file if specified, otherwise use default loading
    let mut config = if let Some(ref path) = cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // CLI overrides
    if let Some(ref addr) = cli.listen {
        config.listen_addr = addr.parse()?;
    }

    // Initialize tracing
    let log_level = if cli.verbose {
        "sessiongate=trace,tower_http=trace".to_string()
    } else {
        config.log_level.clone()
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config.validate()?;

    info!("Starting sessiongate");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Authorization type: {}", config.auth.kind);
    info!(
        "  Session duration: {}s",
        config.auth.session_duration_secs
    );
    info!(
        "  PBKDF2: {} iterations, {} byte key",
        config.auth.pbkdf2_iterations, config.auth.pbkdf2_key_length
    );

    let auth: Arc<dyn Authenticator> = Arc::new(SessionManager::from_config(&config.auth));
    let state = Arc::new(AppState {
        auth: auth.clone(),
        credentials: Arc::new(InMemoryCredentialStore::new()),
    });

    match config.auth.sweep_interval() {
        Some(period) => {
            info!("  Expired-session sweep: every {}s", period.as_secs());
            tokio::spawn(sweep_expired_sessions(auth, period));
        }
        None => info!("  Expired-session sweep: disabled (lazy eviction only)"),
    }

    let app = api::router(state).layer(TraceLayer::new_for_http());

    // Start server with graceful shutdown
    let listener = TcpListener::bind(&config.listen_addr).await?;
    info!("sessiongate listening on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Periodically drop sessions that expired without being presented again.
async fn sweep_expired_sessions(auth: Arc<dyn Authenticator>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let removed = auth.sweep_expired();
        if removed > 0 {
            debug!("Swept {} expired sessions", removed);
        }
    }
}

/// Handle shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
