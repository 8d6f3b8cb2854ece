use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use passgate::cleanup;
use passgate::config::Config;
use passgate::db::PgStore;
use passgate::email::{LogMailer, SmtpMailer};
use passgate::rate_limit::ResetRateLimiter;
use passgate::reset::notify::Notifier;
use passgate::reset::store::TokenStore;
use passgate::reset::{ResetPolicy, ResetService};
use passgate::state::{AppState, SharedState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = Config::from_env().expect("Failed to load configuration");

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    tracing::info!("Starting Passgate");

    // Create database pool
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations applied");

    let store: Arc<dyn TokenStore> = Arc::new(PgStore::new(pool));

    let notifier: Arc<dyn Notifier> = match config.smtp.as_ref() {
        Some(smtp) => {
            let mailer = SmtpMailer::new(smtp).expect("Failed to build SMTP transport");
            tracing::info!("SMTP configured");
            Arc::new(mailer)
        }
        None => {
            tracing::warn!("SMTP not configured; reset links will be logged");
            Arc::new(LogMailer)
        }
    };

    let policy = ResetPolicy {
        token_ttl: chrono::Duration::seconds(config.token_ttl_secs),
        min_password_len: config.min_password_len,
        base_url: config.base_url.clone(),
    };

    let addr = SocketAddr::new(config.host, config.port);

    let state: SharedState = Arc::new(AppState {
        config,
        reset: ResetService::new(store.clone(), notifier, policy),
        reset_limiter: ResetRateLimiter::new(),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = cleanup::spawn(store, state.clone(), shutdown_rx);

    let app = passgate::build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;

    Ok(())
}

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
