use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use aieditor_api::config::{ConfigError, ServerConfig};
use aieditor_api::middleware::rate_limit::{self, ClientRateLimiter};
use aieditor_api::router::build_app_router;
use aieditor_api::state::AppState;
use aieditor_llm::loader::{self, LoaderConfig};
use aieditor_llm::{BackendGate, LlamaCppClient, LlmError};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str =
    "aieditor_api=debug,aieditor_llm=debug,aieditor_db=info,tower_http=debug";

/// Anything that stops the server from starting.
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid HOST address {0:?}")]
    Host(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Model client error: {0}")]
    Llm(#[from] LlmError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}

/// Set up the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run() -> Result<(), StartupError> {
    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = aieditor_db::create_pool(&config.database_url).await?;
    tracing::info!(url = %config.database_url, "Database connection pool created");

    aieditor_db::health_check(&pool).await?;
    tracing::info!("Database health check passed");

    aieditor_db::run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    // --- Language model ---
    let model = Arc::new(LlamaCppClient::new(
        config.llm.server_url.clone(),
        config.llm.request_timeout(),
    )?);
    let gate = Arc::new(BackendGate::new());
    tracing::info!(url = %model.base_url(), "Model client created, waiting for model to load");

    let cancel = CancellationToken::new();

    let loader_config = LoaderConfig {
        load_timeout: config.llm.load_timeout(),
        ..LoaderConfig::default()
    };
    let loader_handle = tokio::spawn(loader::run(
        model.clone(),
        Arc::clone(&gate),
        loader_config,
        cancel.clone(),
    ));

    // --- Rate limiter ---
    let rate_limiter = Arc::new(ClientRateLimiter::new(&config.rate_limit));
    let pruner_handle = tokio::spawn(rate_limit::run_pruner(
        Arc::clone(&rate_limiter),
        rate_limit::PRUNE_INTERVAL,
        cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        model,
        gate,
        rate_limiter,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .map_err(|_| StartupError::Host(config.host.clone()))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(grace, loader_handle).await;
    let _ = tokio::time::timeout(grace, pruner_handle).await;
    tracing::info!("Background tasks stopped");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix). If a handler cannot
/// be installed, that signal source is ignored and the other one still
/// works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
