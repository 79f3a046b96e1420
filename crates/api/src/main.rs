use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use inflio_api::config::ServerConfig;
use inflio_api::router::build_app_router;
use inflio_api::state::AppState;
use inflio_klap::{ClipVendor, KlapApi, KlapConfig};
use inflio_pipeline::lifecycle::{claim_ttl_for, DEFAULT_DISPATCH_CLAIM_TTL};
use inflio_pipeline::{poller, JobLifecycle, PgProjectStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inflio_api=debug,inflio_pipeline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = inflio_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    inflio_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    inflio_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Clip vendor ---
    let mut claim_ttl = DEFAULT_DISPATCH_CLAIM_TTL;
    let vendor: Option<Arc<dyn ClipVendor>> = match KlapConfig::from_env() {
        Some(klap_config) => {
            tracing::info!(api_url = %klap_config.api_url, "Clip extraction enabled");
            claim_ttl = claim_ttl_for(klap_config.timeout);
            Some(Arc::new(
                KlapApi::new(klap_config).expect("Failed to build Klap HTTP client"),
            ))
        }
        None => {
            tracing::warn!("KLAP_API_KEY not set, clip extraction disabled");
            None
        }
    };

    let store = Arc::new(PgProjectStore::new(pool.clone()));
    let lifecycle = Arc::new(JobLifecycle::new(store, vendor).with_claim_ttl(claim_ttl));

    // --- Background poller ---
    let poller_cancel = CancellationToken::new();
    let poller_handle = if config.poll_interval_secs > 0 && lifecycle.vendor_configured() {
        Some(tokio::spawn(poller::run(
            Arc::clone(&lifecycle),
            Duration::from_secs(config.poll_interval_secs),
            config.sweep_batch_size,
            poller_cancel.clone(),
        )))
    } else {
        tracing::info!("In-process clip job poller disabled");
        None
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        lifecycle,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    poller_cancel.cancel();
    if let Some(handle) = poller_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Clip job poller stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
