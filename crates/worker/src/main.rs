//! Standalone clip job poller.
//!
//! Runs the same sweep as the API's in-process poller, for deployments that
//! keep the HTTP server and the background work in separate processes
//! (set `POLL_INTERVAL_SECS=0` on the API when this runs).

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use inflio_klap::{ClipVendor, KlapApi, KlapConfig};
use inflio_pipeline::lifecycle::claim_ttl_for;
use inflio_pipeline::{poller, JobLifecycle, PgProjectStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_SWEEP_BATCH_SIZE: i64 = 25;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inflio_worker=debug,inflio_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let poll_interval_secs: u64 = positive_setting(
        "POLL_INTERVAL_SECS",
        std::env::var("POLL_INTERVAL_SECS").ok(),
        DEFAULT_POLL_INTERVAL_SECS,
    );
    let batch_size: i64 = positive_setting(
        "SWEEP_BATCH_SIZE",
        std::env::var("SWEEP_BATCH_SIZE").ok(),
        DEFAULT_SWEEP_BATCH_SIZE,
    );

    let klap_config = KlapConfig::from_env().expect("KLAP_API_KEY must be set for the worker");
    let claim_ttl = claim_ttl_for(klap_config.timeout);
    let vendor: Arc<dyn ClipVendor> =
        Arc::new(KlapApi::new(klap_config).expect("Failed to build Klap HTTP client"));

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = inflio_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    inflio_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection pool created");

    let lifecycle = Arc::new(
        JobLifecycle::new(Arc::new(PgProjectStore::new(pool)), Some(vendor))
            .with_claim_ttl(claim_ttl),
    );

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller::run(
        lifecycle,
        Duration::from_secs(poll_interval_secs),
        batch_size,
        cancel.clone(),
    ));

    shutdown_signal().await;

    cancel.cancel();
    let _ = handle.await;
    tracing::info!("Worker stopped");
}

/// Parse a numeric setting that must be positive, falling back to
/// `default` only when the variable is unset.
///
/// Panics at startup on a malformed or non-positive value.
fn positive_setting<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + PartialOrd + Default,
    T::Err: Display,
{
    let Some(raw) = raw else {
        return default;
    };
    let value: T = raw
        .trim()
        .parse()
        .unwrap_or_else(|e| panic!("{name} must be a valid number, got '{raw}': {e}"));
    assert!(value > T::default(), "{name} must be positive, got '{raw}'");
    value
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
            tracing::info!("Received SIGINT, stopping worker");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, stopping worker");
        }
    }
}
