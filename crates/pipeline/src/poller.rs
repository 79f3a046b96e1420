//! Periodic sweep of in-flight clip extraction jobs.
//!
//! Replaces per-request polling: a single loop calls
//! [`JobLifecycle::process_pending`] on a fixed interval until cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::lifecycle::JobLifecycle;

/// Run the sweep loop. The first sweep runs immediately.
pub async fn run(
    lifecycle: Arc<JobLifecycle>,
    every: Duration,
    batch_size: i64,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = every.as_secs(),
        batch_size,
        "Clip job poller started"
    );

    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Clip job poller stopping");
                break;
            }
            _ = interval.tick() => {
                match lifecycle.process_pending(batch_size).await {
                    Ok(summary) if summary.checked == 0 => {
                        tracing::debug!("Clip job poller: nothing in flight");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Clip job poller: sweep failed");
                    }
                }
            }
        }
    }
}
