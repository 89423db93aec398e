use tokio::sync::watch;
use tokio::time::{interval, Duration};

use crate::api::delivery;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Periodic backstop for the per-attempt countdown tasks: finalizes any
/// in-progress attempt whose deadline has passed. In-memory timers do not
/// survive a restart; this sweep makes auto-submission durable anyway.
pub(crate) async fn run(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let mut tick =
        interval(Duration::from_secs(state.settings().delivery().expiry_sweep_interval_seconds));

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                match sweep_once(&state).await {
                    Ok(0) => {}
                    Ok(closed) => {
                        tracing::info!(closed_attempts = closed, "Finalized overdue attempts");
                    }
                    Err(err) => tracing::error!(error = %err, "Expiry sweep failed"),
                }
            }
        }
    }
}

pub(crate) async fn sweep_once(state: &AppState) -> Result<usize, sqlx::Error> {
    let overdue = repositories::attempts::list_overdue(state.db(), primitive_now_utc()).await?;
    let mut closed = 0;

    for attempt in overdue {
        let attempt_id = attempt.id.clone();
        match delivery::finalize_attempt(state, attempt, true).await {
            Ok(_) => {
                state.timers().stop(&attempt_id);
                closed += 1;
            }
            Err(err) => {
                tracing::error!(attempt_id = %attempt_id, error = ?err, "Failed to finalize overdue attempt");
            }
        }
    }

    if closed > 0 {
        metrics::counter!("attempts_swept_total").increment(closed as u64);
    }

    Ok(closed)
}
