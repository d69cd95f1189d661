//! Independent background cadences.
//!
//! Each maintenance concern runs in its own tokio task on its own
//! interval: list-metadata refresh, list processing/activation, and
//! decision-state expiry. A slow or failing tick in one task never
//! delays the others, and a failed cycle only logs — the previously
//! active data keeps serving.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::DaemonState;

/// Spawn all background tasks.
pub fn spawn_all(state: Arc<DaemonState>) -> Vec<JoinHandle<()>> {
    vec![
        spawn_metadata_refresh(Arc::clone(&state)),
        spawn_list_processing(Arc::clone(&state)),
        spawn_state_sweep(state),
    ]
}

/// Daily trigger: resolve and register the freshest provider list.
fn spawn_metadata_refresh(state: Arc<DaemonState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(state.config.schedule.metadata_refresh_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let today = chrono::Utc::now().date_naive();
            match state.pipeline.refresh_list_metadata(&state.db, today).await {
                Ok(meta) => info!(list_id = meta.list_id, "list metadata refreshed"),
                Err(e) => error!(error = %e, "list metadata refresh failed; previous data untouched"),
            }
        }
    })
}

/// Second trigger: load the newest unprocessed list and activate it,
/// then sweep superseded lists.
fn spawn_list_processing(state: Arc<DaemonState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(state.config.schedule.process_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match state.pipeline.process_pending_list(&state.db).await {
                Ok(Some(summary)) => {
                    info!(
                        list_id = summary.list_id,
                        records = summary.record_count,
                        skipped = summary.skipped,
                        "list processing cycle complete"
                    );
                    if let Err(e) = state.pipeline.purge_inactive_lists(&state.db).await {
                        error!(error = %e, "retention sweep failed");
                    }
                }
                Ok(None) => {}
                Err(e) => error!(error = %e, "list processing failed; active list untouched"),
            }
        }
    })
}

/// Expiry sweep for decision states.
fn spawn_state_sweep(state: Arc<DaemonState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(state.config.schedule.sweep_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let conn = state.db.lock().await;
            if let Err(e) = state.states.sweep_expired(&conn) {
                error!(error = %e, "state expiry sweep failed");
            }
        }
    })
}
