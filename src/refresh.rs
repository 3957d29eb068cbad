//! Periodic background maintenance.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use metrics::counter;

use crate::dialogue::DialogueEngine;
use crate::limits::REFRESH_INTERVAL_SECS;
use crate::observability;
use crate::occupancy::OccupancySimulator;

/// Tick the occupancy simulator and expire idle conversations once a minute.
/// Runs until the process shuts down.
pub async fn run_refresher(sim: Arc<OccupancySimulator>, dialogue: Arc<DialogueEngine>) {
    let mut interval = tokio::time::interval(Duration::from_secs(REFRESH_INTERVAL_SECS));
    // The first tick fires immediately; skip it, the records were just seeded.
    interval.tick().await;
    loop {
        interval.tick().await;
        sim.refresh(Local::now());
        dialogue.sweep_idle();
        counter!(observability::OCCUPANCY_REFRESHES_TOTAL).increment(1);
    }
}
