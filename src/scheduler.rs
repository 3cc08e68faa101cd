use std::time::Duration;
use tokio::time;
use tracing::{debug, info, instrument, warn};

use crate::cycle::CycleCoordinator;

#[instrument(skip(coordinator), fields(interval_minutes = %interval_minutes))]
pub async fn start_cycle_scheduler(coordinator: CycleCoordinator, interval_minutes: u64) {
    let mut interval = time::interval(Duration::from_secs(interval_minutes * 60));

    info!(
        "Cycle scheduler started with {} minute interval",
        interval_minutes
    );

    loop {
        interval.tick().await;
        debug!("Scheduler tick - starting processing cycle");

        let summary = coordinator.run_cycle().await;

        if summary.failed_basins > 0 {
            warn!(
                "Cycle completed with {} of {} basins failed ({} stations, {} alerts)",
                summary.failed_basins, summary.basins, summary.stations, summary.alerts
            );
        } else {
            info!(
                "Cycle completed: {} basins, {} stations, {} alerts",
                summary.basins, summary.stations, summary.alerts
            );
        }
    }
}
