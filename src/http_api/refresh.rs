use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::service::SharedPlanner;

/// Generates the next `horizon_days` days every `period`, starting
/// immediately. A tick is skipped while another generation run holds the
/// planner.
pub fn spawn_daily_refresh(
    planner: Arc<SharedPlanner>,
    horizon_days: u32,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(horizon_days, period_secs = period.as_secs(), "daily refresh started");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let planner = Arc::clone(&planner);
            let outcome = tokio::task::spawn_blocking(move || {
                planner.try_generate_for_next_days(horizon_days)
            })
            .await;

            match outcome {
                Ok(Some(report)) => info!(
                    generated = report.generated.len(),
                    skipped_holiday = report.skipped_holiday.len(),
                    skipped_existing = report.skipped_duplicate.len(),
                    failed = report.failed.len(),
                    "daily refresh finished"
                ),
                Ok(None) => warn!("generation already running, skipping refresh tick"),
                Err(err) => error!(error = %err, "daily refresh task failed"),
            }
        }
    })
}
