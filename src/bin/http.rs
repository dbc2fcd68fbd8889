#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use household_scheduler::{
        HouseholdStore, PlannerConfig, PlannerService, SharedPlanner, SqliteHouseholdStore,
        http_api, logging,
    };

    logging::init();
    let config = PlannerConfig::from_env()?;
    let addr = config.socket_addr()?;

    let store = SqliteHouseholdStore::new(&config.database_path).with_context(|| {
        format!("opening database {}", config.database_path.display())
    })?;
    let store: Arc<dyn HouseholdStore> = Arc::new(store);
    let planner: Arc<SharedPlanner> = Arc::new(PlannerService::new(store));

    let _refresh = http_api::spawn_daily_refresh(
        Arc::clone(&planner),
        config.horizon_days,
        config.refresh_interval(),
    );

    tracing::info!(%addr, db = %config.database_path.display(), "household planner HTTP API listening");
    http_api::serve(addr, planner).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
