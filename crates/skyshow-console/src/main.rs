//! Show console - keeps the mission mapping and geofence current while
//! telemetry streams in.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyshow_console::config::Config;
use skyshow_console::state::{ConsoleState, ShowPlan};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("skyshow_console=debug".parse()?))
        .init();

    tracing::info!("Starting show console...");

    let config = Config::from_env();
    let state = Arc::new(ConsoleState::new(&config));

    let plan = match &config.show_plan_path {
        Some(path) => load_show_plan(Path::new(path)).await?,
        None if config.simulate => ShowPlan::grid(config.sim_slot_count, config.sim_spacing_m),
        None => ShowPlan::default(),
    };
    state.set_show(plan)?;

    let console = skyshow_console::start(state.clone(), &config);

    // Give the sampler one pass over the first telemetry before matching.
    tokio::time::sleep(config.sample_interval * 2).await;
    console.request_recalculate().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");

    let mapping = state.mapping();
    tracing::info!(
        "Final mapping: {}/{} slots filled",
        mapping.mapping.filled_count(),
        mapping.mapping.len()
    );
    console.shutdown().await;
    Ok(())
}

async fn load_show_plan(path: &Path) -> Result<ShowPlan> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading show plan {}", path.display()))?;
    let plan = serde_json::from_slice::<ShowPlan>(&bytes)
        .with_context(|| format!("parsing show plan {}", path.display()))?;
    tracing::info!(
        "Loaded show plan from {}: {} takeoff, {} landing positions",
        path.display(),
        plan.takeoff.len(),
        plan.landing.len()
    );
    Ok(plan)
}
