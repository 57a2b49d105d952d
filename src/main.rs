use anyhow::Result;
use psi_sg_sensors::{config, controller, fetch, publisher, registry, telemetry};
use config::Config;
use controller::{PollContext, PollScheduler};
use std::sync::Arc;
use telemetry::init_tracing;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load()?;
    init_tracing(cfg.adapter.debug_level);

    let registry = Arc::new(registry::InMemoryRegistry::default());
    let publisher = Arc::new(publisher::Publisher::new(&cfg.adapter, registry.clone()));
    registry.attach(Arc::downgrade(&publisher));
    let source = Arc::new(fetch::DataGovClient::new(&cfg.api, cfg.adapter.debug_level)?);

    let mut notifications = publisher.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(n) => debug!(notification = ?n, "entity notification"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "notification log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let context = Arc::new(PollContext::new(source, publisher, cfg.api.datasets()));
    let scheduler = PollScheduler::new(context, &cfg.schedule);

    info!(
        psi = %cfg.api.psi_endpoint,
        pm25 = %cfg.api.pm25_endpoint,
        minutes_past_hour = cfg.schedule.minutes_past_hour,
        "starting Singapore air quality sensors"
    );

    let poller = tokio::spawn(scheduler.run());

    telemetry::shutdown_signal().await;
    poller.abort();

    warn!("shutdown complete");
    Ok(())
}
