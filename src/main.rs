mod telemetry;

use nudge_scheduler_core::job_schedulers::{start_cleanup_job, start_delivery_job};
use nudge_scheduler_infra::setup_context;
use telemetry::{get_subscriber, init_subscriber};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("nudge_scheduler".into(), "info".into());
    init_subscriber(subscriber);

    let context = setup_context().await?;

    start_delivery_job(context.clone());
    start_cleanup_job(context);
    info!("Delivery and cleanup jobs started");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
