use crate::scheduling::cleanup_delay_queue::CleanupDelayQueueUseCase;
use crate::scheduling::get_ready_notifications::GetReadyNotificationsUseCase;
use crate::shared::usecase::execute;
use nudge_scheduler_infra::NudgeContext;
use std::time::Duration;
use tokio::time::{interval, sleep};
use tracing::{error, info};

pub fn get_start_delay(now_ts: usize, secs_before_min: usize) -> usize {
    let secs_to_next_minute = 60 - (now_ts / 1000) % 60;
    if secs_to_next_minute > secs_before_min {
        secs_to_next_minute - secs_before_min
    } else {
        secs_to_next_minute + (60 - secs_before_min)
    }
}

/// Polls the delay queue once a minute, aligned to the minute
/// boundary, and hands anything due over to delivery.
pub fn start_delivery_job(ctx: NudgeContext) {
    tokio::spawn(async move {
        let now = ctx.sys.get_timestamp_millis();
        let secs_to_next_run = get_start_delay(now as usize, 0);
        sleep(Duration::from_secs(secs_to_next_run as u64)).await;

        let mut minutely_interval =
            interval(Duration::from_secs(ctx.config.delivery_poll_interval_secs));
        loop {
            minutely_interval.tick().await;
            let context = ctx.clone();
            tokio::spawn(deliver_ready_notifications(context));
        }
    });
}

async fn deliver_ready_notifications(context: NudgeContext) {
    let notifications = match execute(GetReadyNotificationsUseCase {}, &context).await {
        Ok(notifications) => notifications,
        Err(_) => return,
    };
    if notifications.is_empty() {
        return;
    }

    // Delivery itself is owned by the push gateway; this side only
    // records the hand-off.
    for notification in notifications {
        info!(
            "Handing notification {} (user {}, kind {:?}) to delivery",
            notification.id, notification.user_id, notification.kind
        );
    }
}

/// Purges delay queue entries that were never picked up, once an
/// hour.
pub fn start_cleanup_job(ctx: NudgeContext) {
    tokio::spawn(async move {
        let mut hourly_interval = interval(Duration::from_secs(60 * 60));
        loop {
            hourly_interval.tick().await;

            let usecase = CleanupDelayQueueUseCase {
                max_age_hours: ctx.config.delay_queue_max_age_hours,
            };
            match execute(usecase, &ctx).await {
                Ok(res) if res.purged > 0 => {
                    info!("Purged {} stale delay queue entries", res.purged)
                }
                Ok(_) => {}
                Err(e) => error!("Delay queue cleanup failed: {:?}", e),
            }
        }
    });
}
