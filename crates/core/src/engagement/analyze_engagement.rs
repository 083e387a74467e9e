use chrono::prelude::*;
use chrono_tz::Tz;
use nudge_scheduler_domain::{
    ActivityPattern, EngagementMetrics, NotificationStatus, Priority, ScheduledNotification,
    ID,
};
use nudge_scheduler_infra::NudgeContext;

/// Rolling window of the frequency ceiling, in millis.
pub const FREQUENCY_WINDOW_MILLIS: i64 = 7 * 24 * 60 * 60 * 1000;

async fn user_timezone(ctx: &NudgeContext, user_id: &ID) -> Tz {
    ctx.services
        .user_preferences
        .get_settings(user_id)
        .await
        .map(|settings| settings.timezone)
        .unwrap_or(chrono_tz::UTC)
}

/// A fresh engagement snapshot for the user, derived from their full
/// interaction history.
pub async fn metrics_for_user(ctx: &NudgeContext, user_id: &ID) -> EngagementMetrics {
    let interactions = ctx.repos.interactions.find_by_user(user_id).await;
    let tz = user_timezone(ctx, user_id).await;
    EngagementMetrics::analyze(user_id.clone(), &interactions, tz)
}

/// How many non-urgent notifications fall in the user's current
/// rolling week: delivered within the past seven days, or pending
/// within the next seven. Cancelled ones do not count, and neither do
/// ones scheduled beyond the window, which draw on a later week's
/// budget.
pub async fn weekly_notification_count(ctx: &NudgeContext, user_id: &ID) -> usize {
    let now = ctx.sys.get_timestamp_millis();
    let window_start = now - FREQUENCY_WINDOW_MILLIS;
    let window_end = now + FREQUENCY_WINDOW_MILLIS;
    ctx.repos
        .notifications
        .find_by_user_after(user_id, window_start)
        .await
        .iter()
        .filter(|n| {
            n.scheduled_at < window_end
                && n.priority != Priority::Urgent
                && n.status != NotificationStatus::Cancelled
        })
        .count()
}

/// The user's weekly ceiling, tiered by engagement rate.
pub async fn frequency_limit(ctx: &NudgeContext, user_id: &ID) -> usize {
    metrics_for_user(ctx, user_id).await.frequency_limit()
}

pub async fn engagement_rate(ctx: &NudgeContext, user_id: &ID) -> f64 {
    metrics_for_user(ctx, user_id).await.engagement_rate
}

pub async fn optimal_hour(ctx: &NudgeContext, user_id: &ID) -> Option<u32> {
    metrics_for_user(ctx, user_id).await.optimal_hour()
}

/// Estimated engagement probability for one concrete notification,
/// weighted by its kind and local delivery hour.
pub async fn engagement_probability(
    ctx: &NudgeContext,
    user_id: &ID,
    notification: &ScheduledNotification,
) -> f64 {
    let metrics = metrics_for_user(ctx, user_id).await;
    let tz = user_timezone(ctx, user_id).await;
    let hour = tz.timestamp_millis(notification.scheduled_at).hour();
    metrics.engagement_probability(notification.kind, hour)
}

pub async fn activity_pattern(ctx: &NudgeContext, user_id: &ID) -> ActivityPattern {
    let interactions = ctx.repos.interactions.find_by_user(user_id).await;
    let tz = user_timezone(ctx, user_id).await;
    ActivityPattern::from_history(&interactions, tz)
}
