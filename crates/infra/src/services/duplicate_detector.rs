use crate::repos::INotificationRepo;
use nudge_scheduler_domain::{NotificationStatus, ScheduledNotification};
use std::sync::Arc;

/// Two notifications are equivalent when they target the same user,
/// kind and course at roughly the same time. Spacing guard for when
/// the same domain event is processed twice.
pub const DUPLICATE_WINDOW_MILLIS: i64 = 30 * 60 * 1000;

#[async_trait::async_trait]
pub trait IDuplicateDetector: Send + Sync {
    async fn is_duplicate(&self, candidate: &ScheduledNotification) -> bool;
}

/// Default detector: checks the notification repo for an equivalent
/// pending row.
pub struct RepoDuplicateDetector {
    notifications: Arc<dyn INotificationRepo>,
}

impl RepoDuplicateDetector {
    pub fn new(notifications: Arc<dyn INotificationRepo>) -> Self {
        Self { notifications }
    }
}

#[async_trait::async_trait]
impl IDuplicateDetector for RepoDuplicateDetector {
    async fn is_duplicate(&self, candidate: &ScheduledNotification) -> bool {
        let window_start = candidate.scheduled_at - DUPLICATE_WINDOW_MILLIS;
        let pending = self
            .notifications
            .find_by_user_after(&candidate.user_id, window_start)
            .await;
        pending.iter().any(|existing| {
            existing.id != candidate.id
                && existing.status == NotificationStatus::Scheduled
                && existing.kind == candidate.kind
                && existing.course_id == candidate.course_id
                && (existing.scheduled_at - candidate.scheduled_at).abs()
                    <= DUPLICATE_WINDOW_MILLIS
        })
    }
}
