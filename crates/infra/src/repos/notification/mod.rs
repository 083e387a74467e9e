mod inmemory;
mod postgres;

pub use inmemory::InMemoryNotificationRepo;
use nudge_scheduler_domain::{NotificationStatus, ScheduledNotification, ID};
pub use postgres::PostgresNotificationRepo;

#[async_trait::async_trait]
pub trait INotificationRepo: Send + Sync {
    async fn insert(&self, notification: &ScheduledNotification) -> anyhow::Result<()>;
    async fn save(&self, notification: &ScheduledNotification) -> anyhow::Result<()>;
    async fn find(&self, notification_id: &ID) -> Option<ScheduledNotification>;
    /// All notifications for `user_id` scheduled at or after `after`.
    /// Used by the rolling-window frequency gate.
    async fn find_by_user_after(&self, user_id: &ID, after: i64) -> Vec<ScheduledNotification>;
    async fn update_status(
        &self,
        notification_id: &ID,
        status: NotificationStatus,
        now: i64,
    ) -> anyhow::Result<bool>;
    async fn delete(&self, notification_id: &ID) -> Option<ScheduledNotification>;
}
