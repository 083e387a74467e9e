use super::INotificationRepo;
use nudge_scheduler_domain::{NotificationStatus, ScheduledNotification, ID};
use std::sync::Mutex;

pub struct InMemoryNotificationRepo {
    notifications: Mutex<Vec<ScheduledNotification>>,
}

impl InMemoryNotificationRepo {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl INotificationRepo for InMemoryNotificationRepo {
    async fn insert(&self, notification: &ScheduledNotification) -> anyhow::Result<()> {
        let mut notifications = self.notifications.lock().unwrap();
        notifications.push(notification.clone());
        Ok(())
    }

    async fn save(&self, notification: &ScheduledNotification) -> anyhow::Result<()> {
        let mut notifications = self.notifications.lock().unwrap();
        for existing in notifications.iter_mut() {
            if existing.id == notification.id {
                *existing = notification.clone();
                return Ok(());
            }
        }
        notifications.push(notification.clone());
        Ok(())
    }

    async fn find(&self, notification_id: &ID) -> Option<ScheduledNotification> {
        let notifications = self.notifications.lock().unwrap();
        notifications
            .iter()
            .find(|n| n.id == *notification_id)
            .cloned()
    }

    async fn find_by_user_after(
        &self,
        user_id: &ID,
        after: i64,
    ) -> Vec<ScheduledNotification> {
        let notifications = self.notifications.lock().unwrap();
        notifications
            .iter()
            .filter(|n| n.user_id == *user_id && n.scheduled_at >= after)
            .cloned()
            .collect()
    }

    async fn update_status(
        &self,
        notification_id: &ID,
        status: NotificationStatus,
        now: i64,
    ) -> anyhow::Result<bool> {
        let mut notifications = self.notifications.lock().unwrap();
        for existing in notifications.iter_mut() {
            if existing.id == *notification_id {
                return Ok(existing.transition_to(status, now));
            }
        }
        Ok(false)
    }

    async fn delete(&self, notification_id: &ID) -> Option<ScheduledNotification> {
        let mut notifications = self.notifications.lock().unwrap();
        let position = notifications.iter().position(|n| n.id == *notification_id)?;
        Some(notifications.remove(position))
    }
}
