use super::INotificationRepo;
use nudge_scheduler_domain::{NotificationStatus, ScheduledNotification, ID};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::error;

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_label(status: NotificationStatus) -> &'static str {
    match status {
        NotificationStatus::Draft => "draft",
        NotificationStatus::Scheduled => "scheduled",
        NotificationStatus::Sending => "sending",
        NotificationStatus::Sent => "sent",
        NotificationStatus::Failed => "failed",
        NotificationStatus::Cancelled => "cancelled",
    }
}

fn to_notification(row: &PgRow) -> Option<ScheduledNotification> {
    let payload: serde_json::Value = row.try_get("payload").ok()?;
    match serde_json::from_value(payload) {
        Ok(notification) => Some(notification),
        Err(e) => {
            error!("Corrupt notification payload in notifications table: {:?}", e);
            None
        }
    }
}

#[async_trait::async_trait]
impl INotificationRepo for PostgresNotificationRepo {
    async fn insert(&self, notification: &ScheduledNotification) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications
            (notification_uid, user_uid, scheduled_at, status, payload)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notification.id.inner_ref())
        .bind(notification.user_id.inner_ref())
        .bind(notification.scheduled_at)
        .bind(status_label(notification.status))
        .bind(serde_json::to_value(notification)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save(&self, notification: &ScheduledNotification) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET scheduled_at = $2, status = $3, payload = $4
            WHERE notification_uid = $1
            "#,
        )
        .bind(notification.id.inner_ref())
        .bind(notification.scheduled_at)
        .bind(status_label(notification.status))
        .bind(serde_json::to_value(notification)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, notification_id: &ID) -> Option<ScheduledNotification> {
        let row = sqlx::query(
            r#"
            SELECT payload FROM notifications
            WHERE notification_uid = $1
            "#,
        )
        .bind(notification_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()??;
        to_notification(&row)
    }

    async fn find_by_user_after(
        &self,
        user_id: &ID,
        after: i64,
    ) -> Vec<ScheduledNotification> {
        sqlx::query(
            r#"
            SELECT payload FROM notifications
            WHERE user_uid = $1 AND scheduled_at >= $2
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(after)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|_| Vec::new())
        .iter()
        .filter_map(to_notification)
        .collect()
    }

    async fn update_status(
        &self,
        notification_id: &ID,
        status: NotificationStatus,
        now: i64,
    ) -> anyhow::Result<bool> {
        // Read-modify-write so the domain state machine stays in charge
        let mut notification = match self.find(notification_id).await {
            Some(notification) => notification,
            None => return Ok(false),
        };
        if !notification.transition_to(status, now) {
            return Ok(false);
        }
        self.save(&notification).await?;
        Ok(true)
    }

    async fn delete(&self, notification_id: &ID) -> Option<ScheduledNotification> {
        let row = sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE notification_uid = $1
            RETURNING payload
            "#,
        )
        .bind(notification_id.inner_ref())
        .fetch_optional(&self.pool)
        .await
        .ok()??;
        to_notification(&row)
    }
}
