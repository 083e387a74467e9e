use super::{DelayQueueEntry, IDelayQueueRepo};
use crate::repos::shared::repo::DeleteResult;
use nudge_scheduler_domain::{ScheduledNotification, ID};
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::error;

/// The `delay_queue` table is indexed on `execute_at`; draining the
/// ready set is one `DELETE ... RETURNING` statement, which is what
/// guarantees each row is handed to exactly one poller.
pub struct PostgresDelayQueueRepo {
    pool: PgPool,
}

impl PostgresDelayQueueRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_notification(row: &PgRow) -> Option<ScheduledNotification> {
    let payload: serde_json::Value = row.try_get("payload").ok()?;
    match serde_json::from_value(payload) {
        Ok(notification) => Some(notification),
        Err(e) => {
            error!("Corrupt payload in delay_queue table: {:?}", e);
            None
        }
    }
}

#[async_trait::async_trait]
impl IDelayQueueRepo for PostgresDelayQueueRepo {
    async fn schedule(&self, entry: &DelayQueueEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO delay_queue
            (notification_uid, execute_at, payload)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(entry.notification.id.inner_ref())
        .bind(entry.execute_at)
        .bind(serde_json::to_value(&entry.notification)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn schedule_batch(&self, entries: &[DelayQueueEntry]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO delay_queue
                (notification_uid, execute_at, payload)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(entry.notification.id.inner_ref())
            .bind(entry.execute_at)
            .bind(serde_json::to_value(&entry.notification)?)
            .execute(&mut tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn cancel(&self, notification_id: &ID) -> bool {
        let result = sqlx::query(
            r#"
            DELETE FROM delay_queue
            WHERE notification_uid = $1
            "#,
        )
        .bind(notification_id.inner_ref())
        .execute(&self.pool)
        .await;
        match result {
            Ok(done) => done.rows_affected() > 0,
            Err(e) => {
                error!("Unable to cancel delay queue entry: {:?}", e);
                false
            }
        }
    }

    async fn pop_ready(&self, now: i64) -> Vec<ScheduledNotification> {
        sqlx::query(
            r#"
            DELETE FROM delay_queue
            WHERE execute_at <= $1
            RETURNING payload
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            error!("Unable to pop ready delay queue entries: {:?}", e);
            Vec::new()
        })
        .iter()
        .filter_map(to_notification)
        .collect()
    }

    async fn cleanup_expired(&self, before: i64) -> DeleteResult {
        let result = sqlx::query(
            r#"
            DELETE FROM delay_queue
            WHERE execute_at <= $1
            "#,
        )
        .bind(before)
        .execute(&self.pool)
        .await;
        match result {
            Ok(done) => DeleteResult {
                deleted_count: done.rows_affected() as i64,
            },
            Err(e) => {
                error!("Unable to cleanup delay queue: {:?}", e);
                DeleteResult { deleted_count: 0 }
            }
        }
    }
}
