use crate::engagement;
use crate::error::NudgeError;
use crate::shared::usecase::UseCase;
use nudge_scheduler_domain::{NotificationStatus, Priority, ScheduledNotification, ID};
use nudge_scheduler_infra::{DelayQueueEntry, NudgeContext};
use tracing::info;

/// Batch writes are grouped into one delay-queue call per chunk of
/// this size, bounding memory and amortizing per-call overhead.
pub const BATCH_CHUNK_SIZE: usize = 50;

/// Schedules many notifications at once. A failing item is recorded
/// and skipped; it never aborts the rest of the batch.
#[derive(Debug)]
pub struct ScheduleBatchUseCase {
    pub notifications: Vec<ScheduledNotification>,
}

#[derive(Debug, PartialEq)]
pub struct BatchItemError {
    pub notification_id: ID,
    pub error: NudgeError,
}

#[derive(Debug)]
pub struct ScheduleBatchResponse {
    pub total_scheduled: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub errors: Vec<BatchItemError>,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {}

impl From<UseCaseError> for NudgeError {
    fn from(_: UseCaseError) -> Self {
        Self::Internal
    }
}

#[async_trait::async_trait]
impl UseCase for ScheduleBatchUseCase {
    type Response = ScheduleBatchResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleBatch";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let mut response = ScheduleBatchResponse {
            total_scheduled: self.notifications.len(),
            success_count: 0,
            error_count: 0,
            errors: Vec::new(),
        };

        for chunk in self.notifications.chunks(BATCH_CHUNK_SIZE) {
            let mut entries: Vec<DelayQueueEntry> = Vec::with_capacity(chunk.len());

            for notification in chunk {
                match validate_and_persist(ctx, notification).await {
                    Ok(committed) => entries.push(DelayQueueEntry {
                        execute_at: committed.scheduled_at,
                        notification: committed,
                    }),
                    Err(error) => {
                        response.error_count += 1;
                        response.errors.push(BatchItemError {
                            notification_id: notification.id.clone(),
                            error,
                        });
                    }
                }
            }

            if entries.is_empty() {
                continue;
            }
            match ctx.repos.delay_queue.schedule_batch(&entries).await {
                Ok(_) => response.success_count += entries.len(),
                Err(e) => {
                    // The whole chunk missed the queue; roll the rows
                    // back and report every item
                    info!("Delay queue rejected a batch chunk: {:?}", e);
                    for entry in &entries {
                        ctx.repos.notifications.delete(&entry.notification.id).await;
                        response.error_count += 1;
                        response.errors.push(BatchItemError {
                            notification_id: entry.notification.id.clone(),
                            error: NudgeError::Internal,
                        });
                    }
                }
            }
        }

        Ok(response)
    }
}

async fn validate_and_persist(
    ctx: &NudgeContext,
    notification: &ScheduledNotification,
) -> Result<ScheduledNotification, NudgeError> {
    let now = ctx.sys.get_timestamp_millis();
    if notification.scheduled_at <= now {
        return Err(NudgeError::InvalidScheduleTime(notification.scheduled_at));
    }
    if ctx
        .services
        .duplicate_detector
        .is_duplicate(notification)
        .await
    {
        return Err(NudgeError::ScheduleConflict(
            "An equivalent notification is already pending".into(),
        ));
    }
    if notification.priority != Priority::Urgent {
        let count = engagement::weekly_notification_count(ctx, &notification.user_id).await;
        let limit = engagement::frequency_limit(ctx, &notification.user_id).await;
        if count >= limit {
            return Err(NudgeError::ScheduleConflict(format!(
                "Weekly frequency ceiling reached: {} of {}",
                count, limit
            )));
        }
    }

    let mut committed = notification.clone();
    if committed.status == NotificationStatus::Draft {
        committed.transition_to(NotificationStatus::Scheduled, now);
    }
    ctx.repos
        .notifications
        .insert(&committed)
        .await
        .map_err(|_| NudgeError::Internal)?;
    Ok(committed)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use chrono::prelude::*;
    use nudge_scheduler_domain::NotificationKind;
    use nudge_scheduler_infra::{DeleteResult, IDelayQueueRepo, NudgeContext, StaticTimeSys};
    use std::sync::Arc;

    struct UnavailableDelayQueue;

    #[async_trait::async_trait]
    impl IDelayQueueRepo for UnavailableDelayQueue {
        async fn schedule(&self, _entry: &DelayQueueEntry) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("Connection refused"))
        }

        async fn schedule_batch(&self, _entries: &[DelayQueueEntry]) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("Connection refused"))
        }

        async fn cancel(&self, _notification_id: &ID) -> bool {
            false
        }

        async fn pop_ready(&self, _now: i64) -> Vec<ScheduledNotification> {
            Vec::new()
        }

        async fn cleanup_expired(&self, _before: i64) -> DeleteResult {
            DeleteResult { deleted_count: 0 }
        }
    }

    fn now_millis() -> i64 {
        Utc.ymd(2021, 6, 1).and_hms(12, 0, 0).timestamp_millis()
    }

    fn setup() -> NudgeContext {
        let mut ctx = NudgeContext::create_inmemory();
        ctx.sys = Arc::new(StaticTimeSys(now_millis()));
        ctx
    }

    fn urgent(scheduled_at: i64) -> ScheduledNotification {
        ScheduledNotification::new(
            ID::new(),
            NotificationKind::UrgentChange,
            Priority::Urgent,
            scheduled_at,
            "Course changed".into(),
            now_millis(),
        )
    }

    #[tokio::test]
    async fn counts_always_add_up() {
        let ctx = setup();
        let mut notifications = Vec::new();
        for i in 0..10 {
            notifications.push(urgent(now_millis() + (i + 1) * 3_600_000));
        }
        // Two invalid items: one in the past, one right now
        notifications.push(urgent(now_millis() - 1));
        notifications.push(urgent(now_millis()));

        let res = execute(ScheduleBatchUseCase { notifications }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.total_scheduled, 12);
        assert_eq!(res.success_count, 10);
        assert_eq!(res.error_count, 2);
        assert_eq!(res.success_count + res.error_count, res.total_scheduled);
        assert_eq!(res.errors.len(), 2);
    }

    #[tokio::test]
    async fn per_item_failures_do_not_abort_the_batch() {
        let ctx = setup();
        let good = urgent(now_millis() + 3_600_000);
        let good_id = good.id.clone();
        let bad = urgent(now_millis() - 3_600_000);

        let res = execute(
            ScheduleBatchUseCase {
                notifications: vec![bad, good],
            },
            &ctx,
        )
        .await
        .unwrap();
        assert_eq!(res.success_count, 1);
        assert!(ctx.repos.notifications.find(&good_id).await.is_some());
        assert!(matches!(
            res.errors[0].error,
            NudgeError::InvalidScheduleTime(_)
        ));
    }

    #[tokio::test]
    async fn batches_larger_than_a_chunk_are_processed_fully() {
        let ctx = setup();
        let notifications: Vec<_> = (0..(BATCH_CHUNK_SIZE as i64 + 20))
            .map(|i| urgent(now_millis() + (i + 1) * 60_000))
            .collect();

        let res = execute(ScheduleBatchUseCase { notifications }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.success_count, BATCH_CHUNK_SIZE + 20);
        assert_eq!(res.error_count, 0);

        let ready = ctx
            .repos
            .delay_queue
            .pop_ready(now_millis() + 100 * 3_600_000)
            .await;
        assert_eq!(ready.len(), BATCH_CHUNK_SIZE + 20);
    }

    #[tokio::test]
    async fn a_rejected_chunk_leaves_no_rows_behind() {
        let mut ctx = setup();
        ctx.repos.delay_queue = Arc::new(UnavailableDelayQueue);
        let notifications: Vec<_> = (0..3)
            .map(|i| urgent(now_millis() + (i + 1) * 3_600_000))
            .collect();
        let ids: Vec<_> = notifications.iter().map(|n| n.id.clone()).collect();

        let res = execute(ScheduleBatchUseCase { notifications }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.success_count, 0);
        assert_eq!(res.error_count, 3);

        // The rows were rolled back together with the failed chunk
        for id in &ids {
            assert!(ctx.repos.notifications.find(id).await.is_none());
        }
    }
}
