use crate::engagement;
use crate::error::NudgeError;
use crate::shared::usecase::UseCase;
use nudge_scheduler_domain::{
    NotificationStatus, Priority, ScheduledNotification, ID,
};
use nudge_scheduler_infra::{DelayQueueEntry, NudgeContext};
use tracing::error;

/// Validates a single notification and commits it to the delay
/// queue: the time must be in the future, it must not duplicate a
/// pending one, and non-urgent ones must fit under the user's weekly
/// frequency ceiling.
#[derive(Debug)]
pub struct ScheduleNotificationUseCase {
    pub notification: ScheduledNotification,
}

#[derive(Debug, PartialEq)]
pub struct ScheduleNotificationResponse {
    pub notification_id: ID,
    pub scheduled_at: i64,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidScheduleTime(i64),
    Duplicate,
    FrequencyLimitExceeded { count: usize, limit: usize },
    StorageError,
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::InvalidScheduleTime(at) => Self::InvalidScheduleTime(at),
            UseCaseError::Duplicate => {
                Self::ScheduleConflict("An equivalent notification is already pending".into())
            }
            UseCaseError::FrequencyLimitExceeded { count, limit } => Self::ScheduleConflict(
                format!("Weekly frequency ceiling reached: {} of {}", count, limit),
            ),
            UseCaseError::StorageError => Self::Internal,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ScheduleNotificationUseCase {
    type Response = ScheduleNotificationResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleNotification";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        if self.notification.scheduled_at <= now {
            return Err(UseCaseError::InvalidScheduleTime(
                self.notification.scheduled_at,
            ));
        }

        if ctx
            .services
            .duplicate_detector
            .is_duplicate(&self.notification)
            .await
        {
            return Err(UseCaseError::Duplicate);
        }

        if self.notification.priority != Priority::Urgent {
            let count =
                engagement::weekly_notification_count(ctx, &self.notification.user_id).await;
            let limit = engagement::frequency_limit(ctx, &self.notification.user_id).await;
            if count >= limit {
                return Err(UseCaseError::FrequencyLimitExceeded { count, limit });
            }
        }

        let mut notification = self.notification.clone();
        if notification.status == NotificationStatus::Draft {
            notification.transition_to(NotificationStatus::Scheduled, now);
        }

        ctx.repos
            .notifications
            .insert(&notification)
            .await
            .map_err(|_| UseCaseError::StorageError)?;
        if let Err(e) = ctx
            .repos
            .delay_queue
            .schedule(&DelayQueueEntry {
                execute_at: notification.scheduled_at,
                notification: notification.clone(),
            })
            .await
        {
            // The queue is authoritative: a row it never accepted must
            // not stay Scheduled and consume the user's weekly ceiling
            error!(
                "Delay queue rejected notification {}: {:?}",
                notification.id, e
            );
            ctx.repos.notifications.delete(&notification.id).await;
            return Err(UseCaseError::StorageError);
        }

        Ok(ScheduleNotificationResponse {
            notification_id: notification.id,
            scheduled_at: notification.scheduled_at,
        })
    }
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

    fn notification(user_id: &ID, scheduled_at: i64) -> ScheduledNotification {
        ScheduledNotification::new(
            user_id.clone(),
            NotificationKind::Departure,
            Priority::Normal,
            scheduled_at,
            "Time to leave".into(),
            now_millis(),
        )
    }

    #[tokio::test]
    async fn schedules_a_future_notification() {
        let ctx = setup();
        let n = notification(&ID::new(), now_millis() + 60_000);
        let id = n.id.clone();

        let res = execute(ScheduleNotificationUseCase { notification: n }, &ctx).await;
        assert!(res.is_ok());
        assert_eq!(res.unwrap().notification_id, id);

        let persisted = ctx.repos.notifications.find(&id).await.unwrap();
        assert_eq!(persisted.status, NotificationStatus::Scheduled);
        let ready = ctx.repos.delay_queue.pop_ready(now_millis() + 120_000).await;
        assert_eq!(ready.len(), 1);
    }

    #[tokio::test]
    async fn rejects_past_schedule_times() {
        let ctx = setup();
        let n = notification(&ID::new(), now_millis() - 1);
        let res = execute(ScheduleNotificationUseCase { notification: n }, &ctx).await;
        assert_eq!(
            res.unwrap_err(),
            UseCaseError::InvalidScheduleTime(now_millis() - 1)
        );

        let n = notification(&ID::new(), now_millis());
        let res = execute(ScheduleNotificationUseCase { notification: n }, &ctx).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn rejects_duplicates() {
        let ctx = setup();
        let user_id = ID::new();
        let first = notification(&user_id, now_millis() + 60_000);
        execute(ScheduleNotificationUseCase { notification: first }, &ctx)
            .await
            .unwrap();

        let second = notification(&user_id, now_millis() + 60_000);
        let res = execute(ScheduleNotificationUseCase { notification: second }, &ctx).await;
        assert_eq!(res.unwrap_err(), UseCaseError::Duplicate);
    }

    #[tokio::test]
    async fn enforces_the_weekly_frequency_ceiling() {
        let ctx = setup();
        let user_id = ID::new();
        // No interaction history -> engagement rate 0 -> limit 3/week
        for i in 0..3 {
            let mut n = notification(&user_id, now_millis() + (i + 1) * 3_600_000);
            n.kind = match i {
                0 => NotificationKind::Preparation,
                1 => NotificationKind::Departure,
                _ => NotificationKind::Move,
            };
            let res = execute(ScheduleNotificationUseCase { notification: n }, &ctx).await;
            assert!(res.is_ok());
        }

        let mut fourth = notification(&user_id, now_millis() + 10 * 3_600_000);
        fourth.kind = NotificationKind::Preparation;
        let res = execute(
            ScheduleNotificationUseCase {
                notification: fourth.clone(),
            },
            &ctx,
        )
        .await;
        assert_eq!(
            res.unwrap_err(),
            UseCaseError::FrequencyLimitExceeded { count: 3, limit: 3 }
        );

        // Urgent notifications bypass the gate
        fourth.priority = Priority::Urgent;
        let res = execute(ScheduleNotificationUseCase { notification: fourth }, &ctx).await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn a_rejected_queue_write_leaves_no_row_behind() {
        let mut ctx = setup();
        ctx.repos.delay_queue = Arc::new(UnavailableDelayQueue);
        let user_id = ID::new();
        let n = notification(&user_id, now_millis() + 60_000);
        let id = n.id.clone();

        let res = execute(ScheduleNotificationUseCase { notification: n }, &ctx).await;
        assert_eq!(res.unwrap_err(), UseCaseError::StorageError);

        // The row is rolled back, so it is not counted against the
        // user's weekly ceiling
        assert!(ctx.repos.notifications.find(&id).await.is_none());
        assert_eq!(
            engagement::weekly_notification_count(&ctx, &user_id).await,
            0
        );
    }
}
