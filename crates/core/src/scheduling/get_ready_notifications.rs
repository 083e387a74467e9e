use crate::error::NudgeError;
use crate::shared::usecase::UseCase;
use nudge_scheduler_domain::{NotificationStatus, ScheduledNotification};
use nudge_scheduler_infra::NudgeContext;
use tracing::warn;

/// Drains every due entry from the delay queue in one atomic call and
/// marks them Sending. Ownership of the returned notifications
/// transfers to the delivery worker.
#[derive(Debug)]
pub struct GetReadyNotificationsUseCase {}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {}

impl From<UseCaseError> for NudgeError {
    fn from(_: UseCaseError) -> Self {
        Self::Internal
    }
}

#[async_trait::async_trait]
impl UseCase for GetReadyNotificationsUseCase {
    type Response = Vec<ScheduledNotification>;

    type Error = UseCaseError;

    const NAME: &'static str = "GetReadyNotifications";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let ready = ctx.repos.delay_queue.pop_ready(now).await;

        for notification in &ready {
            if let Err(e) = ctx
                .repos
                .notifications
                .update_status(&notification.id, NotificationStatus::Sending, now)
                .await
            {
                // Delivery still proceeds; the status is bookkeeping
                warn!(
                    "Unable to mark notification {} as sending: {:?}",
                    notification.id, e
                );
            }
        }

        Ok(ready)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scheduling::schedule_notification::ScheduleNotificationUseCase;
    use crate::shared::usecase::execute;
    use chrono::prelude::*;
    use nudge_scheduler_domain::{NotificationKind, Priority, ID};
    use nudge_scheduler_infra::{NudgeContext, StaticTimeSys};
    use std::sync::Arc;

    fn now_millis() -> i64 {
        Utc.ymd(2021, 6, 1).and_hms(12, 0, 0).timestamp_millis()
    }

    fn setup(now: i64) -> NudgeContext {
        let mut ctx = NudgeContext::create_inmemory();
        ctx.sys = Arc::new(StaticTimeSys(now));
        ctx
    }

    #[tokio::test]
    async fn returns_due_entries_once_and_marks_them_sending() {
        let mut ctx = setup(now_millis());
        let notification = nudge_scheduler_domain::ScheduledNotification::new(
            ID::new(),
            NotificationKind::Departure,
            Priority::Normal,
            now_millis() + 60_000,
            "Time to leave".into(),
            now_millis(),
        );
        let id = notification.id.clone();
        execute(ScheduleNotificationUseCase { notification }, &ctx)
            .await
            .unwrap();

        // Nothing is due yet
        let ready = execute(GetReadyNotificationsUseCase {}, &ctx)
            .await
            .unwrap();
        assert!(ready.is_empty());

        // Jump past the scheduled time
        ctx.sys = Arc::new(StaticTimeSys(now_millis() + 120_000));
        let ready = execute(GetReadyNotificationsUseCase {}, &ctx)
            .await
            .unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].id, id);

        let persisted = ctx.repos.notifications.find(&id).await.unwrap();
        assert_eq!(persisted.status, NotificationStatus::Sending);

        // A second poll without new inserts comes back empty
        let again = execute(GetReadyNotificationsUseCase {}, &ctx)
            .await
            .unwrap();
        assert!(again.is_empty());
    }
}
