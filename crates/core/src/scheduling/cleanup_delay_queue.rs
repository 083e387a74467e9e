use crate::error::NudgeError;
use crate::shared::usecase::UseCase;
use nudge_scheduler_infra::NudgeContext;

/// Purges delay-queue entries far older than any legitimate delay
/// window. Stale entries only exist after crashes or data corruption;
/// the regular delivery poll would otherwise keep re-reading them.
#[derive(Debug)]
pub struct CleanupDelayQueueUseCase {
    pub max_age_hours: i64,
}

#[derive(Debug, PartialEq)]
pub struct CleanupDelayQueueResponse {
    pub purged: i64,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {}

impl From<UseCaseError> for NudgeError {
    fn from(_: UseCaseError) -> Self {
        Self::Internal
    }
}

#[async_trait::async_trait]
impl UseCase for CleanupDelayQueueUseCase {
    type Response = CleanupDelayQueueResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "CleanupDelayQueue";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let now = ctx.sys.get_timestamp_millis();
        let before = now - self.max_age_hours * 60 * 60 * 1000;
        let result = ctx.repos.delay_queue.cleanup_expired(before).await;
        Ok(CleanupDelayQueueResponse {
            purged: result.deleted_count,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use chrono::prelude::*;
    use nudge_scheduler_domain::{
        NotificationKind, Priority, ScheduledNotification, ID,
    };
    use nudge_scheduler_infra::{DelayQueueEntry, NudgeContext, StaticTimeSys};
    use std::sync::Arc;

    #[tokio::test]
    async fn purges_only_entries_beyond_the_age_limit() {
        let now = Utc.ymd(2021, 6, 10).and_hms(12, 0, 0).timestamp_millis();
        let mut ctx = NudgeContext::create_inmemory();
        ctx.sys = Arc::new(StaticTimeSys(now));

        let entry = |execute_at: i64| DelayQueueEntry {
            notification: ScheduledNotification::new(
                ID::new(),
                NotificationKind::Departure,
                Priority::Normal,
                execute_at,
                "".into(),
                now,
            ),
            execute_at,
        };
        // Three days stale, one hour stale, and pending
        ctx.repos
            .delay_queue
            .schedule(&entry(now - 72 * 3_600_000))
            .await
            .unwrap();
        ctx.repos
            .delay_queue
            .schedule(&entry(now - 3_600_000))
            .await
            .unwrap();
        ctx.repos
            .delay_queue
            .schedule(&entry(now + 3_600_000))
            .await
            .unwrap();

        let res = execute(CleanupDelayQueueUseCase { max_age_hours: 48 }, &ctx)
            .await
            .unwrap();
        assert_eq!(res.purged, 1);

        // The recent and pending entries are still there
        let ready = ctx.repos.delay_queue.pop_ready(now + 7_200_000).await;
        assert_eq!(ready.len(), 2);
    }
}
