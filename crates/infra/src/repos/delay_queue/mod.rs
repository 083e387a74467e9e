mod inmemory;
mod postgres;

pub use inmemory::InMemoryDelayQueueRepo;
use nudge_scheduler_domain::{ScheduledNotification, ID};
pub use postgres::PostgresDelayQueueRepo;

use crate::repos::shared::repo::DeleteResult;

/// An entry waiting in the delay queue. `execute_at` is the absolute
/// unix-millis timestamp at which the payload becomes ready.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayQueueEntry {
    pub notification: ScheduledNotification,
    pub execute_at: i64,
}

/// The single authoritative store of pending deliveries, ordered by
/// execution timestamp.
#[async_trait::async_trait]
pub trait IDelayQueueRepo: Send + Sync {
    async fn schedule(&self, entry: &DelayQueueEntry) -> anyhow::Result<()>;
    async fn schedule_batch(&self, entries: &[DelayQueueEntry]) -> anyhow::Result<()>;
    /// Removes the entry for `notification_id`. `false` when no such
    /// entry is pending (possibly already popped).
    async fn cancel(&self, notification_id: &ID) -> bool;
    /// Atomically removes and returns every entry due at or before
    /// `now`. Entries are handed out exactly once, also under
    /// concurrent pollers.
    async fn pop_ready(&self, now: i64) -> Vec<ScheduledNotification>;
    /// Purges entries scheduled before `before`, independent of the
    /// ready-set logic. Used against stale or corrupt data.
    async fn cleanup_expired(&self, before: i64) -> DeleteResult;
}
