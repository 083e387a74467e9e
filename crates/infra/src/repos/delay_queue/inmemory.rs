use super::{DelayQueueEntry, IDelayQueueRepo};
use crate::repos::shared::repo::DeleteResult;
use nudge_scheduler_domain::{ScheduledNotification, ID};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Time-ordered map plus a secondary id -> execute_at index, so that
/// `cancel` does not have to scan every pending entry. Both structures
/// live behind one mutex and are updated together, which is also what
/// makes `pop_ready` a single atomic remove-and-return.
struct Queue {
    by_time: BTreeMap<i64, Vec<ScheduledNotification>>,
    by_id: HashMap<ID, i64>,
}

pub struct InMemoryDelayQueueRepo {
    queue: Mutex<Queue>,
}

impl InMemoryDelayQueueRepo {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Queue {
                by_time: BTreeMap::new(),
                by_id: HashMap::new(),
            }),
        }
    }

    fn insert(queue: &mut Queue, entry: &DelayQueueEntry) {
        queue
            .by_time
            .entry(entry.execute_at)
            .or_insert_with(Vec::new)
            .push(entry.notification.clone());
        queue
            .by_id
            .insert(entry.notification.id.clone(), entry.execute_at);
    }

    fn drain_before(queue: &mut Queue, cutoff: i64) -> Vec<ScheduledNotification> {
        let still_pending = queue.by_time.split_off(&(cutoff + 1));
        let due = std::mem::replace(&mut queue.by_time, still_pending);

        let mut popped = Vec::new();
        for (_, notifications) in due {
            for notification in notifications {
                queue.by_id.remove(&notification.id);
                popped.push(notification);
            }
        }
        popped
    }
}

#[async_trait::async_trait]
impl IDelayQueueRepo for InMemoryDelayQueueRepo {
    async fn schedule(&self, entry: &DelayQueueEntry) -> anyhow::Result<()> {
        let mut queue = self.queue.lock().unwrap();
        Self::insert(&mut queue, entry);
        Ok(())
    }

    async fn schedule_batch(&self, entries: &[DelayQueueEntry]) -> anyhow::Result<()> {
        let mut queue = self.queue.lock().unwrap();
        for entry in entries {
            Self::insert(&mut queue, entry);
        }
        Ok(())
    }

    async fn cancel(&self, notification_id: &ID) -> bool {
        let mut queue = self.queue.lock().unwrap();
        let execute_at = match queue.by_id.remove(notification_id) {
            Some(execute_at) => execute_at,
            None => return false,
        };
        let mut remove_slot = false;
        if let Some(slot) = queue.by_time.get_mut(&execute_at) {
            slot.retain(|n| n.id != *notification_id);
            remove_slot = slot.is_empty();
        }
        if remove_slot {
            queue.by_time.remove(&execute_at);
        }
        true
    }

    async fn pop_ready(&self, now: i64) -> Vec<ScheduledNotification> {
        let mut queue = self.queue.lock().unwrap();
        Self::drain_before(&mut queue, now)
    }

    async fn cleanup_expired(&self, before: i64) -> DeleteResult {
        let mut queue = self.queue.lock().unwrap();
        let purged = Self::drain_before(&mut queue, before);
        DeleteResult {
            deleted_count: purged.len() as i64,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use nudge_scheduler_domain::{NotificationKind, Priority};

    fn entry(execute_at: i64) -> DelayQueueEntry {
        DelayQueueEntry {
            notification: ScheduledNotification::new(
                ID::new(),
                NotificationKind::Departure,
                Priority::Normal,
                execute_at,
                "Time to leave".into(),
                0,
            ),
            execute_at,
        }
    }

    #[tokio::test]
    async fn pop_ready_returns_each_entry_exactly_once() {
        let queue = InMemoryDelayQueueRepo::new();
        queue.schedule(&entry(100)).await.unwrap();
        queue.schedule(&entry(200)).await.unwrap();
        queue.schedule(&entry(5000)).await.unwrap();

        let ready = queue.pop_ready(1000).await;
        assert_eq!(ready.len(), 2);
        assert!(queue.pop_ready(1000).await.is_empty());

        let rest = queue.pop_ready(10_000).await;
        assert_eq!(rest.len(), 1);
    }

    #[tokio::test]
    async fn cancelled_entries_never_become_ready() {
        let queue = InMemoryDelayQueueRepo::new();
        let e = entry(100);
        let id = e.notification.id.clone();
        queue.schedule(&e).await.unwrap();

        assert!(queue.cancel(&id).await);
        assert!(queue.pop_ready(1000).await.is_empty());
    }

    #[tokio::test]
    async fn cancel_of_unknown_or_popped_id_reports_not_found() {
        let queue = InMemoryDelayQueueRepo::new();
        assert!(!queue.cancel(&ID::new()).await);

        let e = entry(100);
        let id = e.notification.id.clone();
        queue.schedule(&e).await.unwrap();
        queue.pop_ready(1000).await;
        assert!(!queue.cancel(&id).await);
    }

    #[tokio::test]
    async fn cancel_leaves_other_entries_at_the_same_timestamp() {
        let queue = InMemoryDelayQueueRepo::new();
        let first = entry(100);
        let second = entry(100);
        queue.schedule(&first).await.unwrap();
        queue.schedule(&second).await.unwrap();

        assert!(queue.cancel(&first.notification.id).await);
        let ready = queue.pop_ready(1000).await;
        assert_eq!(ready, vec![second.notification]);
    }

    #[tokio::test]
    async fn cleanup_purges_stale_entries_only() {
        let queue = InMemoryDelayQueueRepo::new();
        queue.schedule(&entry(100)).await.unwrap();
        queue.schedule(&entry(5000)).await.unwrap();

        let result = queue.cleanup_expired(1000).await;
        assert_eq!(result.deleted_count, 1);
        assert_eq!(queue.pop_ready(10_000).await.len(), 1);
    }

    #[tokio::test]
    async fn batch_schedule_places_all_entries() {
        let queue = InMemoryDelayQueueRepo::new();
        let entries: Vec<_> = (0..5).map(|i| entry(100 + i)).collect();
        queue.schedule_batch(&entries).await.unwrap();
        assert_eq!(queue.pop_ready(1000).await.len(), 5);
    }
}
