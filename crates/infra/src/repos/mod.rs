mod delay_queue;
mod interaction;
mod notification;
mod shared;

pub use delay_queue::{DelayQueueEntry, IDelayQueueRepo, InMemoryDelayQueueRepo};
use delay_queue::PostgresDelayQueueRepo;
pub use interaction::{IInteractionRepo, InMemoryInteractionRepo};
use interaction::PostgresInteractionRepo;
pub use notification::{INotificationRepo, InMemoryNotificationRepo};
use notification::PostgresNotificationRepo;
pub use shared::repo::DeleteResult;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct Repos {
    pub notifications: Arc<dyn INotificationRepo>,
    pub delay_queue: Arc<dyn IDelayQueueRepo>,
    pub interactions: Arc<dyn IInteractionRepo>,
}

impl Repos {
    pub fn create_postgres(pool: PgPool) -> Self {
        Self {
            notifications: Arc::new(PostgresNotificationRepo::new(pool.clone())),
            delay_queue: Arc::new(PostgresDelayQueueRepo::new(pool.clone())),
            interactions: Arc::new(PostgresInteractionRepo::new(pool)),
        }
    }

    pub fn create_inmemory() -> Self {
        Self {
            notifications: Arc::new(InMemoryNotificationRepo::new()),
            delay_queue: Arc::new(InMemoryDelayQueueRepo::new()),
            interactions: Arc::new(InMemoryInteractionRepo::new()),
        }
    }
}
