mod inmemory;
mod postgres;

pub use inmemory::InMemoryInteractionRepo;
use nudge_scheduler_domain::{NotificationInteraction, ID};
pub use postgres::PostgresInteractionRepo;

/// The history source the engagement analyzer reads from.
#[async_trait::async_trait]
pub trait IInteractionRepo: Send + Sync {
    async fn insert(&self, interaction: &NotificationInteraction) -> anyhow::Result<()>;
    async fn find_by_user(&self, user_id: &ID) -> Vec<NotificationInteraction>;
}
