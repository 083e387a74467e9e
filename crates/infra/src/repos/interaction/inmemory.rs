use super::IInteractionRepo;
use nudge_scheduler_domain::{NotificationInteraction, ID};
use std::sync::Mutex;

pub struct InMemoryInteractionRepo {
    interactions: Mutex<Vec<NotificationInteraction>>,
}

impl InMemoryInteractionRepo {
    pub fn new() -> Self {
        Self {
            interactions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IInteractionRepo for InMemoryInteractionRepo {
    async fn insert(&self, interaction: &NotificationInteraction) -> anyhow::Result<()> {
        let mut interactions = self.interactions.lock().unwrap();
        interactions.push(interaction.clone());
        Ok(())
    }

    async fn find_by_user(&self, user_id: &ID) -> Vec<NotificationInteraction> {
        let interactions = self.interactions.lock().unwrap();
        interactions
            .iter()
            .filter(|i| i.user_id == *user_id)
            .cloned()
            .collect()
    }
}
