use nudge_scheduler_domain::{RealTimeConditions, ID};
use std::sync::Mutex;

/// Supplies the transient conditions (weather, traffic, events) the
/// timing engine adapts deliveries to.
#[async_trait::async_trait]
pub trait IRealTimeContextService: Send + Sync {
    async fn current_conditions(&self, user_id: &ID) -> anyhow::Result<RealTimeConditions>;
}

/// Returns whatever conditions were last set; clear by default.
pub struct InMemoryRealTimeContextService {
    conditions: Mutex<RealTimeConditions>,
}

impl InMemoryRealTimeContextService {
    pub fn new() -> Self {
        Self {
            conditions: Mutex::new(RealTimeConditions::default()),
        }
    }

    pub fn set(&self, conditions: RealTimeConditions) {
        let mut current = self.conditions.lock().unwrap();
        *current = conditions;
    }
}

#[async_trait::async_trait]
impl IRealTimeContextService for InMemoryRealTimeContextService {
    async fn current_conditions(&self, _user_id: &ID) -> anyhow::Result<RealTimeConditions> {
        Ok(self.conditions.lock().unwrap().clone())
    }
}
