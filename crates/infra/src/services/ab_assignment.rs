use nudge_scheduler_domain::ID;
use std::collections::HashMap;
use std::sync::Mutex;

pub const CONTROL_GROUP: &str = "control";
pub const ML_GROUP: &str = "ml_personalized";

#[async_trait::async_trait]
pub trait IABAssignmentService: Send + Sync {
    async fn get_group(&self, user_id: &ID) -> String;
}

/// Deterministic 50/50 split derived from the user id, so a user
/// stays in the same group across calls without any stored state.
pub struct HashedABAssignmentService {}

#[async_trait::async_trait]
impl IABAssignmentService for HashedABAssignmentService {
    async fn get_group(&self, user_id: &ID) -> String {
        let sum: u32 = user_id
            .inner_ref()
            .as_bytes()
            .iter()
            .map(|b| u32::from(*b))
            .sum();
        if sum % 2 == 0 {
            CONTROL_GROUP.to_string()
        } else {
            ML_GROUP.to_string()
        }
    }
}

/// Fixed assignments for tests.
pub struct InMemoryABAssignmentService {
    assignments: Mutex<HashMap<ID, String>>,
    default_group: String,
}

impl InMemoryABAssignmentService {
    pub fn new(default_group: &str) -> Self {
        Self {
            assignments: Mutex::new(HashMap::new()),
            default_group: default_group.to_string(),
        }
    }

    pub fn assign(&self, user_id: ID, group: &str) {
        let mut assignments = self.assignments.lock().unwrap();
        assignments.insert(user_id, group.to_string());
    }
}

#[async_trait::async_trait]
impl IABAssignmentService for InMemoryABAssignmentService {
    async fn get_group(&self, user_id: &ID) -> String {
        let assignments = self.assignments.lock().unwrap();
        assignments
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| self.default_group.clone())
    }
}
