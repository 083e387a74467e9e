use nudge_scheduler_domain::{FeedbackEvent, ID};
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait::async_trait]
pub trait IFeedbackService: Send + Sync {
    async fn get_user_feedback(&self, user_id: &ID) -> Vec<FeedbackEvent>;
}

pub struct InMemoryFeedbackService {
    feedback: Mutex<HashMap<ID, Vec<FeedbackEvent>>>,
}

impl InMemoryFeedbackService {
    pub fn new() -> Self {
        Self {
            feedback: Mutex::new(HashMap::new()),
        }
    }

    pub fn add(&self, event: FeedbackEvent) {
        let mut feedback = self.feedback.lock().unwrap();
        feedback
            .entry(event.user_id.clone())
            .or_insert_with(Vec::new)
            .push(event);
    }
}

#[async_trait::async_trait]
impl IFeedbackService for InMemoryFeedbackService {
    async fn get_user_feedback(&self, user_id: &ID) -> Vec<FeedbackEvent> {
        let feedback = self.feedback.lock().unwrap();
        feedback.get(user_id).cloned().unwrap_or_else(Vec::new)
    }
}
