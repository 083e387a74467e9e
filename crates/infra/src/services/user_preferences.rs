use nudge_scheduler_domain::{UserNotificationSettings, ID};
use std::collections::HashMap;
use std::sync::Mutex;

/// Owner of `UserNotificationSettings`. The scheduling engine only
/// ever reads from it.
#[async_trait::async_trait]
pub trait IUserPreferencesService: Send + Sync {
    async fn get_settings(&self, user_id: &ID) -> anyhow::Result<UserNotificationSettings>;
}

/// Default store keyed by user. Unknown users fall back to the
/// default settings, so a user without saved preferences still gets
/// notifications.
pub struct InMemoryUserPreferencesService {
    settings: Mutex<HashMap<ID, UserNotificationSettings>>,
}

impl InMemoryUserPreferencesService {
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, settings: UserNotificationSettings) {
        let mut all = self.settings.lock().unwrap();
        all.insert(settings.user_id.clone(), settings);
    }
}

#[async_trait::async_trait]
impl IUserPreferencesService for InMemoryUserPreferencesService {
    async fn get_settings(&self, user_id: &ID) -> anyhow::Result<UserNotificationSettings> {
        let all = self.settings.lock().unwrap();
        Ok(all
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserNotificationSettings::new(user_id.clone())))
    }
}
