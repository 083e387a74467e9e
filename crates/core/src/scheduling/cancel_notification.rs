use crate::error::NudgeError;
use crate::shared::usecase::UseCase;
use nudge_scheduler_domain::{NotificationStatus, ID};
use nudge_scheduler_infra::NudgeContext;

/// Removes a pending notification from the delay queue and flips its
/// persisted status to Cancelled. A missing id is a non-error
/// outcome: the entry may simply have been delivered already.
#[derive(Debug)]
pub struct CancelNotificationUseCase {
    pub notification_id: ID,
}

#[derive(Debug, PartialEq)]
pub struct CancelNotificationResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    StorageError,
}

impl From<UseCaseError> for NudgeError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError => Self::Internal,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CancelNotificationUseCase {
    type Response = CancelNotificationResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelNotification";

    async fn execute(&mut self, ctx: &NudgeContext) -> Result<Self::Response, Self::Error> {
        let found = ctx.repos.delay_queue.cancel(&self.notification_id).await;
        if !found {
            return Ok(CancelNotificationResponse {
                success: false,
                message: format!(
                    "No pending notification with id: {}",
                    self.notification_id
                ),
            });
        }

        let now = ctx.sys.get_timestamp_millis();
        ctx.repos
            .notifications
            .update_status(&self.notification_id, NotificationStatus::Cancelled, now)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(CancelNotificationResponse {
            success: true,
            message: format!("Notification {} cancelled", self.notification_id),
        })
    }
}
